//! `@font-face` rule synthesis.
//!
//! [`synthesize`] is a pure function of the repository, the requested
//! family and variant, and a [`SynthesisContext`] carrying everything that
//! would otherwise come from the host (user agent, cache salt). Identical
//! inputs produce byte-identical rules.
//!
//! Clause order is fixed:
//!
//! ```text
//! @font-face { font-family: 'Family';
//! 	src: url('<eot>');                       (legacy, only with an EOT source)
//! 	src: local('Family'),                    (omitted for broken local())
//! 		url('<woff>') format('woff'),
//! 		url('<svg>#Family') format('svg'),
//! 		url('<ttf>') format('truetype');
//! 	font-weight: <weight>;                   (only when declared)
//! 	font-style: <style>;
//! }
//! ```

use std::fmt;
use std::fmt::Write as _;

use webfonts_core::{FontConfig, FontFormat, Repository};

/// Salt appended after the version token in every resource URL.
pub const DEFAULT_CACHE_SALT: &str = "20120101";

/// Variant requested when the caller does not name one.
pub const NORMAL_VARIANT: &str = "normal";

/// Host-dependent inputs to synthesis, passed explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthesisContext<'a> {
    /// User-agent descriptor of the environment the rule is generated for.
    pub user_agent: &'a str,
    /// Cache-busting salt for resource URLs.
    pub cache_salt: &'a str,
}

impl Default for SynthesisContext<'_> {
    fn default() -> Self {
        Self {
            user_agent: "",
            cache_salt: DEFAULT_CACHE_SALT,
        }
    }
}

impl SynthesisContext<'_> {
    /// Android 2.3 ignores the whole `src` descriptor when it contains `local()`.
    pub fn supports_local(&self) -> bool {
        !self.user_agent.contains("Android 2.3")
    }
}

/// A generated `@font-face` rule for one family.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleRule {
    family: String,
    css: String,
}

impl StyleRule {
    /// Family the rule declares (after variant redirection).
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn into_css(self) -> String {
        self.css
    }
}

impl fmt::Display for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}

/// Build the `@font-face` rule for `family` rendered as `variant`
/// (`normal` when `None`).
///
/// A variant declared in the family's config redirects to the target
/// family's configuration. Returns `None` when no configuration exists for
/// the (possibly redirected) family.
pub fn synthesize(
    repository: &Repository,
    family: &str,
    variant: Option<&str>,
    context: &SynthesisContext<'_>,
) -> Option<StyleRule> {
    let (family, config) = resolve_variant(repository, family, variant.unwrap_or(NORMAL_VARIANT))?;
    let css = render(repository.base(), family, config, context);
    Some(StyleRule {
        family: family.to_string(),
        css,
    })
}

fn resolve_variant<'r>(
    repository: &'r Repository,
    family: &'r str,
    variant: &str,
) -> Option<(&'r str, &'r FontConfig)> {
    let config = repository.get(family);
    if variant != NORMAL_VARIANT {
        if let Some(target) = config.and_then(|c| c.variant(variant)) {
            return repository.get(target).map(|c| (target, c));
        }
    }
    config.map(|c| (family, c))
}

fn render(base: &str, family: &str, config: &FontConfig, context: &SynthesisContext<'_>) -> String {
    let suffix = version_suffix(config.version.as_deref(), context.cache_salt);
    let name = escape(family);
    let mut css = String::with_capacity(256);

    // Writing into a String cannot fail.
    let _ = writeln!(css, "@font-face {{ font-family: '{name}';");

    if let Some(eot) = config.source(FontFormat::EmbeddedOpenType) {
        let _ = writeln!(css, "\tsrc: url('{}{suffix}');", resource_url(base, eot));
    }

    let mut sources: Vec<String> = Vec::new();
    if context.supports_local() {
        sources.push(format!("local('{name}')"));
    }
    for (format, path) in config.sources() {
        let fragment = if format == FontFormat::Svg {
            format!("#{name}")
        } else {
            String::new()
        };
        sources.push(format!(
            "url('{}{suffix}{fragment}') format('{}')",
            resource_url(base, path),
            format.css_name(),
        ));
    }
    if !sources.is_empty() {
        let _ = writeln!(css, "\tsrc: {};", sources.join(",\n\t\t"));
    }

    if let Some(weight) = &config.weight {
        let _ = writeln!(css, "\tfont-weight: {weight};");
    }
    let _ = writeln!(css, "\tfont-style: {};", config.style_or_default());
    css.push('}');
    css
}

fn version_suffix(version: Option<&str>, salt: &str) -> String {
    match version {
        Some(version) => format!("?version={version}&{salt}"),
        None => format!("?{salt}"),
    }
}

/// Join a repository-relative path onto the base. Absolute URLs are kept.
fn resource_url(base: &str, path: &str) -> String {
    if path.contains("://") || path.starts_with("data:") || base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn escape(family: &str) -> String {
    family.replace('\\', "\\\\").replace('\'', "\\'")
}
