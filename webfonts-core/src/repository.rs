//! Font repository — language → families, family → loadable configuration.
//!
//! The repository is plain data: it is built once (from JSON or with the
//! builder methods), optionally overlaid with caller entries through
//! [`merge`], and then shared read-only between sessions.
//!
//! ```text
//! Repository
//!   ├── base: "fonts"                            (prefix for relative paths)
//!   ├── languages: { "he": ["Taamey", ...] }     (first entry = default)
//!   └── fonts: { "Taamey": FontConfig { woff, ttf, version, ... } }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base path used when a repository does not declare one.
pub const DEFAULT_BASE: &str = "fonts";

/// Repository compiled into the crate, used as the default layer for merges.
const BUNDLED_REPOSITORY: &str = include_str!("../data/repository.json");

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to read repository {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid repository JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Font formats ────────────────────────────────────────────────────

/// Encoded font formats a repository entry may provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontFormat {
    EmbeddedOpenType,
    Woff,
    Svg,
    TrueType,
}

impl FontFormat {
    /// Order of the remote references in the main `src` descriptor.
    /// EOT is not listed: it is emitted as a standalone legacy `src`.
    pub const PRIORITY: [FontFormat; 3] = [FontFormat::Woff, FontFormat::Svg, FontFormat::TrueType];

    /// Value used inside `format(...)`.
    pub fn css_name(self) -> &'static str {
        match self {
            FontFormat::EmbeddedOpenType => "embedded-opentype",
            FontFormat::Woff => "woff",
            FontFormat::Svg => "svg",
            FontFormat::TrueType => "truetype",
        }
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

// ── Font configuration ──────────────────────────────────────────────

/// Loadable configuration for one family.
///
/// The family name itself is the key under which the config is stored in
/// [`Repository`]. Resource paths are relative to the repository base
/// unless they are absolute URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttf: Option<String>,
    /// Opaque version token, used for cache busting.
    #[serde(default, deserialize_with = "token", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// CSS weight keyword or number (`bold`, `700`).
    #[serde(
        default,
        rename = "fontweight",
        alias = "weight",
        deserialize_with = "token",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<String>,
    /// CSS style keyword; `normal` when absent.
    #[serde(
        default,
        rename = "fontstyle",
        alias = "style",
        skip_serializing_if = "Option::is_none"
    )]
    pub style: Option<String>,
    /// Variant name → family whose configuration renders that variant.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, String>,
}

impl FontConfig {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, format: FontFormat, path: impl Into<String>) -> Self {
        let path = Some(path.into());
        match format {
            FontFormat::EmbeddedOpenType => self.eot = path,
            FontFormat::Woff => self.woff = path,
            FontFormat::Svg => self.svg = path,
            FontFormat::TrueType => self.ttf = path,
        }
        self
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>, family: impl Into<String>) -> Self {
        self.variants.insert(variant.into(), family.into());
        self
    }

    /// Resource path for a single format.
    pub fn source(&self, format: FontFormat) -> Option<&str> {
        match format {
            FontFormat::EmbeddedOpenType => self.eot.as_deref(),
            FontFormat::Woff => self.woff.as_deref(),
            FontFormat::Svg => self.svg.as_deref(),
            FontFormat::TrueType => self.ttf.as_deref(),
        }
    }

    /// Present formats of the main `src` list, in [`FontFormat::PRIORITY`] order.
    pub fn sources(&self) -> impl Iterator<Item = (FontFormat, &str)> + '_ {
        FontFormat::PRIORITY
            .iter()
            .filter_map(move |&format| self.source(format).map(|path| (format, path)))
    }

    /// Declared style, or `normal`.
    pub fn style_or_default(&self) -> &str {
        self.style.as_deref().unwrap_or("normal")
    }

    /// Family that renders `variant`, if this config redirects it.
    pub fn variant(&self, variant: &str) -> Option<&str> {
        self.variants.get(variant).map(String::as_str)
    }
}

/// Accepts either a JSON string or a JSON number for opaque tokens
/// such as `"version": 1.1` or `"fontweight": 700`.
fn token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

// ── Repository ──────────────────────────────────────────────────────

/// Read-only font dataset consumed by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, alias = "basePath", skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    #[serde(default, alias = "languageToFamilies")]
    languages: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    fonts: BTreeMap<String, FontConfig>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The repository shipped with this crate.
    pub fn bundled() -> Self {
        match Self::from_json_str(BUNDLED_REPOSITORY) {
            Ok(repository) => repository,
            Err(e) => {
                log::error!("Bundled font repository is invalid: {e}");
                Self::default()
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RepositoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a repository description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let repository = Self::from_json_str(&json)?;
        log::info!(
            "Repository: loaded {} languages, {} fonts from {}",
            repository.languages.len(),
            repository.fonts.len(),
            path.display(),
        );
        Ok(repository)
    }

    pub fn to_json_string(&self) -> Result<String, RepositoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_language<I, S>(mut self, language: impl Into<String>, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages
            .insert(language.into(), families.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, config: FontConfig) -> Self {
        self.fonts.insert(family.into(), config);
        self
    }

    /// Prefix for relative resource paths.
    pub fn base(&self) -> &str {
        self.base.as_deref().unwrap_or(DEFAULT_BASE)
    }

    /// First family listed for `language`.
    pub fn default_font(&self, language: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|families| families.first())
            .map(String::as_str)
    }

    /// All families listed for `language`, in preference order.
    pub fn families_for(&self, language: &str) -> &[String] {
        self.languages
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, family: &str) -> Option<&FontConfig> {
        self.fonts.get(family)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    /// Languages with at least one family mapping (sorted).
    pub fn languages(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    /// Every family with a configuration (sorted).
    pub fn families(&self) -> Vec<&str> {
        self.fonts.keys().map(String::as_str).collect()
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Overlay `overrides` on top of `self`. See [`merge`].
    pub fn merge(&self, overrides: &Repository) -> Repository {
        merge(self, overrides)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository({}, {} languages, {} fonts)",
            self.base(),
            self.languages.len(),
            self.fonts.len(),
        )
    }
}

/// Overlay caller entries onto defaults.
///
/// Language and font entries are merged key by key; on collision the
/// override wins. The override's base replaces the default base only when
/// it declares one.
pub fn merge(defaults: &Repository, overrides: &Repository) -> Repository {
    let mut merged = defaults.clone();
    if overrides.base.is_some() {
        merged.base = overrides.base.clone();
    }
    merged.languages.extend(
        overrides
            .languages
            .iter()
            .map(|(language, families)| (language.clone(), families.clone())),
    );
    merged.fonts.extend(
        overrides
            .fonts
            .iter()
            .map(|(family, config)| (family.clone(), config.clone())),
    );
    merged
}
