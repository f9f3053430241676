//! Font application session for one root element.
//!
//! [`WebFonts::attach`] creates the session: it merges the caller's
//! repository over the defaults, remembers the root's original
//! `font-family`, applies the default family of the context language and
//! scans the subtree. The returned value is the session handle; every later
//! call threads the environment through explicitly, and [`WebFonts::detach`]
//! consumes it.
//!
//! No operation here fails. Unknown languages, unknown families and
//! malformed declarations leave the previous styling in place.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use webfonts_core::{merge, Repository};

use crate::environment::{Environment, FONT_FAMILY, LANG, TEXT_INPUTS};
use crate::loader::LoadCache;
use crate::scanner::{self, FontSink, ScanReport};
use crate::style;
use crate::synthesizer::{synthesize, StyleRule, SynthesisContext, DEFAULT_CACHE_SALT};

/// Session configuration.
#[derive(Clone, Debug)]
pub struct WebFontsOptions {
    /// Entries layered over `defaults`; caller entries win.
    pub repository: Repository,
    /// Base repository. The bundled repository when `None`.
    pub defaults: Option<Arc<Repository>>,
    /// Fallback families written after the applied family.
    pub font_stack: Vec<String>,
    /// Cache-busting salt for generated resource URLs.
    pub cache_salt: String,
}

impl Default for WebFontsOptions {
    fn default() -> Self {
        Self {
            repository: Repository::new(),
            defaults: None,
            font_stack: vec!["Helvetica".into(), "Arial".into(), "sans-serif".into()],
            cache_salt: DEFAULT_CACHE_SALT.to_string(),
        }
    }
}

impl WebFontsOptions {
    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repository = repository;
        self
    }

    /// Use `defaults` instead of the bundled repository as the base layer.
    pub fn with_defaults(mut self, defaults: Arc<Repository>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_font_stack<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.font_stack = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_salt(mut self, salt: impl Into<String>) -> Self {
        self.cache_salt = salt.into();
        self
    }

    /// Effective repository: `repository` merged over `defaults`. Shares the
    /// defaults without copying when there is nothing to merge.
    fn resolve_repository(&self) -> Arc<Repository> {
        let defaults = self
            .defaults
            .clone()
            .unwrap_or_else(|| Arc::new(Repository::bundled()));
        if self.repository == Repository::default() {
            defaults
        } else {
            Arc::new(merge(&defaults, &self.repository))
        }
    }
}

/// Bookkeeping for one attached root element.
#[derive(Debug)]
pub struct WebFonts<E: Environment> {
    root: E::Node,
    repository: Arc<Repository>,
    loaded: LoadCache,
    font_stack: Vec<String>,
    /// Stack configured at attach time, restored by `reset`.
    base_stack: Vec<String>,
    /// Root `font-family` before the session touched it.
    original_family: Option<String>,
    /// `font-family` of every node the session has written to, as it was
    /// before the first write.
    baseline: FxHashMap<E::Node, Option<String>>,
    language: Option<String>,
    user_agent: String,
    cache_salt: String,
}

impl<E: Environment> WebFonts<E> {
    /// Attach to `root`: apply the context language's default family, then
    /// scan the subtree for overrides.
    pub fn attach(env: &mut E, root: E::Node, options: WebFontsOptions) -> Self {
        let repository = options.resolve_repository();
        let original_family = env.style_property(&root, FONT_FAMILY);
        let language = env
            .attribute(&root, LANG)
            .filter(|lang| !lang.is_empty())
            .or_else(|| env.document_language().filter(|lang| !lang.is_empty()));

        let mut session = Self {
            root,
            repository,
            loaded: LoadCache::new(),
            font_stack: options.font_stack.clone(),
            base_stack: options.font_stack,
            original_family,
            baseline: FxHashMap::default(),
            language,
            user_agent: env.user_agent(),
            cache_salt: options.cache_salt,
        };

        match session.language.clone() {
            Some(language) => match session.repository.default_font(&language) {
                Some(family) => {
                    let family = family.to_string();
                    log::info!("WebFonts: '{language}' resolves to '{family}'");
                    session.apply(env, &family, None);
                }
                None => log::debug!("WebFonts: no default font for '{language}'"),
            },
            None => log::debug!("WebFonts: no context language, skipping default font"),
        }

        session.scan(env);
        session
    }

    /// Re-run the subtree scan. Safe to repeat after the tree changed.
    pub fn scan(&mut self, env: &mut E) -> ScanReport {
        let root = self.root.clone();
        let language = self.language.clone();
        scanner::scan(self, env, &root, language.as_deref())
    }

    /// Put `family` at the front of the font stack, load it, and write the
    /// stack to `target` (the root when `None`) and its text inputs.
    pub fn apply(&mut self, env: &mut E, family: &str, target: Option<&E::Node>) {
        let family = family.trim();
        if family.is_empty() {
            return;
        }
        self.load(env, family);

        self.font_stack.retain(|f| f != family);
        self.font_stack.insert(0, family.to_string());

        let value = style::family_list(&self.font_stack);
        let target = target.cloned().unwrap_or_else(|| self.root.clone());
        for node in with_text_inputs(env, &target) {
            self.baseline
                .entry(node.clone())
                .or_insert_with(|| env.style_property(&node, FONT_FAMILY));
            env.set_style_property(&node, FONT_FAMILY, &value);
        }
    }

    /// Restore the configured stack and the pre-attach `font-family` of the
    /// root and its text inputs. Nodes the session never wrote are left
    /// alone. Loaded families stay loaded.
    pub fn reset(&mut self, env: &mut E) {
        self.font_stack = self.base_stack.clone();
        let root = self.root.clone();
        for node in with_text_inputs(env, &root) {
            match self.baseline.get(&node) {
                Some(Some(family)) => env.set_style_property(&node, FONT_FAMILY, family),
                Some(None) => env.remove_style_property(&node, FONT_FAMILY),
                None => {}
            }
        }
    }

    /// Families for `language` (if given) followed by every family in the
    /// repository.
    pub fn list(&self, language: Option<&str>) -> Vec<String> {
        let mut families: Vec<String> = language
            .map(|language| self.repository.families_for(language).to_vec())
            .unwrap_or_default();
        families.extend(self.repository.families().into_iter().map(str::to_owned));
        families
    }

    /// Languages the repository maps to fonts.
    pub fn languages(&self) -> Vec<String> {
        self.repository
            .languages()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Layer more entries over the session repository.
    pub fn set_repository(&mut self, overrides: &Repository) {
        self.repository = Arc::new(merge(&self.repository, overrides));
    }

    /// The rule this session would insert for `family` rendered as `variant`.
    pub fn style_rule(&self, family: &str, variant: Option<&str>) -> Option<StyleRule> {
        synthesize(&self.repository, family, variant, &self.synthesis_context())
    }

    /// End the session. Inserted rules stay in the environment; the loaded
    /// families are returned.
    pub fn detach(self) -> Vec<String> {
        log::info!(
            "WebFonts: detached from {:?} after loading {} families",
            self.root,
            self.loaded.len()
        );
        self.loaded.into_families()
    }

    pub fn root(&self) -> &E::Node {
        &self.root
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    /// Context language found at attach time.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn font_stack(&self) -> &[String] {
        &self.font_stack
    }

    pub fn original_family(&self) -> Option<&str> {
        self.original_family.as_deref()
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.loaded.is_loaded(family)
    }

    pub fn loaded_families(&self) -> &[String] {
        self.loaded.families()
    }

    fn synthesis_context(&self) -> SynthesisContext<'_> {
        SynthesisContext {
            user_agent: &self.user_agent,
            cache_salt: &self.cache_salt,
        }
    }
}

impl<E: Environment> FontSink<E> for WebFonts<E> {
    fn default_font(&self, language: &str) -> Option<String> {
        self.repository.default_font(language).map(str::to_owned)
    }

    fn load(&mut self, env: &mut E, family: &str) -> bool {
        let context = SynthesisContext {
            user_agent: &self.user_agent,
            cache_salt: &self.cache_salt,
        };
        self.loaded
            .ensure_loaded(env, &self.repository, &context, family)
    }

    fn apply_to(&mut self, env: &mut E, family: &str, node: &E::Node) {
        self.apply(env, family, Some(node));
    }
}

/// `target` followed by its `textarea` and `input` descendants.
fn with_text_inputs<E: Environment>(env: &E, target: &E::Node) -> Vec<E::Node> {
    let mut nodes = vec![target.clone()];
    nodes.extend(env.query(target, &TEXT_INPUTS));
    nodes
}
