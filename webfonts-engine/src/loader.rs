//! Per-session load cache: each family's rule is inserted at most once.

use rustc_hash::FxHashSet;
use webfonts_core::Repository;

use crate::environment::Environment;
use crate::synthesizer::{synthesize, SynthesisContext};

/// Families whose `@font-face` rule has been handed to the environment
/// during one session. Only grows.
#[derive(Debug, Default)]
pub struct LoadCache {
    loaded: FxHashSet<String>,
    /// Insertion order, for reporting.
    order: Vec<String>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the rule for `family` unless this session already did.
    ///
    /// Returns `true` when a rule was inserted. A family the repository
    /// cannot synthesize is skipped and stays unmarked.
    pub fn ensure_loaded<E: Environment>(
        &mut self,
        env: &mut E,
        repository: &Repository,
        context: &SynthesisContext<'_>,
        family: &str,
    ) -> bool {
        if self.loaded.contains(family) {
            return false;
        }
        let Some(rule) = synthesize(repository, family, None, context) else {
            log::debug!("LoadCache: no configuration for '{family}', skipping");
            return false;
        };
        env.insert_style(&rule);
        self.loaded.insert(family.to_string());
        self.order.push(family.to_string());
        log::debug!("LoadCache: inserted @font-face for '{family}'");
        true
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.loaded.contains(family)
    }

    /// Loaded families in the order they were inserted.
    pub fn families(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_families(self) -> Vec<String> {
        self.order
    }
}
