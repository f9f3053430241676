//! Tree scanner: finds per-node font overrides below a root.
//!
//! Candidates are the descendants carrying `lang`, `style` or `class`,
//! visited once in document order. For each:
//!
//! 1. An explicit `font-family` in the node's own style wins. Its first
//!    family is loaded and the node's language is not considered.
//! 2. Otherwise a `lang` differing from the node's context language (the
//!    `lang` of its nearest ancestor that declares one, up to the root)
//!    resolves to the language's default family, which is applied to the
//!    node.
//!
//! Misses at either step leave the node untouched.

use crate::environment::{Environment, FONT_FAMILY, LANG, OVERRIDE_CANDIDATES};
use crate::style;

/// What the scanner asks of the session it runs for.
pub trait FontSink<E: Environment> {
    /// Default family for `language`, if the repository has one.
    fn default_font(&self, language: &str) -> Option<String>;

    /// Make `family` available without restyling anything.
    fn load(&mut self, env: &mut E, family: &str) -> bool;

    /// Load `family` and make it the node's font.
    fn apply_to(&mut self, env: &mut E, family: &str, node: &E::Node);
}

/// Outcome counts of one scan pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidate nodes visited.
    pub visited: usize,
    /// Nodes whose explicit font-family was honoured.
    pub overrides: usize,
    /// Nodes that received their language's default family.
    pub language_applied: usize,
    /// Nodes with a differing language and no family for it.
    pub misses: usize,
    /// Explicit font-family declarations that named no family.
    pub malformed: usize,
}

/// Scan the descendants of `root`. `context_language` is the language in
/// effect at `root` itself.
pub fn scan<E, S>(sink: &mut S, env: &mut E, root: &E::Node, context_language: Option<&str>) -> ScanReport
where
    E: Environment,
    S: FontSink<E>,
{
    let mut report = ScanReport::default();

    for node in env.query(root, &OVERRIDE_CANDIDATES) {
        report.visited += 1;

        if let Some(declared) = env.style_property(&node, FONT_FAMILY) {
            match style::primary_family(&declared) {
                Some(family) => {
                    sink.load(env, &family);
                    report.overrides += 1;
                    continue;
                }
                None => {
                    log::warn!("Scanner: empty font-family declaration on {node:?}");
                    report.malformed += 1;
                }
            }
        }

        let Some(language) = language_of(env, &node) else {
            continue;
        };
        let context = context_language_of(env, &node, root, context_language);
        if context.as_deref() == Some(language.as_str()) {
            continue;
        }

        match sink.default_font(&language) {
            Some(family) => {
                sink.apply_to(env, &family, &node);
                report.language_applied += 1;
            }
            None => {
                log::debug!("Scanner: no default font for language '{language}'");
                report.misses += 1;
            }
        }
    }

    log::debug!("Scanner: {report:?}");
    report
}

/// Non-empty `lang` attribute of a node.
fn language_of<E: Environment>(env: &E, node: &E::Node) -> Option<String> {
    env.attribute(node, LANG).filter(|lang| !lang.is_empty())
}

fn context_language_of<E: Environment>(
    env: &E,
    node: &E::Node,
    root: &E::Node,
    root_language: Option<&str>,
) -> Option<String> {
    let mut current = env.parent(node);
    while let Some(ancestor) = current {
        if &ancestor == root {
            break;
        }
        if let Some(language) = language_of(env, &ancestor) {
            return Some(language);
        }
        current = env.parent(&ancestor);
    }
    root_language.map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Records what the scanner asked for.
    #[derive(Default)]
    struct Recorder {
        defaults: HashMap<String, String>,
        loaded: Vec<String>,
        applied: Vec<(String, Uuid)>,
    }

    impl Recorder {
        fn with_default(mut self, language: &str, family: &str) -> Self {
            self.defaults.insert(language.into(), family.into());
            self
        }
    }

    impl FontSink<MemoryDocument> for Recorder {
        fn default_font(&self, language: &str) -> Option<String> {
            self.defaults.get(language).cloned()
        }

        fn load(&mut self, _env: &mut MemoryDocument, family: &str) -> bool {
            self.loaded.push(family.to_string());
            true
        }

        fn apply_to(&mut self, _env: &mut MemoryDocument, family: &str, node: &Uuid) {
            self.applied.push((family.to_string(), *node));
        }
    }

    #[test]
    fn test_font_family_overrides_language() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(
            root,
            "p",
            &[("lang", "fr"), ("style", "font-family: \"Custom Sans\", sans-serif")],
        )
        .unwrap();
        let mut sink = Recorder::default().with_default("fr", "Gentium");

        let report = scan(&mut sink, &mut doc, &root, Some("en"));
        assert_eq!(sink.loaded, vec!["Custom Sans"]);
        assert!(sink.applied.is_empty());
        assert_eq!(report.overrides, 1);
        assert_eq!(report.language_applied, 0);
    }

    #[test]
    fn test_quoted_family_keeps_semicolon() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(root, "p", &[("style", "font-family: 'Taamey;Bold', serif; color: red")])
            .unwrap();
        let mut sink = Recorder::default();

        scan(&mut sink, &mut doc, &root, Some("he"));
        assert_eq!(sink.loaded, vec!["Taamey;Bold"]);
    }

    #[test]
    fn test_malformed_override_falls_through() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let p = doc
            .append(root, "p", &[("lang", "fr"), ("style", "font-family: '' , serif")])
            .unwrap();
        let mut sink = Recorder::default().with_default("fr", "Gentium");

        let report = scan(&mut sink, &mut doc, &root, Some("en"));
        assert!(sink.loaded.is_empty());
        assert_eq!(sink.applied, vec![("Gentium".to_string(), p)]);
        assert_eq!(report.malformed, 1);
    }

    #[test]
    fn test_same_language_as_root_is_skipped() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(root, "p", &[("lang", "he")]).unwrap();
        let mut sink = Recorder::default().with_default("he", "Taamey");

        let report = scan(&mut sink, &mut doc, &root, Some("he"));
        assert!(sink.applied.is_empty());
        assert_eq!(report.visited, 1);
    }

    #[test]
    fn test_context_is_nearest_ancestor_language() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let div = doc.append(root, "div", &[("lang", "am")]).unwrap();
        // Same as its parent: nothing to do.
        doc.append(div, "span", &[("lang", "am")]).unwrap();
        // Back to the root language inside an `am` region: needs its font.
        let back = doc.append(div, "span", &[("lang", "he")]).unwrap();
        let mut sink = Recorder::default()
            .with_default("he", "Taamey")
            .with_default("am", "AbyssinicaSIL");

        scan(&mut sink, &mut doc, &root, Some("he"));
        assert_eq!(
            sink.applied,
            vec![("AbyssinicaSIL".to_string(), div), ("Taamey".to_string(), back)]
        );
    }

    #[test]
    fn test_unknown_language_is_a_miss() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(root, "p", &[("lang", "en")]).unwrap();
        let mut sink = Recorder::default().with_default("he", "Taamey");

        let report = scan(&mut sink, &mut doc, &root, Some("he"));
        assert!(sink.applied.is_empty());
        assert_eq!(report.misses, 1);
    }

    #[test]
    fn test_no_context_language() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let p = doc.append(root, "p", &[("lang", "he")]).unwrap();
        let mut sink = Recorder::default().with_default("he", "Taamey");

        scan(&mut sink, &mut doc, &root, None);
        assert_eq!(sink.applied, vec![("Taamey".to_string(), p)]);
    }

    #[test]
    fn test_empty_lang_is_ignored() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(root, "p", &[("lang", "")]).unwrap();
        let mut sink = Recorder::default().with_default("", "Nothing");

        let report = scan(&mut sink, &mut doc, &root, Some("he"));
        assert!(sink.applied.is_empty());
        assert_eq!(report.misses, 0);
    }

    #[test]
    fn test_class_only_nodes_are_visited() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        doc.append(root, "p", &[("class", "lead")]).unwrap();
        let mut sink = Recorder::default();

        let report = scan(&mut sink, &mut doc, &root, Some("he"));
        assert_eq!(report, ScanReport { visited: 1, ..ScanReport::default() });
    }
}
