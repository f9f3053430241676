//! In-memory document tree implementing [`Environment`].
//!
//! Elements live in an arena keyed by `Uuid`; the tree starts with an
//! `html` root whose `lang` attribute is the document language. Inserted
//! `@font-face` rules are recorded in order so callers can inspect exactly
//! what the engine injected.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::environment::{Environment, NodeQuery, LANG, STYLE};
use crate::style;
use crate::synthesizer::StyleRule;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Element not found: {0}")]
    ElementNotFound(Uuid),
    #[error("Invalid tag name: {0:?}")]
    InvalidTag(String),
}

/// One element of a [`MemoryDocument`].
#[derive(Clone, Debug)]
pub struct Element {
    pub id: Uuid,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Uuid>,
    pub parent: Option<Uuid>,
}

impl Element {
    fn new(tag: &str, parent: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn matches(&self, predicates: &[NodeQuery<'_>]) -> bool {
        predicates.iter().any(|predicate| match predicate {
            NodeQuery::HasAttribute(name) => self.attributes.contains_key(*name),
            NodeQuery::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
        })
    }
}

/// Synthetic document used by tests, benches and the demo.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    elements: HashMap<Uuid, Element>,
    root: Uuid,
    user_agent: String,
    styles: Vec<StyleRule>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let root = Element::new("html", None);
        let root_id = root.id;
        let mut elements = HashMap::new();
        elements.insert(root_id, root);
        Self {
            elements,
            root: root_id,
            user_agent: String::new(),
            styles: Vec::new(),
        }
    }

    /// The `html` element.
    pub fn root(&self) -> Uuid {
        self.root
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the document language (the `lang` of the `html` element).
    pub fn set_document_language(&mut self, language: &str) {
        if let Some(root) = self.elements.get_mut(&self.root) {
            root.attributes.insert(LANG.to_string(), language.to_string());
        }
    }

    /// Append a new `tag` element as the last child of `parent`.
    pub fn create_element(&mut self, parent: Uuid, tag: &str) -> Result<Uuid, DocumentError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DocumentError::InvalidTag(tag.to_string()));
        }
        let element = Element::new(tag, Some(parent));
        let id = element.id;
        self.elements
            .get_mut(&parent)
            .ok_or(DocumentError::ElementNotFound(parent))?
            .children
            .push(id);
        self.elements.insert(id, element);
        Ok(id)
    }

    /// Append a child element with the given attributes.
    pub fn append(
        &mut self,
        parent: Uuid,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<Uuid, DocumentError> {
        let id = self.create_element(parent, tag)?;
        for (name, value) in attributes {
            self.set_attribute(id, name, value)?;
        }
        Ok(id)
    }

    pub fn set_attribute(&mut self, id: Uuid, name: &str, value: &str) -> Result<(), DocumentError> {
        self.elements
            .get_mut(&id)
            .ok_or(DocumentError::ElementNotFound(id))?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn element(&self, id: Uuid) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// The element's own `font-family`, if declared inline.
    pub fn font_family(&self, id: Uuid) -> Option<String> {
        self.style_property(&id, crate::environment::FONT_FAMILY)
    }

    /// Rules inserted so far, in insertion order.
    pub fn inserted_styles(&self) -> &[StyleRule] {
        &self.styles
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Pre-order walk of the descendants of `id`.
    fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut stack: Vec<Uuid> = match self.elements.get(&id) {
            Some(element) => element.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(element) = self.elements.get(&next) {
                out.push(next);
                stack.extend(element.children.iter().rev().copied());
            }
        }
        out
    }
}

impl Environment for MemoryDocument {
    type Node = Uuid;

    fn insert_style(&mut self, rule: &StyleRule) {
        self.styles.push(rule.clone());
    }

    fn query(&self, root: &Uuid, predicates: &[NodeQuery<'_>]) -> Vec<Uuid> {
        self.descendants(*root)
            .into_iter()
            .filter(|id| {
                self.elements
                    .get(id)
                    .is_some_and(|element| element.matches(predicates))
            })
            .collect()
    }

    fn attribute(&self, node: &Uuid, name: &str) -> Option<String> {
        self.elements.get(node)?.attribute(name).map(str::to_owned)
    }

    fn parent(&self, node: &Uuid) -> Option<Uuid> {
        self.elements.get(node)?.parent
    }

    fn set_style_property(&mut self, node: &Uuid, name: &str, value: &str) {
        let Some(element) = self.elements.get_mut(node) else {
            log::warn!("MemoryDocument: style write to unknown element {node}");
            return;
        };
        let current = element.attribute(STYLE).unwrap_or_default();
        let updated = style::set_declaration(current, name, value);
        element.attributes.insert(STYLE.to_string(), updated);
    }

    fn remove_style_property(&mut self, node: &Uuid, name: &str) {
        let Some(element) = self.elements.get_mut(node) else {
            return;
        };
        let Some(current) = element.attributes.get(STYLE) else {
            return;
        };
        let updated = style::remove_declaration(current, name);
        if updated.is_empty() {
            element.attributes.remove(STYLE);
        } else {
            element.attributes.insert(STYLE.to_string(), updated);
        }
    }

    fn document_language(&self) -> Option<String> {
        self.attribute(&self.root, LANG)
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }
}
