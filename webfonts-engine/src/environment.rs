//! Host capabilities the engine needs from a document environment.
//!
//! The engine never touches a live rendering tree directly. Everything it
//! reads (attributes, inline styles, the document language) and everything
//! it writes (style properties, `@font-face` rules) goes through
//! [`Environment`], so the same code drives a browser binding or the
//! in-memory [`MemoryDocument`](crate::dom::MemoryDocument).

use std::fmt::Debug;
use std::hash::Hash;

use crate::style;
use crate::synthesizer::StyleRule;

/// Attribute name carrying a node's language.
pub const LANG: &str = "lang";
/// Attribute name carrying a node's inline style.
pub const STYLE: &str = "style";
/// Style property written by the engine.
pub const FONT_FAMILY: &str = "font-family";

/// Predicate for [`Environment::query`]. A node matches a query slice if it
/// matches any one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeQuery<'a> {
    /// Node carries the named attribute (any value).
    HasAttribute(&'a str),
    /// Node has the given tag name (ASCII case-insensitive).
    Tag(&'a str),
}

/// Nodes that may carry a font-family or language override.
pub const OVERRIDE_CANDIDATES: [NodeQuery<'static>; 3] = [
    NodeQuery::HasAttribute(LANG),
    NodeQuery::HasAttribute(STYLE),
    NodeQuery::HasAttribute("class"),
];

/// User-editable controls that do not inherit `font-family` on their own.
pub const TEXT_INPUTS: [NodeQuery<'static>; 2] = [NodeQuery::Tag("textarea"), NodeQuery::Tag("input")];

/// A document host: attribute reads, style writes, and rule insertion.
///
/// Writes are fire-and-forget. An environment that cannot honour a write
/// (unknown node, detached subtree) drops it.
pub trait Environment {
    /// Handle to one element of the host tree.
    type Node: Clone + Eq + Hash + Debug;

    /// Insert a `@font-face` rule into the document's styles.
    fn insert_style(&mut self, rule: &StyleRule);

    /// Descendants of `root` (excluding `root`) matching any predicate,
    /// in document order.
    fn query(&self, root: &Self::Node, predicates: &[NodeQuery<'_>]) -> Vec<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn set_style_property(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_style_property(&mut self, node: &Self::Node, name: &str);

    /// Value of a style property declared on the node itself.
    ///
    /// The default reads the inline `style` attribute. Hosts that can see
    /// class-based styling may override this.
    fn style_property(&self, node: &Self::Node, name: &str) -> Option<String> {
        let inline = self.attribute(node, STYLE)?;
        style::declaration(&inline, name).map(str::to_owned)
    }

    /// Language declared for the whole document, if any.
    fn document_language(&self) -> Option<String> {
        None
    }

    /// User-agent descriptor of the host, used to tailor generated rules.
    fn user_agent(&self) -> String {
        String::new()
    }
}
