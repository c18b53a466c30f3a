//! Read-only view of a rendered document.
//!
//! The extraction pipeline only ever talks to a [`Dom`]; [`Document`] is the in-memory
//! implementation, filled either from raw HTML ([`html`]) or from a JSON snapshot that a
//! rendering host captured together with computed styles and layout boxes ([`snapshot`]).

use std::fmt;

use serde::{Deserialize, Serialize};

mod document;
pub mod html;
pub mod snapshot;

pub use document::{Document, DocumentBuilder};

/// The computed CSS properties the visibility check looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
        }
    }
}

/// Size of an element's rendered border box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

/// Minimal traversal surface over an element tree.
///
/// Only element nodes are exposed; text is reachable through [`Dom::inner_text`].
pub trait Dom {
    type Node: Copy + Eq + fmt::Debug;

    fn root(&self) -> Self::Node;
    fn body(&self) -> Option<Self::Node>;
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> &str;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
    /// Rendered text, whitespace collapsed the way a browser's `innerText` does.
    fn inner_text(&self, node: Self::Node) -> String;
    fn computed_style(&self, node: Self::Node) -> ComputedStyle;
    fn bounding_box(&self, node: Self::Node) -> Rect;

    /// Element descendants of `node` in document order, `node` itself excluded.
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack = self.children(node);
        stack.reverse();

        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }

        out
    }

    fn find_all(&self, node: Self::Node, tags: &[&str]) -> Vec<Self::Node> {
        self.descendants(node)
            .into_iter()
            .filter(|&candidate| tags.contains(&self.tag_name(candidate)))
            .collect()
    }

    /// Element siblings before `node`, nearest first.
    fn preceding_siblings(&self, node: Self::Node) -> Vec<Self::Node> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };

        let siblings = self.children(parent);
        let position = siblings
            .iter()
            .position(|&sibling| sibling == node)
            .unwrap_or(0);

        siblings[..position].iter().rev().copied().collect()
    }

    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        self.preceding_siblings(node).first().copied()
    }

    /// Nearest inclusive ancestor with the given tag.
    fn closest(&self, node: Self::Node, tag: &str) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.tag_name(candidate) == tag {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|value| value.split_ascii_whitespace().any(|token| token == class))
            .unwrap_or(false)
    }
}
