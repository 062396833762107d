//! Flat, document-ordered view of a rendered page.
//!
//! Every rendering backend reduces the live page to a [`RenderedDom`]: a
//! preorder list of element nodes with parent/child links, visible text,
//! bounding boxes and the subset of computed style the sampler reads. The
//! sampler never talks to a browser directly, which keeps it deterministic
//! and testable with hand-built documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Axis-aligned box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Computed style values keyed by CSS property name.
///
/// Backed by a `BTreeMap` so serialization order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<String, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `property`, or `""` when it was not captured.
    pub fn get(&self, property: &str) -> &str {
        self.0.get(property).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.0.insert(property.to_string(), value.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this style restricted to `properties`, skipping empty values.
    pub fn pick(&self, properties: &[&str]) -> ComputedStyle {
        let mut out = ComputedStyle::new();
        for p in properties {
            let v = self.get(p);
            if !v.is_empty() {
                out.set(p, v);
            }
        }
        out
    }
}

/// One element of the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    /// Lowercase tag name
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Selected attributes (`role`, `href`, `alt`, `type`, `src`, `value`, `aria-label`)
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Trimmed visible text of the element and its descendants
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub rect: BoundingBox,
    #[serde(default)]
    pub style: ComputedStyle,
}

impl DomNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(|c| c.to_string()));
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.trim().to_string();
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.set(property, value);
        self
    }

    pub fn with_rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = BoundingBox { x, y, width, height };
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }

    pub fn has_class_containing(&self, needle: &str) -> bool {
        self.classes
            .iter()
            .any(|c| c.to_ascii_lowercase().contains(needle))
    }

    /// Space-joined class list, as it would appear in the `class` attribute.
    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }
}

/// A rendered page reduced to a preorder list of elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDom {
    pub title: String,
    pub url: String,
    pub nodes: Vec<DomNode>,
}

impl RenderedDom {
    pub fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            nodes: Vec::new(),
        }
    }

    /// Parse the JSON produced by the in-page capture script.
    pub fn from_json(json: &str) -> Result<Self> {
        let dom: RenderedDom = serde_json::from_str(json)
            .map_err(|e| Error::ExtractionError(format!("Malformed capture payload: {}", e)))?;
        dom.validate()?;
        Ok(dom)
    }

    /// Append `node` under `parent` and return its index.
    ///
    /// Nodes must be pushed in document (preorder) order.
    pub fn push(&mut self, parent: Option<usize>, mut node: DomNode) -> usize {
        let idx = self.nodes.len();
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        if let Some(p) = parent {
            if let Some(parent_node) = self.nodes.get_mut(p) {
                parent_node.children.push(idx);
            }
        }
        idx
    }

    /// Check that every parent/child link points inside the node list and
    /// that parents precede their children.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(p) = node.parent {
                if p >= idx {
                    return Err(Error::ExtractionError(format!(
                        "Node {} has parent {} that does not precede it",
                        idx, p
                    )));
                }
            }
            if let Some(c) = node.children.iter().find(|c| **c >= len || **c <= idx) {
                return Err(Error::ExtractionError(format!(
                    "Node {} has out-of-order child {}",
                    idx, c
                )));
            }
        }
        Ok(())
    }

    pub fn node(&self, idx: usize) -> Option<&DomNode> {
        self.nodes.get(idx)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their indices, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DomNode)> {
        self.nodes.iter().enumerate()
    }

    /// Indices of nodes matching `pred`, in document order.
    pub fn select<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.iter().filter(|(_, n)| pred(n)).map(|(i, _)| i).collect()
    }

    /// First node with the given tag.
    pub fn first_by_tag(&self, tag: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.tag == tag)
    }

    /// Descendants of `root` (excluding `root`) in document order.
    pub fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = match self.nodes.get(root) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(idx) = stack.pop() {
            out.push(idx);
            if let Some(n) = self.nodes.get(idx) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Descendants of `root` matching `pred`, in document order.
    pub fn select_within<F>(&self, root: usize, pred: F) -> Vec<usize>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.descendants(root)
            .into_iter()
            .filter(|i| self.nodes.get(*i).map(&pred).unwrap_or(false))
            .collect()
    }

    /// Whether `idx` sits anywhere below `ancestor`.
    pub fn is_descendant_of(&self, idx: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes.get(idx).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes.get(p).and_then(|n| n.parent);
        }
        false
    }

    /// Whether any strict ancestor of `idx` satisfies `pred`.
    pub fn has_ancestor<F>(&self, idx: usize, pred: F) -> bool
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut cur = self.nodes.get(idx).and_then(|n| n.parent);
        while let Some(p) = cur {
            match self.nodes.get(p) {
                Some(n) if pred(n) => return true,
                Some(n) => cur = n.parent,
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dom() -> RenderedDom {
        let mut dom = RenderedDom::new("T", "https://example.com");
        let html = dom.push(None, DomNode::new("html"));
        let body = dom.push(Some(html), DomNode::new("body"));
        let nav = dom.push(Some(body), DomNode::new("nav"));
        dom.push(Some(nav), DomNode::new("a").with_text("Home"));
        dom.push(Some(nav), DomNode::new("a").with_text("About"));
        dom.push(Some(body), DomNode::new("main"));
        dom
    }

    #[test]
    fn descendants_follow_document_order() {
        let dom = sample_dom();
        assert_eq!(dom.descendants(1), vec![2, 3, 4, 5]);
        assert_eq!(dom.descendants(2), vec![3, 4]);
        assert!(dom.descendants(5).is_empty());
    }

    #[test]
    fn ancestry_queries() {
        let dom = sample_dom();
        assert!(dom.is_descendant_of(4, 2));
        assert!(!dom.is_descendant_of(5, 2));
        assert!(dom.has_ancestor(3, |n| n.is("nav")));
        assert!(!dom.has_ancestor(2, |n| n.is("nav")));
    }

    #[test]
    fn json_round_trip_validates_links() {
        let dom = sample_dom();
        let json = serde_json::to_string(&dom).unwrap();
        let back = RenderedDom::from_json(&json).unwrap();
        assert_eq!(back, dom);

        let broken = r#"{"title":"","url":"","nodes":[{"tag":"html","parent":3}]}"#;
        assert!(matches!(
            RenderedDom::from_json(broken),
            Err(Error::ExtractionError(_))
        ));
    }

    #[test]
    fn style_pick_skips_missing() {
        let style = DomNode::new("div")
            .with_style("color", "rgb(0, 0, 0)")
            .with_style("display", "flex")
            .style;
        let picked = style.pick(&["color", "gap"]);
        assert_eq!(picked.get("color"), "rgb(0, 0, 0)");
        assert_eq!(picked.get("gap"), "");
        assert_eq!(picked.iter().count(), 1);
    }
}
