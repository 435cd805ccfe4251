//! In-memory DOM: a builder for authoring pages and the arena the fake
//! browser renders them into.

use super::selector::{Compound, Query, Selector};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Windows narrower than this get the narrow layout
pub const NARROW_BREAKPOINT: u32 = 960;

/// Which layouts a node is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Every window size
    #[default]
    Any,
    /// Only windows at least [`NARROW_BREAKPOINT`] wide
    Wide,
    /// Only windows narrower than [`NARROW_BREAKPOINT`]
    Narrow,
}

impl Layout {
    const fn fits(self, width: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Wide => width >= NARROW_BREAKPOINT,
            Self::Narrow => width < NARROW_BREAKPOINT,
        }
    }
}

/// Element builder used by routes to describe a page
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
    hidden: bool,
    reveal_after: Option<Duration>,
    layout: Layout,
}

impl Node {
    /// Element with the given tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            hidden: false,
            reveal_after: None,
            layout: Layout::Any,
        }
    }

    /// `<a href>` with text
    #[must_use]
    pub fn link(href: &str, text: &str) -> Self {
        Self::new("a").attr("href", href).text(text)
    }

    /// `<button>` that runs a site action when clicked
    #[must_use]
    pub fn button(action: &str, text: &str) -> Self {
        Self::new("button").attr("type", "button").action(action).text(text)
    }

    /// `<input name>` of the given type
    #[must_use]
    pub fn input(kind: &str, name: &str) -> Self {
        Self::new("input").attr("type", kind).attr("name", name)
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Add one or more space separated classes
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let entry = self.attrs.entry("class".to_string()).or_default();
        for name in class.split_whitespace() {
            if !entry.split_whitespace().any(|c| c == name) {
                if !entry.is_empty() {
                    entry.push(' ');
                }
                entry.push_str(name);
            }
        }
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Run the named site action on click
    #[must_use]
    pub fn action(self, name: &str) -> Self {
        self.attr("data-action", name)
    }

    /// Set the element's own text
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Render without displaying
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Present immediately, displayed only after `delay`
    #[must_use]
    pub const fn reveal_after(mut self, delay: Duration) -> Self {
        self.reveal_after = Some(delay);
        self
    }

    /// Display only in wide windows
    #[must_use]
    pub const fn wide_only(mut self) -> Self {
        self.layout = Layout::Wide;
        self
    }

    /// Display only in narrow windows
    #[must_use]
    pub const fn narrow_only(mut self) -> Self {
        self.layout = Layout::Narrow;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DomNode {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) text: String,
    pub(crate) value: String,
    pub(crate) children: Vec<usize>,
    pub(crate) parent: Option<usize>,
    pub(crate) hidden: bool,
    pub(crate) reveal_at: Option<Instant>,
    pub(crate) layout: Layout,
}

impl DomNode {
    fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|n| n == class))
    }

    fn is_text_input(&self) -> bool {
        match self.tag.as_str() {
            "textarea" => true,
            "input" => !matches!(
                self.attrs.get("type").map(String::as_str),
                Some("button" | "submit" | "checkbox" | "radio" | "hidden")
            ),
            _ => false,
        }
    }
}

/// One render of a page, stored as an arena in document order.
/// Index 0 is always `<html>`.
#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub(crate) title: String,
    nodes: Vec<DomNode>,
}

impl Document {
    /// `<html><head><title/></head><body>content</body></html>`
    pub(crate) fn render(title: &str, content: Option<Node>, now: Instant) -> Self {
        let mut body = Node::new("body");
        if let Some(content) = content {
            body = body.child(content);
        }
        let html = Node::new("html")
            .child(Node::new("head").child(Node::new("title").text(title)))
            .child(body);

        let mut doc = Self {
            title: title.to_string(),
            nodes: Vec::new(),
        };
        doc.push(html, None, now);
        doc
    }

    /// Empty document for a fresh window
    pub(crate) fn blank(now: Instant) -> Self {
        Self::render("", None, now)
    }

    fn push(&mut self, node: Node, parent: Option<usize>, now: Instant) -> usize {
        let index = self.nodes.len();
        let value = node.attrs.get("value").cloned().unwrap_or_default();
        self.nodes.push(DomNode {
            tag: node.tag,
            attrs: node.attrs,
            text: node.text,
            value,
            children: Vec::new(),
            parent,
            hidden: node.hidden,
            reveal_at: node.reveal_after.map(|d| now + d),
            layout: node.layout,
        });
        for child in node.children {
            let child_index = self.push(child, Some(index), now);
            self.nodes[index].children.push(child_index);
        }
        index
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, index: usize) -> Option<&DomNode> {
        self.nodes.get(index)
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut DomNode> {
        self.nodes.get_mut(index)
    }

    /// Index of the element with this `id`
    pub(crate) fn by_id(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.attrs.get("id").is_some_and(|v| v == id))
    }

    fn is_descendant(&self, index: usize, ancestor: usize) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p].parent;
        }
        false
    }

    /// Matches of `query` among descendants of `scope` (or the whole
    /// document), in document order
    pub(crate) fn select(
        &self,
        scope: Option<usize>,
        query: &Query,
        width: u32,
        now: Instant,
    ) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| scope.map_or(true, |s| self.is_descendant(i, s)))
            .filter(|&i| match query {
                Query::Css(selectors) => selectors.iter().any(|s| self.matches(i, s)),
                Query::LinkText { text, partial } => {
                    self.nodes[i].tag == "a" && {
                        let visible = self.text(i, width, now);
                        if *partial {
                            visible.contains(text.as_str())
                        } else {
                            visible == *text
                        }
                    }
                }
            })
            .collect()
    }

    fn matches(&self, index: usize, selector: &Selector) -> bool {
        let Some(last) = selector.compounds.len().checked_sub(1) else {
            return false;
        };
        self.matches_compound(index, &selector.compounds[last])
            && self.matches_left(index, selector, last)
    }

    /// `index` matched compound `pos`; check the combinators to its left
    fn matches_left(&self, index: usize, selector: &Selector, pos: usize) -> bool {
        if pos == 0 {
            return true;
        }
        let target = &selector.compounds[pos - 1];
        if selector.child_combinators[pos - 1] {
            self.nodes[index].parent.is_some_and(|p| {
                self.matches_compound(p, target) && self.matches_left(p, selector, pos - 1)
            })
        } else {
            let mut current = self.nodes[index].parent;
            while let Some(p) = current {
                if self.matches_compound(p, target) && self.matches_left(p, selector, pos - 1) {
                    return true;
                }
                current = self.nodes[p].parent;
            }
            false
        }
    }

    fn matches_compound(&self, index: usize, compound: &Compound) -> bool {
        let node = &self.nodes[index];
        compound.tag.as_ref().map_or(true, |t| *t == node.tag)
            && compound
                .id
                .as_ref()
                .map_or(true, |id| node.attrs.get("id") == Some(id))
            && compound.classes.iter().all(|c| node.has_class(c))
            && compound.attrs.iter().all(|a| {
                let value = if a.name == "value" && node.is_text_input() {
                    Some(&node.value)
                } else {
                    node.attrs.get(&a.name)
                };
                value.is_some_and(|v| a.test(v))
            })
    }

    /// Whether a user would see the node
    pub(crate) fn is_displayed(&self, index: usize, width: u32, now: Instant) -> bool {
        let mut current = Some(index);
        while let Some(i) = current {
            let node = &self.nodes[i];
            let invisible_tag = matches!(node.tag.as_str(), "head" | "title" | "script" | "style");
            let hidden_input =
                node.tag == "input" && node.attrs.get("type").is_some_and(|t| t == "hidden");
            if node.hidden
                || invisible_tag
                || hidden_input
                || node.reveal_at.is_some_and(|at| now < at)
                || !node.layout.fits(width)
            {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Visible text of the node and its descendants, whitespace collapsed
    pub(crate) fn text(&self, index: usize, width: u32, now: Instant) -> String {
        if !self.is_displayed(index, width, now) {
            return String::new();
        }
        let mut pieces = Vec::new();
        self.collect_text(index, width, now, &mut pieces);
        pieces.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text<'a>(&'a self, index: usize, width: u32, now: Instant, out: &mut Vec<&'a str>) {
        let node = &self.nodes[index];
        out.push(&node.text);
        for &child in &node.children {
            if self.is_displayed(child, width, now) {
                self.collect_text(child, width, now, out);
            }
        }
    }

    /// Attribute value; `value` reflects what was typed into inputs
    pub(crate) fn attribute(&self, index: usize, name: &str) -> Option<String> {
        let node = &self.nodes[index];
        let name = name.to_ascii_lowercase();
        if name == "value" && node.is_text_input() {
            return Some(node.value.clone());
        }
        node.attrs.get(&name).cloned()
    }

    pub(crate) fn is_text_input(&self, index: usize) -> bool {
        self.nodes[index].is_text_input()
    }

    /// Current values of named inputs
    pub(crate) fn field(&self, name: &str) -> Option<String> {
        self.nodes
            .iter()
            .find(|n| n.is_text_input() && n.attrs.get("name").is_some_and(|v| v == name))
            .map(|n| n.value.clone())
    }

    /// Nearest node at or above `index` carrying `attr`
    pub(crate) fn closest_with(&self, index: usize, attr: &str) -> Option<usize> {
        let mut current = Some(index);
        while let Some(i) = current {
            if self.nodes[i].attrs.contains_key(attr) {
                return Some(i);
            }
            current = self.nodes[i].parent;
        }
        None
    }

    /// Serialize to HTML
    pub(crate) fn source(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        self.write_node(0, &mut out);
        out
    }

    fn write_node(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attrs {
            let _ = write!(out, " {name}=\"{}\"", escape(value));
        }
        if node.hidden {
            out.push_str(" hidden");
        }
        out.push('>');
        out.push_str(&escape(&node.text));
        for &child in &node.children {
            self.write_node(child, out);
        }
        if !matches!(node.tag.as_str(), "input" | "img" | "br" | "meta") {
            let _ = write!(out, "</{}>", node.tag);
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
