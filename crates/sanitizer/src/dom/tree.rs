// ABOUTME: Index-addressed arena holding one parsed description fragment.
// ABOUTME: Imports scraper's parse tree, supports unwrap/detach/insert rewiring, serializes and minifies.

//! Arena document model.
//!
//! Every node lives in a `Vec` and is addressed by its index. A node stores
//! its parent index and its ordered child indices, so unwrapping, detaching
//! and moving nodes is plain index rewiring. Detached nodes stay in the arena
//! but are unreachable from [`ROOT`], and every traversal starts from the root.

use std::collections::HashMap;

use scraper::{ElementRef, Html};

use super::tags;

pub type NodeId = usize;

/// The implicit fragment root.
pub const ROOT: NodeId = 0;

/// Opaque subtrees found in scraper's tree, mapped to their category.
pub type OpaqueMatches<'a> = HashMap<ego_tree::NodeId, &'a str>;

/// Arena invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    Missing(NodeId),
    #[error("node {0} has no parent")]
    Orphan(NodeId),
    #[error("cannot move node {node} below its own descendant {target}")]
    Cycle { node: NodeId, target: NodeId },
    #[error("nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),
    #[error("the fragment root cannot be {0}")]
    Root(&'static str),
}

/// An element: lowercase tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attrs.retain(|(k, _)| keep(k));
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Appends a class token; returns false when it was already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let joined = self
            .classes()
            .chain(std::iter::once(class))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("class", joined);
        true
    }
}

/// A closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    Element(Element),
    Text(String),
    /// Marker standing in for a preserved block, by index.
    Preserved(usize),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Markup set aside before cleaning and restored on output.
///
/// `html` is html5ever's serialization of the matched subtree, not the input
/// bytes: attribute quoting is normalized, boolean attributes gain `=""` and
/// tables gain an implied `tbody`. Text and structure are otherwise untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedBlock {
    pub category: String,
    pub index: usize,
    /// Tag name of the block's root element.
    pub tag: String,
    pub html: String,
}

impl PreservedBlock {
    /// Whether the block may sit inside a paragraph without a parser closing it.
    pub fn is_phrasing(&self) -> bool {
        tags::is_phrasing(&self.tag)
    }

    /// Textual token naming this block in diagnostics.
    pub fn placeholder(&self) -> String {
        format!("___{}_PLACEHOLDER_{}___", self.category, self.index)
    }
}

/// Serialized output split at preserved-block boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Markup(String),
    Block(usize),
}

#[derive(Debug, Default)]
struct Writer {
    pieces: Vec<Piece>,
}

impl Writer {
    fn push_str(&mut self, s: &str) {
        if let Some(Piece::Markup(last)) = self.pieces.last_mut() {
            last.push_str(s);
        } else {
            self.pieces.push(Piece::Markup(s.to_string()));
        }
    }

    fn push_block(&mut self, index: usize) {
        self.pieces.push(Piece::Block(index));
    }
}

/// One parsed description.
#[derive(Debug, Clone)]
pub struct Fragment {
    nodes: Vec<Node>,
    preserved: Vec<PreservedBlock>,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl Fragment {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            preserved: Vec::new(),
        }
    }

    /// Builds a fragment from scraper's parse tree, swapping opaque matches for markers.
    pub fn from_html(
        doc: &Html,
        opaque: &OpaqueMatches<'_>,
        max_depth: usize,
    ) -> Result<Self, TreeError> {
        let mut fragment = Self::new();
        fragment.import_children(ROOT, *doc.root_element(), opaque, 0, max_depth)?;
        Ok(fragment)
    }

    /// Parses a markup string without opaque matching.
    pub fn parse(html: &str, max_depth: usize) -> Result<Self, TreeError> {
        let doc = Html::parse_fragment(html);
        Self::from_html(&doc, &OpaqueMatches::new(), max_depth)
    }

    fn import_children(
        &mut self,
        parent: NodeId,
        source: ego_tree::NodeRef<'_, scraper::Node>,
        opaque: &OpaqueMatches<'_>,
        depth: usize,
        max_depth: usize,
    ) -> Result<(), TreeError> {
        if depth > max_depth {
            return Err(TreeError::TooDeep(max_depth));
        }
        for child in source.children() {
            match child.value() {
                scraper::Node::Text(text) => {
                    let id = self.create(NodeData::Text((**text).to_string()));
                    self.append(parent, id)?;
                }
                scraper::Node::Element(el) => {
                    if let Some(category) = opaque.get(&child.id()) {
                        let html = ElementRef::wrap(child)
                            .map(|e| e.html())
                            .unwrap_or_default();
                        let id = self.preserve(category, &el.name().to_ascii_lowercase(), html);
                        self.append(parent, id)?;
                        continue;
                    }
                    let element = Element {
                        name: el.name().to_ascii_lowercase(),
                        attrs: el
                            .attrs()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                    };
                    let id = self.create(NodeData::Element(element));
                    self.append(parent, id)?;
                    self.import_children(id, child, opaque, depth + 1, max_depth)?;
                }
                // Comments, doctypes and processing instructions are dropped.
                _ => {}
            }
        }
        Ok(())
    }

    /// Parses `html` and returns its top-level nodes, detached from the tree.
    pub fn import_markup(&mut self, html: &str, max_depth: usize) -> Result<Vec<NodeId>, TreeError> {
        let doc = Html::parse_fragment(html);
        let holder = self.create(NodeData::Root);
        self.import_children(holder, *doc.root_element(), &OpaqueMatches::new(), 0, max_depth)?;
        Ok(self.children(holder).to_vec())
    }

    fn preserve(&mut self, category: &str, tag: &str, html: String) -> NodeId {
        let index = self
            .preserved
            .iter()
            .filter(|b| b.category == category)
            .count();
        self.preserved.push(PreservedBlock {
            category: category.to_string(),
            index,
            tag: tag.to_string(),
            html,
        });
        self.create(NodeData::Preserved(self.preserved.len() - 1))
    }

    pub fn preserved(&self) -> &[PreservedBlock] {
        &self.preserved
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id).ok_or(TreeError::Missing(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::Missing(id))
    }

    /// Creates a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create(NodeData::Element(Element::new(name)))
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// True when the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == ROOT || self.ancestors(id).any(|a| a == ROOT)
    }

    /// All nodes below `id` in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Attached elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    /// Attached elements whose tag is one of `names`, in document order.
    pub fn elements_named(&self, names: &[&str]) -> Vec<NodeId> {
        self.descendants(ROOT)
            .into_iter()
            .filter(|&id| self.name(id).is_some_and(|n| names.contains(&n)))
            .collect()
    }

    pub fn has_descendant_named(&self, id: NodeId, name: &str) -> bool {
        self.descendants(id).into_iter().any(|d| self.is_named(d, name))
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for d in self.descendants(id) {
            if let Some(NodeData::Text(t)) = self.data(d) {
                out.push_str(t);
            }
        }
        out
    }

    /// True when some descendant is non-blank text or a preserved block.
    pub fn has_content(&self, id: NodeId) -> bool {
        self.descendants(id).into_iter().any(|d| match self.data(d) {
            Some(NodeData::Text(t)) => !is_blank(t),
            Some(NodeData::Preserved(_)) => true,
            _ => false,
        })
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::Orphan(child))
    }

    /// Removes a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == ROOT {
            return Err(TreeError::Root("detached"));
        }
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn check_cycle(&self, node: NodeId, target: NodeId) -> Result<(), TreeError> {
        if node == ROOT {
            return Err(TreeError::Root("moved"));
        }
        if node == target || self.ancestors(target).any(|a| a == node) {
            return Err(TreeError::Cycle { node, target });
        }
        Ok(())
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        self.check_cycle(child, parent)?;
        self.detach(child)?;
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert_at(parent, usize::MAX, child)
    }

    /// Moves `child` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(sibling).ok_or(TreeError::Orphan(sibling))?;
        self.check_cycle(child, parent)?;
        self.detach(child)?;
        let index = self.position(parent, sibling)?;
        self.insert_at(parent, index, child)
    }

    /// Moves `child` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(sibling).ok_or(TreeError::Orphan(sibling))?;
        self.check_cycle(child, parent)?;
        self.detach(child)?;
        let index = self.position(parent, sibling)?;
        self.insert_at(parent, index + 1, child)
    }

    /// Removes an element, splicing its children into its place.
    pub fn unwrap(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == ROOT {
            return Err(TreeError::Root("unwrapped"));
        }
        let parent = self.parent(id).ok_or(TreeError::Orphan(id))?;
        let index = self.position(parent, id)?;
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for &c in &children {
            self.node_mut(c)?.parent = Some(parent);
        }
        self.node_mut(parent)?
            .children
            .splice(index..=index, children);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Creates a detached copy of an element without its children.
    pub fn clone_element(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let el = self.element(id).cloned().ok_or(TreeError::Missing(id))?;
        Ok(self.create(NodeData::Element(el)))
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<(), TreeError> {
        match self.element_mut(id) {
            Some(el) => {
                el.name = name.to_string();
                Ok(())
            }
            None => Err(TreeError::Missing(id)),
        }
    }

    /// Open/close token sequence of the attached tree.
    pub fn tag_sequence(&self) -> Vec<String> {
        let mut out = Vec::new();
        for &child in self.children(ROOT) {
            self.push_tags(child, &mut out);
        }
        out
    }

    fn push_tags(&self, id: NodeId, out: &mut Vec<String>) {
        let Some(el) = self.element(id) else {
            return;
        };
        out.push(format!("<{}>", el.name));
        if tags::is_void(&el.name) {
            return;
        }
        for &child in self.children(id) {
            self.push_tags(child, out);
        }
        out.push(format!("</{}>", el.name));
    }

    fn write_node(&self, id: NodeId, w: &mut Writer) {
        match self.data(id) {
            Some(NodeData::Text(t)) => w.push_str(&escape_text(t)),
            Some(NodeData::Preserved(index)) => w.push_block(*index),
            Some(NodeData::Element(el)) => {
                w.push_str("<");
                w.push_str(&el.name);
                for (k, v) in &el.attrs {
                    w.push_str(" ");
                    w.push_str(k);
                    w.push_str("=\"");
                    w.push_str(&escape_attr(v));
                    w.push_str("\"");
                }
                w.push_str(">");
                if tags::is_void(&el.name) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, w);
                }
                w.push_str("</");
                w.push_str(&el.name);
                w.push_str(">");
            }
            Some(NodeData::Root) => {
                for &child in self.children(id) {
                    self.write_node(child, w);
                }
            }
            None => {}
        }
    }

    fn block_html(&self, index: usize) -> &str {
        self.preserved
            .get(index)
            .map(|b| b.html.as_str())
            .unwrap_or_default()
    }

    fn join(&self, pieces: &[Piece]) -> String {
        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Markup(s) => out.push_str(s),
                Piece::Block(i) => out.push_str(self.block_html(*i)),
            }
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut w = Writer::default();
        self.write_node(id, &mut w);
        self.join(&w.pieces)
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut w = Writer::default();
        for &child in self.children(id) {
            self.write_node(child, &mut w);
        }
        self.join(&w.pieces)
    }

    pub fn to_html(&self) -> String {
        self.inner_html(ROOT)
    }

    /// Serializes, trims every line, drops blank lines and restores preserved blocks.
    ///
    /// Preserved markup is spliced in by identity after the line split, so its
    /// own line structure is never touched.
    pub fn to_minified_html(&self) -> String {
        let mut w = Writer::default();
        self.write_node(ROOT, &mut w);

        let mut lines: Vec<String> = vec![String::new()];
        for piece in &w.pieces {
            match piece {
                Piece::Markup(s) => {
                    let mut parts = s.split('\n');
                    if let Some(first) = parts.next() {
                        if let Some(line) = lines.last_mut() {
                            line.push_str(first);
                        }
                    }
                    lines.extend(parts.map(str::to_string));
                }
                Piece::Block(i) => {
                    if let Some(line) = lines.last_mut() {
                        line.push_str(self.block_html(*i));
                    }
                }
            }
        }

        lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Blank means empty once whitespace, including U+00A0, is trimmed.
pub fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}')
        .is_empty()
}

/// Escape text content
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape attribute value
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

/// Byte offset of the first tag or comment that never closes.
///
/// html5ever silently drops such trailing markup, so callers treat a hit as a
/// parse failure instead of emitting a truncated description.
pub fn find_unterminated(html: &str) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &html[i..];
        if let Some(body) = rest.strip_prefix("<!--") {
            match body.find("-->") {
                Some(end) => {
                    i += 4 + end + 3;
                    continue;
                }
                None => return Some(i),
            }
        }
        let opens_tag = bytes
            .get(i + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'/' || *b == b'!');
        if !opens_tag {
            i += 1;
            continue;
        }
        match rest.find('>') {
            Some(end) => i += end + 1,
            None => return Some(i),
        }
    }
    None
}
