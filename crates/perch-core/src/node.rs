#![forbid(unsafe_code)]

//! Element tree: the retained document that overlays mount into.
//!
//! [`NodeTree`] is an arena of [`Element`]s with parent/child links. It is the
//! host-side stand-in for a DOM: overlays append subtrees under the root,
//! the host assigns bounds, and queries such as containment, tab order, and
//! hit testing run against the live structure.
//!
//! # Invariants
//!
//! - The root always exists and cannot be removed.
//! - [`NodeId`] is generational. Removing a node frees its slot; reusing the
//!   slot bumps the generation, so a stale id never resolves to a new node.
//! - Every query on a stale id behaves as if the node had no content: `get`
//!   returns `None`, `contains` returns `false`, `children` is empty.
//!
//! # Failure Modes
//!
//! - Mutations through a stale id return [`TreeError::StaleNode`].
//! - Removing the root returns [`TreeError::RootRemoval`].

use smallvec::SmallVec;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::geometry::{Rect, Size};

/// Identifier for a node in the tree.
///
/// A slot index plus a generation counter. Stays stable while the node is
/// alive and becomes permanently stale once the node is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Errors returned by tree mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node was removed (or never belonged to this tree).
    #[error("node {0:?} is not part of the tree")]
    StaleNode(NodeId),
    /// The root node is permanent.
    #[error("the root node cannot be removed")]
    RootRemoval,
}

/// Class identifiers applied to an element.
pub type ClassList = SmallVec<[&'static str; 4]>;

/// What an element is. Determines natural focusability and intrinsic size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Generic block container.
    Div,
    /// Push button. Naturally focusable.
    Button,
    /// Text input. Naturally focusable.
    Input,
    /// Hyperlink. Naturally focusable only when it carries an href.
    Link {
        /// Link target.
        href: Option<String>,
    },
    /// Text run. Each `\n` starts a new row.
    Text(String),
}

/// Explicit height constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Height {
    /// Size to content.
    #[default]
    Auto,
    /// Fixed number of rows.
    Cells(u16),
}

/// A single element in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element kind.
    pub kind: ElementKind,
    /// Document-level identifier, used for accessibility linkage.
    pub dom_id: Option<String>,
    /// Explicit tab index. Negative values are focusable programmatically but
    /// skipped by sequential navigation.
    pub tab_index: Option<i32>,
    /// Disabled elements never take focus.
    pub disabled: bool,
    /// Applied class identifiers.
    pub classes: ClassList,
    /// Height constraint.
    pub height: Height,
    /// Horizontal offset relative to the parent, in cells.
    pub left: Option<u16>,
    /// Screen bounds assigned by the host layout pass.
    pub bounds: Rect,
}

impl Element {
    /// Create an element of the given kind with default attributes.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            dom_id: None,
            tab_index: None,
            disabled: false,
            classes: ClassList::new(),
            height: Height::Auto,
            left: None,
            bounds: Rect::default(),
        }
    }

    /// Generic container.
    pub fn div() -> Self {
        Self::new(ElementKind::Div)
    }

    /// Button element.
    pub fn button() -> Self {
        Self::new(ElementKind::Button)
    }

    /// Text input element.
    pub fn input() -> Self {
        Self::new(ElementKind::Input)
    }

    /// Link element pointing at `href`.
    pub fn link(href: impl Into<String>) -> Self {
        Self::new(ElementKind::Link {
            href: Some(href.into()),
        })
    }

    /// Text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Text(text.into()))
    }

    /// Set the document id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    /// Set an explicit tab index.
    #[must_use]
    pub fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    /// Add a class identifier.
    #[must_use]
    pub fn with_class(mut self, class: &'static str) -> Self {
        self.set_class(class, true);
        self
    }

    /// Set the disabled flag.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the screen bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Whether the class identifier is applied.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }

    /// Add or remove a class in place.
    pub fn set_class(&mut self, class: &'static str, on: bool) {
        if on {
            if !self.has_class(class) {
                self.classes.push(class);
            }
        } else {
            self.classes.retain(|c| *c != class);
        }
    }

    /// Whether the element can receive focus at all (programmatically or by tabbing).
    pub fn is_focusable(&self) -> bool {
        if self.disabled {
            return false;
        }
        self.tab_index.is_some() || self.is_natively_focusable()
    }

    /// Whether sequential (Tab) navigation visits the element.
    pub fn is_tabbable(&self) -> bool {
        if !self.is_focusable() {
            return false;
        }
        self.tab_index.is_none_or(|idx| idx >= 0)
    }

    fn is_natively_focusable(&self) -> bool {
        match &self.kind {
            ElementKind::Button | ElementKind::Input => true,
            ElementKind::Link { href } => href.is_some(),
            ElementKind::Div | ElementKind::Text(_) => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    generation: u32,
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree holding only an empty root container.
    pub fn new() -> Self {
        let root = NodeId::new(0, 1);
        Self {
            nodes: vec![Some(Node {
                generation: 1,
                element: Element::div(),
                parent: None,
                children: Vec::new(),
            })],
            generations: vec![1],
            free_list: Vec::new(),
            root,
        }
    }

    /// The permanent root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `id` still refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Borrow an element.
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    /// Mutably borrow an element.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_mut(id).map(|n| &mut n.element)
    }

    /// Parent of a node. The root and stale ids have none.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children of a node in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Result<NodeId, TreeError> {
        let index = self.children(parent).len();
        self.insert(parent, index, element)
    }

    /// Insert `element` as a child of `parent` at `index` (clamped to the child count).
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        element: Element,
    ) -> Result<NodeId, TreeError> {
        if !self.is_alive(parent) {
            return Err(TreeError::StaleNode(parent));
        }
        let id = self.allocate(element, parent);
        if let Some(p) = self.node_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        Ok(id)
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }
        let parent = self.node(id).ok_or(TreeError::StaleNode(id))?.parent;
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        self.free_subtree(id);
        Ok(())
    }

    /// Replace the screen bounds of a node.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Result<(), TreeError> {
        let element = self.get_mut(id).ok_or(TreeError::StaleNode(id))?;
        element.bounds = bounds;
        Ok(())
    }

    /// Whether `node` is `root` itself or one of its descendants.
    ///
    /// Walks parent links on every call; stale ids are never contained.
    pub fn contains(&self, root: NodeId, node: NodeId) -> bool {
        if !self.is_alive(root) {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == root {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether a live node can take focus.
    pub fn is_focusable(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Element::is_focusable)
    }

    /// First focusable descendant of `root` in document order (never `root` itself).
    pub fn first_focusable_descendant(&self, root: NodeId) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.is_focusable(*id))
    }

    /// Sequential navigation order for the whole document.
    ///
    /// Positive tab indices come first in ascending order, then tab index 0
    /// and natively focusable elements in document order.
    pub fn tab_order(&self) -> Vec<NodeId> {
        let mut positive: Vec<(i32, NodeId)> = Vec::new();
        let mut natural: Vec<NodeId> = Vec::new();
        for id in std::iter::once(self.root).chain(self.descendants(self.root)) {
            let Some(element) = self.get(id) else {
                continue;
            };
            if !element.is_tabbable() {
                continue;
            }
            match element.tab_index {
                Some(idx) if idx > 0 => positive.push((idx, id)),
                _ => natural.push(id),
            }
        }
        positive.sort_by_key(|(idx, _)| *idx);
        positive.into_iter().map(|(_, id)| id).chain(natural).collect()
    }

    /// Deepest node whose bounds contain the point.
    ///
    /// Later siblings are painted on top and win ties. Child bounds are not
    /// required to lie inside their parent's bounds.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<NodeId> {
        self.hit_from(self.root, x, y)
    }

    fn hit_from(&self, id: NodeId, x: u16, y: u16) -> Option<NodeId> {
        for child in self.children(id).iter().rev() {
            if let Some(hit) = self.hit_from(*child, x, y) {
                return Some(hit);
            }
        }
        self.get(id)
            .filter(|e| e.bounds.contains(x, y))
            .map(|_| id)
    }

    /// Natural size of a node's content.
    ///
    /// Text measures its display width and line count, containers stack their
    /// children vertically, and other leaves occupy one row. A fixed height
    /// overrides the measured one.
    pub fn intrinsic_size(&self, id: NodeId) -> Size {
        let Some(node) = self.node(id) else {
            return Size::default();
        };
        let mut size = match &node.element.kind {
            ElementKind::Text(text) => text_size(text),
            _ if node.children.is_empty() => match node.element.kind {
                ElementKind::Div => Size::default(),
                _ => Size::new(0, 1),
            },
            _ => node
                .children
                .iter()
                .map(|c| self.intrinsic_size(*c))
                .fold(Size::default(), |acc, s| {
                    Size::new(acc.width.max(s.width), acc.height.saturating_add(s.height))
                }),
        };
        if let Height::Cells(h) = node.element.height {
            size.height = h;
        }
        size
    }

    fn allocate(&mut self, element: Element, parent: NodeId) -> NodeId {
        let node = |generation| Node {
            generation,
            element,
            parent: Some(parent),
            children: Vec::new(),
        };
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            self.nodes.push(Some(node(1)));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, 1)
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.free_subtree(child);
        }
        if self.is_alive(id) {
            self.nodes[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.1).then_some(n)
    }
}

fn text_size(text: &str) -> Size {
    if text.is_empty() {
        return Size::default();
    }
    let mut width = 0usize;
    let mut rows = 0usize;
    for line in text.split('\n') {
        width = width.max(line.width());
        rows += 1;
    }
    Size::new(
        u16::try_from(width).unwrap_or(u16::MAX),
        u16::try_from(rows).unwrap_or(u16::MAX),
    )
}
