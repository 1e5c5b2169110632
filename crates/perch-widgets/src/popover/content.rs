#![forbid(unsafe_code)]

//! Declarative panel content and its normalization into panes.
//!
//! Content is always rendered inside at least one pane unless the caller
//! already supplied one or more panes at the top level. Children carry an
//! explicit tag ([`Child::Pane`] or [`Child::Plain`]) so the check is a match,
//! not a type inspection.

use perch_core::node::{Element, NodeId, NodeTree, TreeError};

/// Class of a pane wrapper.
pub const PANE_CLASS: &str = "Popover-Pane";
/// Class of the section inside a sectioned pane.
pub const SECTION_CLASS: &str = "Popover-Section";

/// Element description materialised into the tree on mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// The element itself.
    pub element: Element,
    /// Child views in order.
    pub children: Vec<View>,
}

impl View {
    /// A leaf view.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            children: Vec::new(),
        }
    }

    /// A text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Element::text(text))
    }

    /// Append a child view.
    #[must_use]
    pub fn child(mut self, child: View) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child views.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(children);
        self
    }

    /// Build this view under `parent`, returning the new node.
    pub fn mount(&self, tree: &mut NodeTree, parent: NodeId) -> Result<NodeId, TreeError> {
        let id = tree.append(parent, self.element.clone())?;
        for child in &self.children {
            child.mount(tree, id)?;
        }
        Ok(id)
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::new(element)
    }
}

/// A scrollable pane; the recognized section-like wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pane {
    /// Wrap children in a section element.
    pub sectioned: bool,
    /// Pane content.
    pub children: Vec<View>,
}

impl Pane {
    /// An empty, unsectioned pane.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sectioned flag.
    #[must_use]
    pub fn sectioned(mut self, sectioned: bool) -> Self {
        self.sectioned = sectioned;
        self
    }

    /// Append a child view.
    #[must_use]
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// The pane as a view tree.
    pub fn to_view(&self) -> View {
        let pane = View::new(Element::div().with_class(PANE_CLASS));
        if self.sectioned {
            pane.child(
                View::new(Element::div().with_class(SECTION_CLASS))
                    .with_children(self.children.iter().cloned()),
            )
        } else {
            pane.with_children(self.children.iter().cloned())
        }
    }
}

/// One top-level content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// Already a pane; passes through.
    Pane(Pane),
    /// Anything else.
    Plain(View),
}

impl Child {
    /// Whether this item is a pane.
    #[inline]
    pub fn is_pane(&self) -> bool {
        matches!(self, Self::Pane(_))
    }

    fn into_view(self) -> View {
        match self {
            Self::Pane(pane) => pane.to_view(),
            Self::Plain(view) => view,
        }
    }
}

impl From<Pane> for Child {
    fn from(pane: Pane) -> Self {
        Self::Pane(pane)
    }
}

impl From<View> for Child {
    fn from(view: View) -> Self {
        Self::Plain(view)
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Plain(View::new(element))
    }
}

/// Normalize top-level children into panes.
///
/// All-pane input passes through untouched. Anything else, including an
/// empty list or a mix of panes and plain items, is wrapped as a whole in a
/// single pane carrying `sectioned`.
pub fn normalize(children: &[Child], sectioned: bool) -> Vec<Pane> {
    if !children.is_empty() && children.iter().all(Child::is_pane) {
        return children
            .iter()
            .filter_map(|child| match child {
                Child::Pane(pane) => Some(pane.clone()),
                Child::Plain(_) => None,
            })
            .collect();
    }
    vec![Pane {
        sectioned,
        children: children.iter().cloned().map(Child::into_view).collect(),
    }]
}

/// Materialise normalized panes under `parent`.
pub fn mount_panes(
    tree: &mut NodeTree,
    parent: NodeId,
    panes: &[Pane],
) -> Result<Vec<NodeId>, TreeError> {
    panes
        .iter()
        .map(|pane| pane.to_view().mount(tree, parent))
        .collect()
}
