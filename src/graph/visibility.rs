//! Expanded/visible subset of the graph and activation semantics.

use super::model::GraphModel;
use super::types::{ContentPayload, Link, Node, NodeKind};
use std::collections::{HashSet, VecDeque};

/// Why an activation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownNode,
    NotVisible,
    /// A detail card is already open
    CardOpen,
}

/// Result of activating a node
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// The center revealed its children. `first` is true only once per session.
    CenterOpened { revealed: Vec<String>, first: bool },
    Expanded { id: String, revealed: Vec<String> },
    Collapsed { id: String, hidden: Vec<String> },
    ContentRequested { id: String, content: ContentPayload },
    Ignored(IgnoreReason),
}

impl Activation {
    /// Whether the visible set changed
    pub fn changes_visibility(&self) -> bool {
        match self {
            Activation::CenterOpened { revealed, .. } | Activation::Expanded { revealed, .. } => {
                !revealed.is_empty()
            }
            Activation::Collapsed { hidden, .. } => !hidden.is_empty(),
            Activation::ContentRequested { .. } | Activation::Ignored(_) => false,
        }
    }
}

/// Which nodes are expanded, and whether a detail card is open.
///
/// Visibility is derived: the center is always visible, and a node's
/// children are visible exactly when the node itself is visible and
/// expanded. Sibling groups are therefore revealed and hidden as a whole.
#[derive(Debug, Clone, Default)]
pub struct VisibilityState {
    expanded: HashSet<String>,
    card: Option<String>,
    intro_dismissed: bool,
}

impl VisibilityState {
    /// Only the center is visible
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    /// Leaf whose detail card is currently open
    pub fn open_card(&self) -> Option<&str> {
        self.card.as_deref()
    }

    pub fn intro_dismissed(&self) -> bool {
        self.intro_dismissed
    }

    /// Re-enable leaf activation after the host dismissed the card
    pub fn close_card(&mut self) -> Option<String> {
        self.card.take()
    }

    pub fn activate(&mut self, model: &GraphModel, id: &str) -> Activation {
        let Some(node) = model.node(id) else {
            return Activation::Ignored(IgnoreReason::UnknownNode);
        };
        let before = self.visible_ids(model);
        if !before.contains(id) {
            return Activation::Ignored(IgnoreReason::NotVisible);
        }

        match node.kind {
            NodeKind::Center => {
                self.expanded.insert(node.id.clone());
                let first = !self.intro_dismissed;
                self.intro_dismissed = true;
                Activation::CenterOpened {
                    revealed: self.diff(model, &before),
                    first,
                }
            }
            NodeKind::Category => {
                if self.expanded.remove(&node.id) {
                    for descendant in model.descendants(&node.id) {
                        self.expanded.remove(&descendant.id);
                    }
                    let after = self.visible_ids(model);
                    let hidden = model
                        .nodes()
                        .iter()
                        .filter(|n| before.contains(&n.id) && !after.contains(&n.id))
                        .map(|n| n.id.clone())
                        .collect();
                    Activation::Collapsed {
                        id: node.id.clone(),
                        hidden,
                    }
                } else {
                    self.expanded.insert(node.id.clone());
                    Activation::Expanded {
                        id: node.id.clone(),
                        revealed: self.diff(model, &before),
                    }
                }
            }
            NodeKind::Leaf => {
                if self.card.is_some() {
                    return Activation::Ignored(IgnoreReason::CardOpen);
                }
                let Some(content) = node.content.clone() else {
                    return Activation::Ignored(IgnoreReason::UnknownNode);
                };
                self.card = Some(node.id.clone());
                Activation::ContentRequested {
                    id: node.id.clone(),
                    content,
                }
            }
        }
    }

    /// Nodes that became visible relative to `before`, in model order
    fn diff(&self, model: &GraphModel, before: &HashSet<String>) -> Vec<String> {
        let after = self.visible_ids(model);
        model
            .nodes()
            .iter()
            .filter(|n| after.contains(&n.id) && !before.contains(&n.id))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Walk down from the center through expanded nodes only
    pub fn visible_ids(&self, model: &GraphModel) -> HashSet<String> {
        let center = model.center();
        let mut visible = HashSet::from([center.id.clone()]);
        let mut queue = VecDeque::from([center.id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !self.expanded.contains(id) {
                continue;
            }
            for child in model.children(id) {
                visible.insert(child.id.clone());
                queue.push_back(&child.id);
            }
        }
        visible
    }

    pub fn is_visible(&self, model: &GraphModel, id: &str) -> bool {
        self.visible_ids(model).contains(id)
    }

    /// Visible nodes in model order
    pub fn visible_nodes<'m>(&self, model: &'m GraphModel) -> Vec<&'m Node> {
        let visible = self.visible_ids(model);
        model
            .nodes()
            .iter()
            .filter(|n| visible.contains(&n.id))
            .collect()
    }

    /// Links whose endpoints are both visible
    pub fn visible_links<'m>(&self, model: &'m GraphModel) -> Vec<&'m Link> {
        let visible = self.visible_ids(model);
        model
            .links()
            .iter()
            .filter(|l| visible.contains(&l.source) && visible.contains(&l.target))
            .collect()
    }
}
