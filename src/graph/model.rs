//! Normalized node/link model derived from hierarchical content.
//!
//! The parent relation is validated into a tree rooted at the center node.
//! Records that cannot be attached are dropped with a [`BuildWarning`]
//! rather than failing the whole build.

use super::types::{ContentSource, Link, Node, NodeKind};
use std::collections::{HashMap, HashSet};

/// Why a content record was left out of the model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildWarning {
    #[error("duplicate node id `{id}`, keeping the first occurrence")]
    DuplicateId { id: String },
    #[error("node `{id}` names unknown parent `{parent}`")]
    MissingParent { id: String, parent: String },
    #[error("node `{id}` names leaf `{parent}` as its parent")]
    LeafParent { id: String, parent: String },
    #[error("node `{id}` is not reachable from the center through `{parent}`")]
    Unreachable { id: String, parent: String },
}

impl BuildWarning {
    pub fn node_id(&self) -> &str {
        match self {
            BuildWarning::DuplicateId { id }
            | BuildWarning::MissingParent { id, .. }
            | BuildWarning::LeafParent { id, .. }
            | BuildWarning::Unreachable { id, .. } => id,
        }
    }
}

/// Result of building a model: the model plus everything that was dropped
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub model: GraphModel,
    pub warnings: Vec<BuildWarning>,
}

/// Immutable tree of nodes with derived parent -> child links
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    parent: Vec<Option<usize>>,
}

/// A record waiting to be attached
struct Pending {
    id: String,
    parent: String,
    kind: NodeKind,
    order: usize,
}

impl GraphModel {
    /// Build a model from content records.
    ///
    /// Records may arrive in any order. Anything whose parent chain does not
    /// resolve to the center is dropped and reported.
    pub fn build(source: &ContentSource) -> BuildReport {
        let center_id = source.center.id.clone();
        let mut warnings = Vec::new();

        // Collect candidates, first occurrence of an id wins
        let mut seen: HashSet<String> = HashSet::from([center_id.clone()]);
        let mut pending: Vec<Pending> = Vec::new();
        let candidates = source
            .categories
            .iter()
            .map(|c| {
                let parent = c.parent.clone().unwrap_or_else(|| center_id.clone());
                (&c.id, parent, NodeKind::Category)
            })
            .chain(
                source
                    .leaves
                    .iter()
                    .map(|l| (&l.id, l.parent.clone(), NodeKind::Leaf)),
            );

        for (order, (id, parent, kind)) in candidates.enumerate() {
            if !seen.insert(id.clone()) {
                warnings.push(BuildWarning::DuplicateId { id: id.clone() });
                continue;
            }
            pending.push(Pending {
                id: id.clone(),
                parent,
                kind,
                order,
            });
        }

        let kinds: HashMap<&str, NodeKind> = pending
            .iter()
            .map(|p| (p.id.as_str(), p.kind))
            .chain(std::iter::once((center_id.as_str(), NodeKind::Center)))
            .collect();

        // Attach in passes until nothing changes, so children may precede parents
        let mut attached: HashSet<&str> = HashSet::from([center_id.as_str()]);
        let mut accepted: HashSet<usize> = HashSet::new();
        loop {
            let mut progressed = false;
            for p in &pending {
                if accepted.contains(&p.order) || !attached.contains(p.parent.as_str()) {
                    continue;
                }
                if kinds.get(p.parent.as_str()) == Some(&NodeKind::Leaf) {
                    continue;
                }
                accepted.insert(p.order);
                attached.insert(p.id.as_str());
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        for p in pending.iter().filter(|p| !accepted.contains(&p.order)) {
            let warning = match kinds.get(p.parent.as_str()) {
                None => BuildWarning::MissingParent {
                    id: p.id.clone(),
                    parent: p.parent.clone(),
                },
                Some(NodeKind::Leaf) => BuildWarning::LeafParent {
                    id: p.id.clone(),
                    parent: p.parent.clone(),
                },
                Some(_) => BuildWarning::Unreachable {
                    id: p.id.clone(),
                    parent: p.parent.clone(),
                },
            };
            warnings.push(warning);
        }

        for warning in &warnings {
            tracing::warn!(node = warning.node_id(), "dropping content record: {}", warning);
        }

        // Materialize nodes in input order: center, categories, leaves
        let mut nodes = vec![Node {
            id: center_id.clone(),
            label: source.center.label.clone(),
            kind: NodeKind::Center,
            parent_id: None,
            content: None,
        }];
        let parent_of: HashMap<&str, &str> = pending
            .iter()
            .filter(|p| accepted.contains(&p.order))
            .map(|p| (p.id.as_str(), p.parent.as_str()))
            .collect();
        let mut emitted: HashSet<&str> = HashSet::from([center_id.as_str()]);

        for category in &source.categories {
            if let Some(parent) = parent_of.get(category.id.as_str()) {
                if !emitted.insert(category.id.as_str()) {
                    continue;
                }
                nodes.push(Node {
                    id: category.id.clone(),
                    label: category.label.clone(),
                    kind: NodeKind::Category,
                    parent_id: Some(parent.to_string()),
                    content: None,
                });
            }
        }
        for leaf in &source.leaves {
            if let Some(parent) = parent_of.get(leaf.id.as_str()) {
                if !emitted.insert(leaf.id.as_str()) {
                    continue;
                }
                nodes.push(Node {
                    id: leaf.id.clone(),
                    label: leaf.label.clone(),
                    kind: NodeKind::Leaf,
                    parent_id: Some(parent.to_string()),
                    content: Some(leaf.content.clone()),
                });
            }
        }

        let model = Self::from_nodes(nodes);
        tracing::debug!(
            nodes = model.len(),
            dropped = warnings.len(),
            "built graph model"
        );

        BuildReport { model, warnings }
    }

    /// Index already-validated nodes. The first node must be the center.
    fn from_nodes(nodes: Vec<Node>) -> Self {
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        let mut parent = vec![None; nodes.len()];
        let mut links = Vec::with_capacity(nodes.len().saturating_sub(1));

        for (i, node) in nodes.iter().enumerate() {
            if let Some(&p) = node.parent_id.as_ref().and_then(|pid| index.get(pid)) {
                children[p].push(i);
                parent[i] = Some(p);
                links.push(Link {
                    source: nodes[p].id.clone(),
                    target: node.id.clone(),
                });
            }
        }

        Self {
            nodes,
            links,
            index,
            children,
            parent,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in model order (center first)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn center(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn children(&self, id: &str) -> impl Iterator<Item = &Node> + '_ {
        self.index
            .get(id)
            .map(|&i| self.children[i].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&c| &self.nodes[c])
    }

    pub fn parent(&self, id: &str) -> Option<&Node> {
        let &i = self.index.get(id)?;
        self.parent[i].map(|p| &self.nodes[p])
    }

    /// Ancestors from the direct parent up to the center
    pub fn ancestors(&self, id: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut current = self.index.get(id).and_then(|&i| self.parent[i]);
        while let Some(p) = current {
            out.push(&self.nodes[p]);
            current = self.parent[p];
        }
        out
    }

    /// Distance from the center (center is 0)
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.index.get(id)?;
        Some(self.ancestors(id).len())
    }

    /// Every node below `id`, breadth-first
    pub fn descendants(&self, id: &str) -> Vec<&Node> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut queue: std::collections::VecDeque<usize> =
            self.children[start].iter().copied().collect();
        while let Some(i) = queue.pop_front() {
            out.push(&self.nodes[i]);
            queue.extend(self.children[i].iter().copied());
        }
        out
    }

    /// Position of `id` among its siblings, as `(index, sibling_count)`
    pub fn sibling_index(&self, id: &str) -> Option<(usize, usize)> {
        let &i = self.index.get(id)?;
        let Some(p) = self.parent[i] else {
            return Some((0, 1));
        };
        let siblings = &self.children[p];
        siblings
            .iter()
            .position(|&s| s == i)
            .map(|pos| (pos, siblings.len()))
    }
}
