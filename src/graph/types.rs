//! Graph data types and the content records they are built from.

use serde::{Deserialize, Serialize};

/// Structural role of a node in the portfolio tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Center,
    Category,
    Leaf,
}

/// A node in the portfolio graph.
///
/// Immutable once the model is built. Positions, velocities, pins and
/// animation timestamps live in side tables keyed by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// `None` only for the center node
    pub parent_id: Option<String>,
    /// Present exactly when `kind` is `Leaf`
    pub content: Option<ContentPayload>,
}

impl Node {
    pub fn is_center(&self) -> bool {
        self.kind == NodeKind::Center
    }
}

/// Parent -> child link, generated once per non-center node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: String,
    pub target: String,
}

/// An external link attached to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

/// Detail content for a project leaf
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectContent {
    pub title: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub results: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub links: Vec<RelatedLink>,
}

/// Detail content for an experience leaf (competitions, internships)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperienceContent {
    pub title: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub results: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Payload handed to the detail card when a leaf is activated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPayload {
    Project(ProjectContent),
    Experience(ExperienceContent),
}

impl ContentPayload {
    pub fn title(&self) -> &str {
        match self {
            ContentPayload::Project(p) => &p.title,
            ContentPayload::Experience(e) => &e.title,
        }
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            ContentPayload::Project(p) => p.role.as_deref(),
            ContentPayload::Experience(e) => e.role.as_deref(),
        }
    }

    /// Short description shown at the top of the card
    pub fn summary(&self) -> Option<&str> {
        match self {
            ContentPayload::Project(p) => p.summary.as_deref(),
            ContentPayload::Experience(e) => e.description.as_deref(),
        }
    }

    pub fn tech_stack(&self) -> &[String] {
        match self {
            ContentPayload::Project(p) => &p.tech_stack,
            ContentPayload::Experience(e) => &e.tech_stack,
        }
    }

    /// Titled long-form sections in display order, skipping empty ones
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        let (challenge, solution, results) = match self {
            ContentPayload::Project(p) => (&p.challenge, &p.solution, &p.results),
            ContentPayload::Experience(e) => (&e.challenge, &e.solution, &e.results),
        };
        [("Challenge", challenge), ("Solution", solution), ("Results", results)]
            .into_iter()
            .filter_map(|(name, text)| {
                text.as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| (name, t))
            })
            .collect()
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ContentPayload::Project(_) => "Project",
            ContentPayload::Experience(_) => "Experience",
        }
    }
}

fn default_center_id() -> String {
    "center".to_string()
}

/// The root of the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterRecord {
    #[serde(default = "default_center_id")]
    pub id: String,
    pub label: String,
}

/// A grouping node. Without a parent it hangs off the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// A content-bearing node attached to a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub id: String,
    pub label: String,
    pub parent: String,
    pub content: ContentPayload,
}

/// Hierarchical content as delivered by a content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSource {
    pub center: CenterRecord,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub leaves: Vec<LeafRecord>,
}

impl ContentSource {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.leaves.is_empty()
    }
}
