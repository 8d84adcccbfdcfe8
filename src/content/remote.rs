//! HTTP client for the Sanity content API.
//!
//! Fetches `synapseNode`, `project` and `experience` documents with GROQ
//! queries and folds them into a [`ContentSource`].

use crate::error::ContentError;
use crate::graph::types::{
    CategoryRecord, CenterRecord, ContentPayload, ContentSource, ExperienceContent, LeafRecord,
    ProjectContent, RelatedLink,
};
use crate::settings::ContentSettings;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const CENTER_ID: &str = "center";

/// Placeholder left in fresh project templates
const PLACEHOLDER_PROJECT: &str = "your-project-id";

const NODES_QUERY: &str = r#"*[_type == "synapseNode"]{
  _id,
  label,
  parentNode->{_id, label},
  linkedContent->{_type, _id}
}"#;

const PROJECTS_QUERY: &str = r#"*[_type == "project"]{
  _id,
  projectTitle,
  role,
  projectSummary,
  challenge,
  solution,
  results,
  "coverImage": coverMedia.asset->url,
  techStack,
  relatedLinks
}"#;

const EXPERIENCES_QUERY: &str = r#"*[_type == "experience"]{
  _id,
  experienceTitle,
  role,
  category,
  period,
  description,
  challenge,
  solution,
  results,
  techStack,
  "images": relatedImages[].asset->url
}"#;

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocRef {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynapseNodeDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub parent_node: Option<DocRef>,
    #[serde(default)]
    pub linked_content: Option<DocRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedLinkDoc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub project_summary: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub results: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub related_links: Option<Vec<RelatedLinkDoc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDoc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub experience_title: Option<String>,
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
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<Option<String>>>,
}

impl ProjectDoc {
    fn into_payload(self) -> ContentPayload {
        let links = self
            .related_links
            .unwrap_or_default()
            .into_iter()
            .filter_map(|link| {
                let url = link.url?;
                Some(RelatedLink {
                    title: link.title.unwrap_or_else(|| url.clone()),
                    url,
                })
            })
            .collect();
        ContentPayload::Project(ProjectContent {
            title: self.project_title.unwrap_or(self.id),
            role: self.role,
            summary: self.project_summary,
            challenge: self.challenge,
            solution: self.solution,
            results: self.results,
            tech_stack: self.tech_stack.unwrap_or_default(),
            image: self.cover_image,
            links,
        })
    }
}

impl ExperienceDoc {
    fn into_payload(self) -> ContentPayload {
        ContentPayload::Experience(ExperienceContent {
            title: self.experience_title.unwrap_or(self.id),
            role: self.role,
            category: self.category,
            period: self.period,
            description: self.description,
            challenge: self.challenge,
            solution: self.solution,
            results: self.results,
            tech_stack: self.tech_stack.unwrap_or_default(),
            images: self.images.unwrap_or_default().into_iter().flatten().collect(),
        })
    }
}

/// Fold raw documents into a content tree.
///
/// Nodes with resolvable `linkedContent` become leaves, all others become
/// categories. A missing `parentNode` means the node hangs off the center.
pub fn documents_to_source(
    nodes: Vec<SynapseNodeDoc>,
    projects: Vec<ProjectDoc>,
    experiences: Vec<ExperienceDoc>,
    center_label: &str,
) -> Result<ContentSource, ContentError> {
    if nodes.is_empty() {
        return Err(ContentError::Empty);
    }

    let mut content: HashMap<String, ContentPayload> = HashMap::new();
    for project in projects {
        content.insert(project.id.clone(), project.into_payload());
    }
    for experience in experiences {
        content.insert(experience.id.clone(), experience.into_payload());
    }

    let mut categories = Vec::new();
    let mut leaves = Vec::new();
    for node in nodes {
        let parent = node.parent_node.map(|p| p.id);
        let payload = match &node.linked_content {
            Some(link) => {
                let found = content.get(&link.id).cloned();
                if found.is_none() {
                    tracing::warn!(
                        node = %node.id,
                        content = %link.id,
                        "linked content not found, showing node as a category"
                    );
                }
                found
            }
            None => None,
        };

        match payload {
            Some(payload) => leaves.push(LeafRecord {
                label: node
                    .label
                    .unwrap_or_else(|| payload.title().to_string()),
                id: node.id,
                parent: parent.unwrap_or_else(|| CENTER_ID.to_string()),
                content: payload,
            }),
            None => categories.push(CategoryRecord {
                label: node.label.unwrap_or_else(|| node.id.clone()),
                id: node.id,
                parent,
            }),
        }
    }

    Ok(ContentSource {
        center: CenterRecord {
            id: CENTER_ID.to_string(),
            label: center_label.to_string(),
        },
        categories,
        leaves,
    })
}

pub struct SanityClient {
    client: Client,
    base_url: String,
    center_label: String,
}

impl SanityClient {
    pub fn new(settings: &ContentSettings) -> Result<Self, ContentError> {
        let project_id = settings
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != PLACEHOLDER_PROJECT)
            .ok_or(ContentError::NotConfigured)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "https://{}.api.sanity.io/v{}/data/query/{}",
                project_id, settings.api_version, settings.dataset
            ),
            center_label: settings.center_label.clone(),
        })
    }

    pub fn query_url(&self, groq: &str) -> String {
        format!("{}?query={}", self.base_url, urlencoding::encode(groq))
    }

    /// Run one GROQ query and return its `result` array
    fn query<T: DeserializeOwned>(&self, groq: &str) -> Result<Vec<T>, ContentError> {
        let resp = self.client.get(self.query_url(groq)).send()?;

        if !resp.status().is_success() {
            return Err(ContentError::Status(resp.status()));
        }

        let body = resp.text()?;
        let parsed: QueryResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.result)
    }

    /// Fetch the whole portfolio
    pub fn fetch(&self) -> Result<ContentSource, ContentError> {
        let nodes: Vec<SynapseNodeDoc> = self.query(NODES_QUERY)?;
        let projects: Vec<ProjectDoc> = self.query(PROJECTS_QUERY)?;
        let experiences: Vec<ExperienceDoc> = self.query(EXPERIENCES_QUERY)?;
        tracing::debug!(
            nodes = nodes.len(),
            projects = projects.len(),
            experiences = experiences.len(),
            "fetched content documents"
        );
        documents_to_source(nodes, projects, experiences, &self.center_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphModel;
    use serde_json::json;

    fn docs<T: DeserializeOwned>(value: serde_json::Value) -> Vec<T> {
        serde_json::from_value::<QueryResponse<T>>(json!({ "result": value }))
            .unwrap()
            .result
    }

    #[test]
    fn documents_fold_into_a_tree() {
        let nodes = docs(json!([
            { "_id": "n-arm", "label": "Gripper", "parentNode": { "_id": "n-lab", "label": "Lab" },
              "linkedContent": { "_type": "project", "_id": "p-arm" } },
            { "_id": "n-lab", "label": "Lab", "parentNode": null },
            { "_id": "n-dragon", "parentNode": { "_id": "n-sport" },
              "linkedContent": { "_type": "experience", "_id": "e-dragon" } },
            { "_id": "n-sport", "label": "Sport" }
        ]));
        let projects = docs(json!([
            { "_id": "p-arm", "projectTitle": "Lossless gripper", "role": "Lead",
              "techStack": ["ROS", "Python"], "coverImage": null,
              "relatedLinks": [{ "title": "Demo", "url": "https://example.com" }, { "title": "No url" }] }
        ]));
        let experiences = docs(json!([
            { "_id": "e-dragon", "experienceTitle": "Dragon dance", "category": "Bronze",
              "description": "Trained at dawn", "images": [null, "https://example.com/a.png"] }
        ]));

        let source = documents_to_source(nodes, projects, experiences, "Me").unwrap();
        assert_eq!(source.center.id, "center");
        assert_eq!(source.center.label, "Me");
        assert_eq!(source.categories.len(), 2);
        assert!(source.categories.iter().all(|c| c.parent.is_none()));
        assert_eq!(source.leaves.len(), 2);

        let arm = source.leaves.iter().find(|l| l.id == "n-arm").unwrap();
        assert_eq!(arm.parent, "n-lab");
        match &arm.content {
            ContentPayload::Project(p) => {
                assert_eq!(p.title, "Lossless gripper");
                assert_eq!(p.tech_stack, vec!["ROS", "Python"]);
                assert_eq!(p.links.len(), 1);
            }
            other => panic!("expected project, got {other:?}"),
        }

        // Unlabelled leaves borrow the content title
        let dragon = source.leaves.iter().find(|l| l.id == "n-dragon").unwrap();
        assert_eq!(dragon.label, "Dragon dance");
        match &dragon.content {
            ContentPayload::Experience(e) => {
                assert_eq!(e.images, vec!["https://example.com/a.png"]);
                assert_eq!(e.description.as_deref(), Some("Trained at dawn"));
            }
            other => panic!("expected experience, got {other:?}"),
        }

        let report = GraphModel::build(&source);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.model.len(), 5);
    }

    #[test]
    fn dangling_content_reference_becomes_category() {
        let nodes = docs(json!([
            { "_id": "n1", "label": "Orphan", "linkedContent": { "_id": "missing" } }
        ]));
        let source = documents_to_source(nodes, Vec::new(), Vec::new(), "Me").unwrap();
        assert!(source.leaves.is_empty());
        assert_eq!(source.categories[0].id, "n1");
    }

    #[test]
    fn no_nodes_is_empty() {
        assert!(matches!(
            documents_to_source(Vec::new(), Vec::new(), Vec::new(), "Me"),
            Err(ContentError::Empty)
        ));
    }

    #[test]
    fn unconfigured_project_is_rejected() {
        let mut settings = ContentSettings::default();
        assert!(matches!(
            SanityClient::new(&settings),
            Err(ContentError::NotConfigured)
        ));
        settings.project_id = Some(PLACEHOLDER_PROJECT.into());
        assert!(matches!(
            SanityClient::new(&settings),
            Err(ContentError::NotConfigured)
        ));
    }

    #[test]
    fn query_is_url_encoded() {
        let settings = ContentSettings {
            project_id: Some("abc123".into()),
            ..Default::default()
        };
        let client = SanityClient::new(&settings).unwrap();
        let url = client.query_url(r#"*[_type == "project"]"#);
        assert_eq!(
            url,
            "https://abc123.api.sanity.io/v2024-03-11/data/query/production\
             ?query=%2A%5B_type%20%3D%3D%20%22project%22%5D"
        );
    }
}
