//! Portfolio content compiled into the binary, and local content files.

use crate::error::ContentError;
use crate::graph::types::ContentSource;
use std::path::Path;

const PORTFOLIO_JSON: &str = include_str!("../../assets/portfolio.json");

pub fn parse_source(json: &str) -> Result<ContentSource, ContentError> {
    let source: ContentSource = serde_json::from_str(json)?;
    if source.is_empty() {
        return Err(ContentError::Empty);
    }
    Ok(source)
}

/// The offline dataset shipped with the app
pub fn bundled_source() -> Result<ContentSource, ContentError> {
    parse_source(PORTFOLIO_JSON)
}

pub fn load_file(path: &Path) -> Result<ContentSource, ContentError> {
    let json = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphModel, NodeKind};

    #[test]
    fn bundled_portfolio_builds_cleanly() {
        let source = bundled_source().unwrap();
        let report = GraphModel::build(&source);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let model = report.model;
        assert_eq!(model.center().label, "曾德荣");
        assert_eq!(model.children("center").count(), 3);
        assert_eq!(model.children("embodied").count(), 4);
        assert_eq!(model.children("work").count(), 3);
        assert_eq!(model.children("competition").count(), 3);
        assert!(model
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Leaf)
            .all(|n| n.content.is_some()));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_file(Path::new("/definitely/not/here.json")).unwrap_err();
        match err {
            ContentError::Io { path, .. } => assert!(path.ends_with("here.json")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn center_only_content_is_empty() {
        assert!(matches!(
            parse_source(r#"{"center": {"label": "Me"}}"#),
            Err(ContentError::Empty)
        ));
        assert!(matches!(parse_source("not json"), Err(ContentError::Decode(_))));
    }
}
