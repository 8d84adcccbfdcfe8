//! Content loading: remote CMS first, bundled dataset as fallback.

pub mod bundled;
pub mod remote;

pub use remote::SanityClient;

use crate::error::ContentError;
use crate::graph::types::ContentSource;
use crate::settings::ContentSettings;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;

/// Where the loaded content came from
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOrigin {
    Remote,
    /// Bundled data. `reason` is set when a remote fetch was attempted and failed.
    Bundled { reason: Option<String> },
    File(PathBuf),
}

impl ContentOrigin {
    /// True when the user should be told they are seeing offline content
    pub fn is_fallback(&self) -> bool {
        matches!(self, ContentOrigin::Bundled { reason: Some(_) })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentOrigin::Remote => "remote",
            ContentOrigin::Bundled { .. } => "bundled",
            ContentOrigin::File(_) => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub source: ContentSource,
    pub origin: ContentOrigin,
}

#[derive(Debug, Clone)]
pub enum ContentRequest {
    /// Remote if configured, bundled otherwise or on failure
    Auto(ContentSettings),
    BundledOnly,
    File(PathBuf),
}

fn bundled(reason: Option<String>) -> Result<LoadedContent, ContentError> {
    Ok(LoadedContent {
        source: bundled::bundled_source()?,
        origin: ContentOrigin::Bundled { reason },
    })
}

/// Load content synchronously. Remote failures fall back to the bundled
/// dataset; only an unreadable local file or a broken bundle is an error.
pub fn load_content(request: &ContentRequest) -> Result<LoadedContent, ContentError> {
    match request {
        ContentRequest::BundledOnly => bundled(None),
        ContentRequest::File(path) => Ok(LoadedContent {
            source: bundled::load_file(path)?,
            origin: ContentOrigin::File(path.clone()),
        }),
        ContentRequest::Auto(settings) => {
            let fetched = SanityClient::new(settings).and_then(|client| client.fetch());
            match fetched {
                Ok(source) => Ok(LoadedContent {
                    source,
                    origin: ContentOrigin::Remote,
                }),
                Err(ContentError::NotConfigured) => {
                    tracing::debug!("remote content not configured, using bundled content");
                    bundled(None)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote content unavailable, using offline content");
                    bundled(Some(e.to_string()))
                }
            }
        }
    }
}

/// Load content on a background thread
pub fn spawn_load(request: ContentRequest) -> Receiver<Result<LoadedContent, String>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let start = Instant::now();
        let result = load_content(&request).map_err(|e| e.to_string());
        match &result {
            Ok(loaded) => tracing::info!(
                origin = loaded.origin.label(),
                categories = loaded.source.categories.len(),
                leaves = loaded.source.leaves.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "content loaded"
            ),
            Err(e) => tracing::error!(error = %e, "content load failed"),
        }
        let _ = tx.send(result);
    });

    rx
}
