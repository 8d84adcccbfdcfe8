//! Error types for the engine and content loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The canvas has no usable area to draw on
    #[error("drawing surface unavailable: viewport is {width}x{height}")]
    SurfaceUnavailable { width: f32, height: f32 },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("remote content source is not configured")]
    NotConfigured,

    #[error("content request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content source returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to decode content: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("content source returned no nodes")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
