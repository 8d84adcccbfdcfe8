//! Cognitive Synapse: an interactive, progressively revealed portfolio graph.
//!
//! A center node expands into categories, categories into leaves, and
//! leaves open a detail card. The engine is renderer-agnostic; the
//! `cognitive-synapse` binary paints it with egui.

pub mod animation;
pub mod content;
pub mod engine;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod render;
pub mod settings;
pub mod theme;

pub use engine::{EngineConfig, EngineEvent, SynapseEngine};
pub use error::{ContentError, EngineError};
pub use settings::Settings;
