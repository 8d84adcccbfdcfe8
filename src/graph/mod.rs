//! Graph model, visibility and layout.

pub mod layout;
pub mod model;
pub mod quadtree;
pub mod types;
pub mod visibility;

pub use layout::{LayoutConfig, LayoutEngine, LayoutMode, NodeRadii, PinPolicy};
pub use model::{BuildReport, BuildWarning, GraphModel};
pub use types::{ContentPayload, ContentSource, Link, Node, NodeKind};
pub use visibility::{Activation, IgnoreReason, VisibilityState};
