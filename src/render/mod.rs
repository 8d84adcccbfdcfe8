//! Drawing surface abstraction and per-frame draw lists.
//!
//! The engine produces an owned [`FrameSnapshot`]; [`render_frame`] walks it
//! and issues draw calls to any [`Renderer`] backend.

pub mod painter;

use crate::graph::NodeKind;
use egui::{Pos2, Vec2};

pub use painter::EguiRenderer;

/// A line between two visible nodes, in screen space
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSprite {
    pub from: Pos2,
    pub to: Pos2,
    /// Fades in with the child node
    pub opacity: f32,
}

/// A node ready to draw, in screen space
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSprite {
    pub id: String,
    pub kind: NodeKind,
    pub center: Pos2,
    /// Drawn radius after animation and hover scaling
    pub radius: f32,
    pub label: String,
    /// `+` for collapsed categories, `−` for expanded ones
    pub glyph: Option<char>,
    pub hovered: bool,
    /// Leaf whose detail card is open
    pub selected: bool,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub viewport: Vec2,
    pub pan: Vec2,
    pub links: Vec<LinkSprite>,
    /// In draw order; later nodes are drawn on top
    pub nodes: Vec<NodeSprite>,
}

pub trait Renderer {
    fn clear(&mut self, viewport: Vec2);
    fn draw_link(&mut self, link: &LinkSprite);
    fn draw_node(&mut self, node: &NodeSprite);
}

/// Draw links first so nodes always sit on top of them
pub fn render_frame<R: Renderer + ?Sized>(snapshot: &FrameSnapshot, renderer: &mut R) {
    renderer.clear(snapshot.viewport);
    for link in &snapshot.links {
        renderer.draw_link(link);
    }
    for node in &snapshot.nodes {
        renderer.draw_node(node);
    }
}

/// Shorten `s` to `max_chars` characters, marking the cut with "..."
pub fn truncate_label(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
