//! Color palette and stroke widths shared by the canvas and the panels.

use crate::graph::NodeKind;
use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Graph canvas - darkest layer
    pub const CANVAS: Color32 = Color32::from_rgb(10, 12, 20);

    /// Side panel and card backgrounds
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 30);

    /// Elevated surfaces (intro overlay, banners)
    pub const SURFACE: Color32 = Color32::from_rgba_premultiplied(28, 30, 40, 230);
}

/// Accent colors
pub mod accent {
    use super::*;

    pub const INDIGO: Color32 = Color32::from_rgb(99, 102, 241);

    pub const CYAN: Color32 = Color32::from_rgb(6, 182, 212);

    pub const GREEN: Color32 = Color32::from_rgb(34, 197, 94);

    pub const AMBER: Color32 = Color32::from_rgb(245, 158, 11);

    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);

    pub const YELLOW: Color32 = Color32::from_rgb(255, 220, 80);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);
}

/// Node and link colors
pub mod node {
    use super::*;

    pub const CENTER: Color32 = super::accent::INDIGO;
    pub const CATEGORY: Color32 = super::accent::CYAN;
    pub const LEAF: Color32 = super::accent::GREEN;

    /// Outline for resting nodes
    pub const OUTLINE: Color32 = Color32::from_rgb(200, 205, 220);

    pub const LINK: Color32 = Color32::from_rgb(90, 100, 130);

    /// Label drawn under a node
    pub const LABEL: Color32 = super::text::PRIMARY;

    /// Expand/collapse glyph drawn inside categories
    pub const GLYPH: Color32 = Color32::WHITE;
}

/// State colors for interactive elements
pub mod state {
    use super::*;

    pub const HOVER: Color32 = Color32::WHITE;

    /// Leaf whose card is open
    pub const SELECTED: Color32 = super::accent::YELLOW;

    pub const ERROR: Color32 = super::accent::RED;

    pub const WARNING: Color32 = super::accent::AMBER;
}

/// Node rendering stroke widths
pub mod stroke_width {
    pub const NORMAL: f32 = 1.0;

    pub const HOVER: f32 = 2.0;

    pub const SELECTED: f32 = 3.0;

    pub const LINK: f32 = 1.5;
}

/// Fill color for a node kind
pub fn node_fill(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Center => node::CENTER,
        NodeKind::Category => node::CATEGORY,
        NodeKind::Leaf => node::LEAF,
    }
}

/// Create a stroke with consistent styling
pub fn stroke(color: Color32, width: f32) -> egui::Stroke {
    egui::Stroke::new(width, color)
}

/// Pulsing placeholder bar used while content loads
pub fn skeleton_rect(ui: &mut egui::Ui, width: f32, height: f32) {
    const BASE: Color32 = Color32::from_rgb(35, 38, 48);
    const SHIMMER: Color32 = Color32::from_rgb(50, 53, 63);

    let (rect, _) = ui.allocate_exact_size(egui::Vec2::new(width, height), egui::Sense::hover());

    let time = ui.ctx().input(|i| i.time);
    let phase = ((time * 2.0).sin() * 0.5 + 0.5) as f32;
    let color = Color32::from_rgb(
        lerp_u8(BASE.r(), SHIMMER.r(), phase),
        lerp_u8(BASE.g(), SHIMMER.g(), phase),
        lerp_u8(BASE.b(), SHIMMER.b(), phase),
    );

    ui.painter().rect_filled(rect, 4.0, color);
    ui.ctx().request_repaint();
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let result = a as f32 + (b as f32 - a as f32) * t;
    result.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_fill() {
        let fills = [
            node_fill(NodeKind::Center),
            node_fill(NodeKind::Category),
            node_fill(NodeKind::Leaf),
        ];
        assert_ne!(fills[0], fills[1]);
        assert_ne!(fills[1], fills[2]);
        assert_ne!(fills[0], fills[2]);
    }

    #[test]
    fn lerp_hits_endpoints() {
        assert_eq!(lerp_u8(0, 255, 0.0), 0);
        assert_eq!(lerp_u8(0, 255, 1.0), 255);
        assert_eq!(lerp_u8(10, 20, 2.0), 30);
    }
}
