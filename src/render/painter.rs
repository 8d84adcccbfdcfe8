//! [`Renderer`] backend that paints onto an egui canvas.

use super::{LinkSprite, NodeSprite, Renderer};
use crate::graph::NodeKind;
use crate::theme;
use egui::{Align2, FontId, Painter, Rect, Stroke, Vec2};

/// Paints sprites into `rect`. Sprite coordinates are relative to `rect.min`.
pub struct EguiRenderer<'a> {
    painter: &'a Painter,
    rect: Rect,
}

impl<'a> EguiRenderer<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self { painter, rect }
    }
}

impl Renderer for EguiRenderer<'_> {
    fn clear(&mut self, _viewport: Vec2) {
        self.painter.rect_filled(self.rect, 0.0, theme::bg::CANVAS);
    }

    fn draw_link(&mut self, link: &LinkSprite) {
        let origin = self.rect.min.to_vec2();
        let color = theme::node::LINK.gamma_multiply(link.opacity.clamp(0.0, 1.0));
        self.painter.line_segment(
            [link.from + origin, link.to + origin],
            Stroke::new(theme::stroke_width::LINK, color),
        );
    }

    fn draw_node(&mut self, node: &NodeSprite) {
        // Mid-animation nodes start at zero size
        if node.radius <= 0.5 {
            return;
        }
        let center = node.center + self.rect.min.to_vec2();
        let fill = theme::node_fill(node.kind);

        let outline = if node.selected {
            theme::stroke(theme::state::SELECTED, theme::stroke_width::SELECTED)
        } else if node.hovered {
            theme::stroke(theme::state::HOVER, theme::stroke_width::HOVER)
        } else {
            theme::stroke(theme::node::OUTLINE, theme::stroke_width::NORMAL)
        };

        // Soft halo so nodes read against the links
        self.painter
            .circle_filled(center, node.radius * 1.35, fill.gamma_multiply(0.15));
        self.painter.circle(center, node.radius, fill, outline);

        if let Some(glyph) = node.glyph {
            self.painter.text(
                center,
                Align2::CENTER_CENTER,
                glyph,
                FontId::proportional(node.radius),
                theme::node::GLYPH,
            );
        }

        let label_size = match node.kind {
            NodeKind::Center => 16.0,
            NodeKind::Category => 13.0,
            NodeKind::Leaf => 12.0,
        };
        if node.kind == NodeKind::Center {
            self.painter.text(
                center,
                Align2::CENTER_CENTER,
                &node.label,
                FontId::proportional(label_size),
                theme::node::LABEL,
            );
        } else {
            self.painter.text(
                center + Vec2::new(0.0, node.radius + 4.0),
                Align2::CENTER_TOP,
                &node.label,
                FontId::proportional(label_size),
                theme::node::LABEL,
            );
        }
    }
}
