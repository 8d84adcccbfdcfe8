//! The composed graph engine.
//!
//! `SynapseEngine` owns one of each component and wires them together:
//! pointer events go through the interaction controller, clicks become
//! activations, activations change visibility, visibility changes resync
//! the layout and start pop-in animations. The host drives it with
//! `frame(now)` and paints `snapshot(now)` until `frame` reports idle.

use crate::animation::{AnimationScheduler, FrameDecision};
use crate::error::EngineError;
use crate::graph::layout::ForceParams;
use crate::graph::{
    Activation, ContentPayload, GraphModel, LayoutConfig, LayoutEngine, LayoutMode, NodeKind,
    PinPolicy, VisibilityState,
};
use crate::interaction::{CursorHint, Hit, InteractionController, InteractionOutcome, PointerEvent};
use crate::render::{truncate_label, FrameSnapshot, LinkSprite, NodeSprite};
use egui::{Pos2, Vec2};
use std::sync::mpsc::Sender;

/// Everything the engine needs besides the model
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    /// Pop-in duration in seconds
    pub animation_secs: f64,
    pub label_max_chars: usize,
    /// Pointer travel in pixels before a press becomes a drag
    pub drag_threshold: f32,
    /// Radius multiplier for the hovered or dragged node
    pub hover_scale: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            animation_secs: 0.8,
            label_max_chars: 8,
            drag_threshold: 3.0,
            hover_scale: 1.2,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let radii = self.layout.radii;
        if [radii.center, radii.category, radii.leaf]
            .iter()
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(EngineError::InvalidConfig(
                "node radii must be positive".into(),
            ));
        }
        let force = &self.layout.force;
        if !(0.0..1.0).contains(&force.alpha_decay) {
            return Err(EngineError::InvalidConfig(format!(
                "alpha decay must be in [0, 1), got {}",
                force.alpha_decay
            )));
        }
        if !(0.0..=1.0).contains(&force.velocity_decay) {
            return Err(EngineError::InvalidConfig(format!(
                "velocity decay must be in [0, 1], got {}",
                force.velocity_decay
            )));
        }
        if force.alpha_min <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "alpha minimum must be positive".into(),
            ));
        }
        if !self.animation_secs.is_finite() || self.animation_secs < 0.0 {
            return Err(EngineError::InvalidConfig(
                "animation duration must be non-negative".into(),
            ));
        }
        if self.label_max_chars == 0 {
            return Err(EngineError::InvalidConfig(
                "label length must be at least one character".into(),
            ));
        }
        Ok(())
    }
}

/// Notifications for the host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Show the detail card for this leaf, then call `close_card` when dismissed
    LeafActivated { id: String, content: ContentPayload },
    /// First expansion of the center; hide any intro overlay
    IntroDismissed,
    /// The force simulation came to rest
    LayoutSettled,
}

pub struct SynapseEngine {
    model: GraphModel,
    config: EngineConfig,
    viewport: Vec2,
    visibility: VisibilityState,
    layout: LayoutEngine,
    interaction: InteractionController,
    animation: AnimationScheduler,
    events: Sender<EngineEvent>,
    was_settled: bool,
}

fn check_viewport(viewport: Vec2) -> Result<(), EngineError> {
    let usable = viewport.x.is_finite() && viewport.y.is_finite() && viewport.x > 0.0 && viewport.y > 0.0;
    if usable {
        Ok(())
    } else {
        Err(EngineError::SurfaceUnavailable {
            width: viewport.x,
            height: viewport.y,
        })
    }
}

impl SynapseEngine {
    /// Create an engine showing only the center node
    pub fn new(
        model: GraphModel,
        config: EngineConfig,
        viewport: Vec2,
        events: Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        check_viewport(viewport)?;
        config.validate()?;

        let layout = LayoutEngine::new(config.layout.clone(), viewport);
        let mut engine = Self {
            interaction: InteractionController::new(config.drag_threshold),
            animation: AnimationScheduler::new(config.animation_secs),
            visibility: VisibilityState::new(),
            was_settled: layout.is_settled(),
            layout,
            model,
            config,
            viewport,
            events,
        };
        engine.sync_layout();

        tracing::info!(
            nodes = engine.model.len(),
            mode = engine.layout.mode().label(),
            "graph engine ready"
        );
        Ok(engine)
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn pan(&self) -> Vec2 {
        self.interaction.pan()
    }

    pub fn cursor(&self) -> CursorHint {
        self.interaction.cursor()
    }

    /// World position of a visible node
    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.layout.position(id)
    }

    /// Screen position of a visible node, pan applied
    pub fn screen_position(&self, id: &str) -> Option<Pos2> {
        self.layout.position(id).map(|p| self.interaction.to_screen(p))
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn sync_layout(&mut self) {
        let visible = self.visibility.visible_nodes(&self.model);
        self.layout.sync(&self.model, &visible);
    }

    /// Activate a node as if it had been clicked
    pub fn activate(&mut self, id: &str, now: f64) -> Activation {
        let activation = self.visibility.activate(&self.model, id);
        match &activation {
            Activation::CenterOpened { revealed, first } => {
                if *first {
                    self.emit(EngineEvent::IntroDismissed);
                }
                self.reveal(revealed, now);
            }
            Activation::Expanded { revealed, .. } => self.reveal(revealed, now),
            Activation::Collapsed { hidden, .. } => {
                for hidden_id in hidden {
                    self.animation.forget(hidden_id);
                }
                self.sync_layout();
            }
            Activation::ContentRequested { id, content } => {
                tracing::debug!(node = %id, "opening detail card");
                self.emit(EngineEvent::LeafActivated {
                    id: id.clone(),
                    content: content.clone(),
                });
            }
            Activation::Ignored(reason) => {
                tracing::debug!(node = id, ?reason, "activation ignored");
            }
        }
        self.animation.wake();
        activation
    }

    fn reveal(&mut self, revealed: &[String], now: f64) {
        self.sync_layout();
        for id in revealed {
            self.animation.start(id, now);
        }
    }

    /// The host dismissed the detail card
    pub fn close_card(&mut self) -> Option<String> {
        self.animation.wake();
        self.visibility.close_card()
    }

    fn is_emphasized(&self, id: &str) -> bool {
        self.interaction.hovered() == Some(id) || self.layout.dragging() == Some(id)
    }

    /// Drawn radius of a visible node at `now`: pop-in scale plus hover growth
    fn display_radius(&self, id: &str, base: f32, now: f64) -> f32 {
        let hover = if self.is_emphasized(id) {
            self.config.hover_scale
        } else {
            1.0
        };
        base * self.animation.scale(id, now) * hover
    }

    /// Front-most visible node under a canvas position. The hit area is
    /// the drawn disc, so a hovered node accepts presses on its enlarged rim.
    pub fn hit_test(&self, screen: Pos2, now: f64) -> Option<String> {
        let world = self.interaction.to_world(screen);
        let bodies: Vec<_> = self.layout.bodies().collect();
        bodies
            .into_iter()
            .rev()
            .find(|(id, body)| {
                let radius = self.display_radius(id, body.radius, now);
                radius > 0.0 && body.pos.distance(world) <= radius
            })
            .map(|(id, _)| id.to_string())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: f64) -> InteractionOutcome {
        let hit = match event {
            PointerEvent::Down(pos) | PointerEvent::Move(pos) => {
                self.hit_test(pos, now).and_then(|id| {
                    self.layout.position(&id).map(|world| Hit { id, world })
                })
            }
            PointerEvent::Up(_) | PointerEvent::Leave | PointerEvent::Cancel => None,
        };

        let outcome = self.interaction.handle(event, hit);
        match &outcome {
            InteractionOutcome::Click(id) => {
                self.activate(id, now);
            }
            InteractionOutcome::DragStarted { id, world } => {
                self.layout.begin_drag(id);
                self.layout.drag_to(id, *world);
            }
            InteractionOutcome::NodeDragged { id, world } => self.layout.drag_to(id, *world),
            InteractionOutcome::DragEnded { id } => self.layout.end_drag(id),
            InteractionOutcome::Panned(_)
            | InteractionOutcome::HoverChanged(_)
            | InteractionOutcome::None => {}
        }
        if outcome != InteractionOutcome::None {
            self.animation.wake();
        }
        outcome
    }

    pub fn resize(&mut self, viewport: Vec2) -> Result<(), EngineError> {
        check_viewport(viewport)?;
        if viewport != self.viewport {
            self.viewport = viewport;
            self.layout.set_viewport(viewport);
            self.animation.wake();
        }
        Ok(())
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout.set_mode(mode);
        self.animation.wake();
    }

    pub fn set_pin_policy(&mut self, policy: PinPolicy) {
        self.layout.set_pin_policy(policy);
    }

    pub fn set_force_params(&mut self, force: ForceParams) {
        self.layout.set_force_params(force);
        self.animation.wake();
    }

    /// Release every pin and let the layout take over again
    pub fn reset_pins(&mut self) {
        self.layout.clear_pins();
        self.animation.wake();
    }

    /// Return the view to its starting offset
    pub fn reset_view(&mut self) {
        self.interaction.reset_pan();
        self.animation.wake();
    }

    /// Advance one frame: tick the simulation, retire finished animations,
    /// and report whether another frame is needed.
    pub fn frame(&mut self, now: f64) -> FrameDecision {
        self.layout.tick();
        let settled = self.layout.is_settled();
        if settled && !self.was_settled {
            self.emit(EngineEvent::LayoutSettled);
        }
        self.was_settled = settled;
        self.animation.frame(now, settled)
    }

    /// Owned draw list for this instant
    pub fn snapshot(&self, now: f64) -> FrameSnapshot {
        let pan = self.interaction.pan();
        let card = self.visibility.open_card();

        let nodes = self
            .layout
            .bodies()
            .filter_map(|(id, body)| {
                let node = self.model.node(id)?;
                let glyph = (node.kind == NodeKind::Category).then(|| {
                    if self.visibility.is_expanded(id) {
                        '−'
                    } else {
                        '+'
                    }
                });
                Some(NodeSprite {
                    id: id.to_string(),
                    kind: node.kind,
                    center: body.pos + pan,
                    radius: self.display_radius(id, body.radius, now),
                    label: truncate_label(&node.label, self.config.label_max_chars),
                    glyph,
                    hovered: self.is_emphasized(id),
                    selected: card == Some(id),
                })
            })
            .collect();

        let links = self
            .visibility
            .visible_links(&self.model)
            .into_iter()
            .filter_map(|link| {
                let from = self.layout.position(&link.source)?;
                let to = self.layout.position(&link.target)?;
                Some(LinkSprite {
                    from: from + pan,
                    to: to + pan,
                    opacity: self.animation.progress(&link.target, now),
                })
            })
            .collect();

        FrameSnapshot {
            viewport: self.viewport,
            pan,
            links,
            nodes,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
