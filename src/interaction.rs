//! Pointer state machine: click vs drag, node drag, and canvas pan.
//!
//! The controller only knows screen positions and which node (if any) was
//! hit. Hit-testing and world/screen conversion happen in the engine.

use egui::{Pos2, Vec2};

/// Canvas-local pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    Leave,
    Cancel,
}

/// Cursor the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Grab,
    PointingHand,
    Grabbing,
}

/// A node under the pointer, with its world position at hit time
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub world: Pos2,
}

/// What a pointer event meant
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    None,
    /// Press and release without crossing the drag threshold
    Click(String),
    DragStarted { id: String, world: Pos2 },
    /// World position for the dragged node, keeping the original grab offset
    NodeDragged { id: String, world: Pos2 },
    DragEnded { id: String },
    Panned(Vec2),
    HoverChanged(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
enum PointerState {
    Idle,
    PossibleDrag {
        id: String,
        press: Pos2,
        /// Node world position minus pointer world position
        grab_offset: Vec2,
    },
    DraggingNode {
        id: String,
        grab_offset: Vec2,
    },
    Panning {
        start: Pos2,
        pan_at_start: Vec2,
    },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: PointerState,
    pan: Vec2,
    hovered: Option<String>,
    drag_threshold: f32,
}

impl InteractionController {
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            state: PointerState::Idle,
            pan: Vec2::ZERO,
            hovered: None,
            drag_threshold: drag_threshold.max(0.0),
        }
    }

    /// Screen offset applied to every world position
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn cursor(&self) -> CursorHint {
        match &self.state {
            PointerState::DraggingNode { .. } | PointerState::Panning { .. } => {
                CursorHint::Grabbing
            }
            PointerState::PossibleDrag { .. } => CursorHint::PointingHand,
            PointerState::Idle if self.hovered.is_some() => CursorHint::PointingHand,
            PointerState::Idle => CursorHint::Grab,
        }
    }

    pub fn to_world(&self, screen: Pos2) -> Pos2 {
        screen - self.pan
    }

    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        world + self.pan
    }

    /// Feed one event. `hit` is the front-most node under the event
    /// position, when the event has one.
    pub fn handle(&mut self, event: PointerEvent, hit: Option<Hit>) -> InteractionOutcome {
        match event {
            PointerEvent::Down(pos) => self.pointer_down(pos, hit),
            PointerEvent::Move(pos) => self.pointer_move(pos, hit),
            PointerEvent::Up(_) => self.release(true),
            PointerEvent::Leave => {
                let outcome = self.release(false);
                if outcome == InteractionOutcome::None && self.hovered.take().is_some() {
                    return InteractionOutcome::HoverChanged(None);
                }
                self.hovered = None;
                outcome
            }
            PointerEvent::Cancel => self.release(false),
        }
    }

    fn pointer_down(&mut self, pos: Pos2, hit: Option<Hit>) -> InteractionOutcome {
        self.state = match hit {
            Some(hit) => PointerState::PossibleDrag {
                grab_offset: hit.world - self.to_world(pos),
                id: hit.id,
                press: pos,
            },
            None => PointerState::Panning {
                start: pos,
                pan_at_start: self.pan,
            },
        };
        InteractionOutcome::None
    }

    fn pointer_move(&mut self, pos: Pos2, hit: Option<Hit>) -> InteractionOutcome {
        match &self.state {
            PointerState::Idle => {
                let hovered = hit.map(|h| h.id);
                if hovered != self.hovered {
                    self.hovered = hovered.clone();
                    InteractionOutcome::HoverChanged(hovered)
                } else {
                    InteractionOutcome::None
                }
            }
            PointerState::PossibleDrag {
                id,
                press,
                grab_offset,
            } => {
                if (pos - *press).length() <= self.drag_threshold {
                    return InteractionOutcome::None;
                }
                let id = id.clone();
                let grab_offset = *grab_offset;
                let world = self.to_world(pos) + grab_offset;
                self.state = PointerState::DraggingNode {
                    id: id.clone(),
                    grab_offset,
                };
                InteractionOutcome::DragStarted { id, world }
            }
            PointerState::DraggingNode { id, grab_offset } => InteractionOutcome::NodeDragged {
                id: id.clone(),
                world: self.to_world(pos) + *grab_offset,
            },
            PointerState::Panning {
                start,
                pan_at_start,
            } => {
                self.pan = *pan_at_start + (pos - *start);
                InteractionOutcome::Panned(self.pan)
            }
        }
    }

    /// End whatever gesture is in progress. Only a real button release on
    /// an undragged node counts as a click.
    fn release(&mut self, is_up: bool) -> InteractionOutcome {
        match std::mem::replace(&mut self.state, PointerState::Idle) {
            PointerState::PossibleDrag { id, .. } if is_up => InteractionOutcome::Click(id),
            PointerState::DraggingNode { id, .. } => InteractionOutcome::DragEnded { id },
            _ => InteractionOutcome::None,
        }
    }

    /// Forget the pan offset
    pub fn reset_pan(&mut self) {
        self.pan = Vec2::ZERO;
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(3.0)
    }
}
