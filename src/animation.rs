//! Pop-in animation timing and the frame request policy.

use std::collections::HashMap;

const C1: f32 = 1.70158;
const C3: f32 = C1 + 1.0;

/// Ease-out with a slight overshoot past 1.0 before settling.
///
/// `ease_out_back(0.0) == 0.0` and `ease_out_back(1.0) == 1.0`.
pub fn ease_out_back(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let u = t - 1.0;
    1.0 + C3 * u.powi(3) + C1 * u.powi(2)
}

/// Whether the host should schedule another frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    Continue,
    Idle,
}

impl FrameDecision {
    pub fn is_continue(self) -> bool {
        self == FrameDecision::Continue
    }
}

/// Tracks in-flight node animations against a host-supplied clock.
///
/// Time is in seconds. Entries are dropped once their progress reaches 1,
/// after which the node renders at full scale.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    duration: f64,
    started: HashMap<String, f64>,
    woken: bool,
}

impl AnimationScheduler {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            started: HashMap::new(),
            woken: false,
        }
    }

    /// Begin a pop-in for `id`
    pub fn start(&mut self, id: &str, now: f64) {
        self.started.insert(id.to_string(), now);
        self.woken = true;
    }

    /// Stop tracking nodes that are no longer shown
    pub fn forget(&mut self, id: &str) {
        self.started.remove(id);
    }

    /// Request at least one more frame
    pub fn wake(&mut self) {
        self.woken = true;
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.started.contains_key(id)
    }

    pub fn active(&self) -> usize {
        self.started.len()
    }

    pub fn progress(&self, id: &str, now: f64) -> f32 {
        let Some(&started) = self.started.get(id) else {
            return 1.0;
        };
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - started) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn scale(&self, id: &str, now: f64) -> f32 {
        ease_out_back(self.progress(id, now))
    }

    /// Close out a frame: prune finished animations and decide whether
    /// to keep the loop running.
    pub fn frame(&mut self, now: f64, layout_settled: bool) -> FrameDecision {
        let duration = self.duration;
        self.started
            .retain(|_, &mut started| duration > 0.0 && now - started < duration);

        let woken = std::mem::take(&mut self.woken);
        if woken || !layout_settled || !self.started.is_empty() {
            FrameDecision::Continue
        } else {
            FrameDecision::Idle
        }
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(0.8)
    }
}
