//! Node placement for the visible subgraph.
//!
//! Two strategies share one set of bodies:
//! - Radial: deterministic rings around the center and around each parent
//! - Force: velocity integration with link springs, many-body
//!   charge (Barnes-Hut), centering and collision, cooled by `alpha`
//!
//! Pins override both strategies while a node is dragged (and afterwards,
//! under [`PinPolicy::Sticky`]).

use super::model::GraphModel;
use super::quadtree::Quadtree;
use super::types::{Node, NodeKind};
use egui::{Pos2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    Radial,
    #[default]
    Force,
}

impl LayoutMode {
    pub fn label(&self) -> &'static str {
        match self {
            LayoutMode::Radial => "Radial",
            LayoutMode::Force => "Force",
        }
    }
}

/// What happens to a dragged node's pin on release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinPolicy {
    /// The node stays where it was dropped
    Sticky,
    /// The pin is released and the node returns to layout control
    #[default]
    Elastic,
}

impl PinPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            PinPolicy::Sticky => "Stay where dropped",
            PinPolicy::Elastic => "Spring back",
        }
    }
}

/// Drawn radius per node kind, before animation scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRadii {
    pub center: f32,
    pub category: f32,
    pub leaf: f32,
}

impl Default for NodeRadii {
    fn default() -> Self {
        Self {
            center: 30.0,
            category: 20.0,
            leaf: 15.0,
        }
    }
}

impl NodeRadii {
    pub fn radius(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Center => self.center,
            NodeKind::Category => self.category,
            NodeKind::Leaf => self.leaf,
        }
    }
}

/// Ring distances for the radial strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialParams {
    /// Distance of the center's children from the center
    pub first_ring: f32,
    /// Distance of deeper nodes from their parent
    pub outer_ring: f32,
}

impl Default for RadialParams {
    fn default() -> Self {
        Self {
            first_ring: 150.0,
            outer_ring: 120.0,
        }
    }
}

/// Force simulation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Rest length of parent-child springs
    pub link_distance: f32,
    /// Many-body strength (negative repels)
    pub charge: f32,
    /// Barnes-Hut accuracy
    pub theta: f32,
    /// Clamp for the charge kernel distance
    pub min_distance: f32,
    /// Collision radius as a multiple of the drawn radius
    pub collide_scale: f32,
    /// Fraction of velocity kept each tick
    pub velocity_decay: f32,
    /// Per-tick factor applied to `alpha - alpha_target`
    pub alpha_decay: f32,
    /// Below this (with no target) the simulation is settled
    pub alpha_min: f32,
    /// Alpha after the visible set changes
    pub reheat_alpha: f32,
    /// Alpha after a viewport resize
    pub resize_alpha: f32,
    /// Alpha target held while a node is dragged
    pub drag_alpha_target: f32,
    /// Max offset of a newly revealed node from its parent
    pub spawn_jitter: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 150.0,
            charge: -400.0,
            theta: 0.9,
            min_distance: 1.0,
            collide_scale: 1.5,
            velocity_decay: 0.6,
            alpha_decay: 0.98,
            alpha_min: 0.001,
            reheat_alpha: 0.5,
            resize_alpha: 0.3,
            drag_alpha_target: 0.3,
            spawn_jitter: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub pin_policy: PinPolicy,
    pub radii: NodeRadii,
    pub radial: RadialParams,
    pub force: ForceParams,
    /// Seed for spawn jitter, so runs are reproducible
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            pin_policy: PinPolicy::default(),
            radii: NodeRadii::default(),
            radial: RadialParams::default(),
            force: ForceParams::default(),
            seed: 0x5eed,
        }
    }
}

/// Mutable per-node layout state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Pos2,
    pub vel: Vec2,
    pub pin: Option<Pos2>,
    pub radius: f32,
}

/// Where a visible node sits in the tree
#[derive(Debug, Clone)]
struct Slot {
    id: String,
    parent: Option<usize>,
    sibling: usize,
    siblings: usize,
    depth: usize,
}

pub struct LayoutEngine {
    config: LayoutConfig,
    viewport: Vec2,
    /// Visible nodes in model order, aligned with `bodies`
    slots: Vec<Slot>,
    bodies: Vec<Body>,
    index: HashMap<String, usize>,
    links: Vec<(usize, usize)>,
    alpha: f32,
    alpha_target: f32,
    dragging: Option<String>,
    rng: StdRng,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, viewport: Vec2) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            viewport,
            slots: Vec::new(),
            bodies: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            dragging: None,
            rng,
        }
    }

    pub fn mode(&self) -> LayoutMode {
        self.config.mode
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn viewport_center(&self) -> Pos2 {
        (self.viewport * 0.5).to_pos2()
    }

    pub fn body(&self, id: &str) -> Option<&Body> {
        self.index.get(id).map(|&i| &self.bodies[i])
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.body(id).map(|b| b.pos)
    }

    /// Bodies of visible nodes in model order
    pub fn bodies(&self) -> impl Iterator<Item = (&str, &Body)> + '_ {
        self.slots
            .iter()
            .zip(&self.bodies)
            .map(|(slot, body)| (slot.id.as_str(), body))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Match the body set to the visible nodes.
    ///
    /// Surviving bodies keep their state. New ones start next to their
    /// parent. Returns whether the set changed.
    pub fn sync(&mut self, model: &GraphModel, visible: &[&Node]) -> bool {
        let index: HashMap<String, usize> = visible
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let changed = index.len() != self.index.len()
            || index.keys().any(|id| !self.index.contains_key(id));

        let slots: Vec<Slot> = visible
            .iter()
            .map(|node| {
                let (sibling, siblings) = model.sibling_index(&node.id).unwrap_or((0, 1));
                Slot {
                    id: node.id.clone(),
                    parent: node.parent_id.as_ref().and_then(|p| index.get(p).copied()),
                    sibling,
                    siblings,
                    depth: model.depth(&node.id).unwrap_or(0),
                }
            })
            .collect();

        // Parents before children so spawn positions can be derived
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by_key(|&i| slots[i].depth);

        let mut bodies: Vec<Option<Body>> = vec![None; slots.len()];
        for i in order {
            let existing = self.body(&slots[i].id).copied();
            let body = match existing {
                Some(body) => body,
                None => {
                    let anchor = slots[i]
                        .parent
                        .and_then(|p| bodies[p].map(|b| b.pos))
                        .unwrap_or_else(|| self.viewport_center());
                    let jitter = self.jitter();
                    Body {
                        pos: anchor + jitter,
                        vel: Vec2::ZERO,
                        pin: None,
                        radius: self.config.radii.radius(visible[i].kind),
                    }
                }
            };
            bodies[i] = Some(body);
        }

        self.bodies = bodies.into_iter().flatten().collect();
        self.links = slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.parent.map(|p| (p, i)))
            .collect();
        self.slots = slots;
        self.index = index;

        if self
            .dragging
            .as_ref()
            .is_some_and(|id| !self.index.contains_key(id))
        {
            self.dragging = None;
            self.alpha_target = 0.0;
        }

        match self.config.mode {
            LayoutMode::Radial => self.apply_radial(),
            LayoutMode::Force if changed => self.reheat(self.config.force.reheat_alpha),
            LayoutMode::Force => {}
        }

        changed
    }

    fn jitter(&mut self) -> Vec2 {
        let j = self.config.force.spawn_jitter;
        if j <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.rng.gen_range(-j..=j), self.rng.gen_range(-j..=j))
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if self.config.mode == mode {
            return;
        }
        tracing::info!(mode = mode.label(), "switching layout mode");
        self.config.mode = mode;
        match mode {
            LayoutMode::Radial => self.apply_radial(),
            LayoutMode::Force => {
                for body in &mut self.bodies {
                    body.vel = Vec2::ZERO;
                }
                self.reheat(1.0);
            }
        }
    }

    pub fn set_pin_policy(&mut self, policy: PinPolicy) {
        self.config.pin_policy = policy;
    }

    /// Replace the force constants, keeping the current arrangement
    pub fn set_force_params(&mut self, force: ForceParams) {
        self.config.force = force;
        if self.config.mode == LayoutMode::Force {
            self.reheat(force.reheat_alpha);
        }
    }

    /// Move the layout center with the viewport, keeping relative positions
    pub fn set_viewport(&mut self, viewport: Vec2) {
        let shift = (viewport - self.viewport) * 0.5;
        self.viewport = viewport;
        for body in &mut self.bodies {
            body.pos += shift;
            if let Some(pin) = body.pin.as_mut() {
                *pin += shift;
            }
        }
        match self.config.mode {
            LayoutMode::Radial => self.apply_radial(),
            LayoutMode::Force => self.reheat(self.config.force.resize_alpha),
        }
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub fn is_settled(&self) -> bool {
        match self.config.mode {
            LayoutMode::Radial => true,
            LayoutMode::Force => {
                self.bodies.is_empty()
                    || (self.alpha_target <= 0.0 && self.alpha < self.config.force.alpha_min)
            }
        }
    }

    /// Advance one frame. Returns true if anything moved.
    pub fn tick(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.step_force();
        true
    }

    /// Pin `id` at its current position and keep the simulation warm
    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.pin = Some(body.pos);
        self.dragging = Some(id.to_string());
        if self.config.mode == LayoutMode::Force {
            self.alpha_target = self.config.force.drag_alpha_target;
        }
        true
    }

    pub fn drag_to(&mut self, id: &str, pos: Pos2) {
        let Some(&i) = self.index.get(id) else {
            return;
        };
        let body = &mut self.bodies[i];
        body.pin = Some(pos);
        body.pos = pos;
        body.vel = Vec2::ZERO;
        if self.config.mode == LayoutMode::Radial {
            self.apply_radial();
        }
    }

    pub fn end_drag(&mut self, id: &str) {
        self.alpha_target = 0.0;
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
        }
        if self.config.pin_policy == PinPolicy::Elastic {
            if let Some(&i) = self.index.get(id) {
                self.bodies[i].pin = None;
            }
        }
        if self.config.mode == LayoutMode::Radial {
            self.apply_radial();
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Release every pin except the one being dragged
    pub fn clear_pins(&mut self) {
        let dragging = self.dragging.as_ref().and_then(|id| self.index.get(id).copied());
        for (i, body) in self.bodies.iter_mut().enumerate() {
            if Some(i) != dragging {
                body.pin = None;
            }
        }
        match self.config.mode {
            LayoutMode::Radial => self.apply_radial(),
            LayoutMode::Force => self.reheat(self.config.force.reheat_alpha),
        }
    }

    /// Place every body on its ring. O(visible).
    fn apply_radial(&mut self) {
        let center = self.viewport_center();
        let params = self.config.radial;

        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&i| self.slots[i].depth);

        for i in order {
            let slot = &self.slots[i];
            let computed = match slot.parent {
                None => center,
                Some(p) => {
                    let ring = if slot.depth <= 1 {
                        params.first_ring
                    } else {
                        params.outer_ring
                    };
                    let angle = if slot.siblings <= 1 {
                        0.0
                    } else {
                        TAU * slot.sibling as f32 / slot.siblings as f32
                    };
                    self.bodies[p].pos + Vec2::angled(angle) * ring
                }
            };
            let body = &mut self.bodies[i];
            body.pos = body.pin.unwrap_or(computed);
            body.vel = Vec2::ZERO;
        }
    }

    fn step_force(&mut self) {
        let params = self.config.force;
        self.alpha = self.alpha_target + (self.alpha - self.alpha_target) * params.alpha_decay;
        let alpha = self.alpha;
        let n = self.bodies.len();
        if n == 0 {
            return;
        }

        // Link springs, strength and bias from endpoint degree
        let links = self.links.clone();
        let mut degree = vec![0usize; n];
        for &(s, t) in &links {
            degree[s] += 1;
            degree[t] += 1;
        }
        for &(s, t) in &links {
            let strength = 1.0 / degree[s].min(degree[t]).max(1) as f32;
            let bias = degree[s] as f32 / (degree[s] + degree[t]) as f32;
            let (bs, bt) = (self.bodies[s], self.bodies[t]);
            let mut delta = (bt.pos + bt.vel) - (bs.pos + bs.vel);
            if delta.length_sq() == 0.0 {
                delta = self.tiny_jiggle();
            }
            let len = delta.length();
            let k = (len - params.link_distance) / len * alpha * strength;
            let delta = delta * k;
            self.bodies[t].vel -= delta * bias;
            self.bodies[s].vel += delta * (1.0 - bias);
        }

        // Many-body charge
        let charges: Vec<(Pos2, f32)> = self.bodies.iter().map(|b| (b.pos, 1.0)).collect();
        let tree = Quadtree::build(&charges, params.theta);
        for body in &mut self.bodies {
            body.vel += tree.velocity_delta(body.pos, params.charge * alpha, params.min_distance);
        }

        // Collision, weighted so small nodes give way to large ones
        for i in 0..n {
            for j in (i + 1)..n {
                let ri = self.bodies[i].radius * params.collide_scale;
                let rj = self.bodies[j].radius * params.collide_scale;
                let reach = ri + rj;
                let (bi, bj) = (self.bodies[i], self.bodies[j]);
                let mut delta = (bi.pos + bi.vel) - (bj.pos + bj.vel);
                let mut dist_sq = delta.length_sq();
                if dist_sq >= reach * reach {
                    continue;
                }
                if dist_sq == 0.0 {
                    delta = self.tiny_jiggle();
                    dist_sq = delta.length_sq();
                }
                let dist = dist_sq.sqrt();
                let push = delta * ((reach - dist) / dist);
                let share = (rj * rj) / (ri * ri + rj * rj);
                self.bodies[i].vel += push * share;
                self.bodies[j].vel -= push * (1.0 - share);
            }
        }

        // Integrate
        for body in &mut self.bodies {
            if let Some(pin) = body.pin {
                body.pos = pin;
                body.vel = Vec2::ZERO;
            } else {
                body.vel *= params.velocity_decay;
                body.pos += body.vel;
            }
        }

        // Centering: translate free bodies so the centroid sits mid-viewport
        let centroid = self
            .bodies
            .iter()
            .fold(Vec2::ZERO, |acc, b| acc + b.pos.to_vec2())
            / n as f32;
        let shift = self.viewport_center().to_vec2() - centroid;
        for body in self.bodies.iter_mut().filter(|b| b.pin.is_none()) {
            body.pos += shift;
        }

        if self.is_settled() {
            tracing::debug!(bodies = n, "force layout settled");
        }
    }

    fn tiny_jiggle(&mut self) -> Vec2 {
        Vec2::new(
            (self.rng.gen::<f32>() - 0.5) * 1e-3,
            (self.rng.gen::<f32>() - 0.5) * 1e-3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{
        CategoryRecord, CenterRecord, ContentPayload, ContentSource, LeafRecord, ProjectContent,
    };
    use crate::graph::visibility::VisibilityState;

    fn model() -> GraphModel {
        let categories = ["a", "b", "c", "d"]
            .iter()
            .map(|id| CategoryRecord {
                id: id.to_string(),
                label: id.to_string(),
                parent: None,
            })
            .collect();
        let leaves = ["a1", "a2"]
            .iter()
            .map(|id| LeafRecord {
                id: id.to_string(),
                label: id.to_string(),
                parent: "a".into(),
                content: ContentPayload::Project(ProjectContent {
                    title: id.to_string(),
                    ..Default::default()
                }),
            })
            .collect();
        GraphModel::build(&ContentSource {
            center: CenterRecord {
                id: "center".into(),
                label: "Me".into(),
            },
            categories,
            leaves,
        })
        .model
    }

    fn expanded(model: &GraphModel, ids: &[&str]) -> VisibilityState {
        let mut state = VisibilityState::new();
        for id in ids {
            state.activate(model, id);
        }
        state
    }

    fn engine(mode: LayoutMode) -> LayoutEngine {
        LayoutEngine::new(
            LayoutConfig {
                mode,
                ..Default::default()
            },
            Vec2::new(800.0, 600.0),
        )
    }

    fn assert_near(a: Pos2, b: Pos2) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn radial_rings_are_deterministic() {
        let model = model();
        let state = expanded(&model, &["center", "a"]);
        let visible = state.visible_nodes(&model);

        let mut first = engine(LayoutMode::Radial);
        first.sync(&model, &visible);
        let mut second = LayoutEngine::new(
            LayoutConfig {
                mode: LayoutMode::Radial,
                seed: 99,
                ..Default::default()
            },
            Vec2::new(800.0, 600.0),
        );
        second.sync(&model, &visible);

        let center = Pos2::new(400.0, 300.0);
        assert_near(first.position("center").unwrap(), center);
        // Four categories at 90 degree steps on the first ring
        assert_near(first.position("a").unwrap(), center + Vec2::new(150.0, 0.0));
        assert_near(first.position("b").unwrap(), center + Vec2::new(0.0, 150.0));
        assert_near(first.position("c").unwrap(), center + Vec2::new(-150.0, 0.0));
        // Leaves orbit their parent on the outer ring
        assert_near(
            first.position("a2").unwrap(),
            first.position("a").unwrap() + Vec2::new(-120.0, 0.0),
        );

        for (id, body) in first.bodies() {
            assert_near(body.pos, second.position(id).unwrap());
        }
        assert!(first.is_settled());
        assert!(!first.tick());
    }

    #[test]
    fn resize_recenters_radial_layout() {
        let model = model();
        let state = expanded(&model, &["center"]);
        let mut layout = engine(LayoutMode::Radial);
        layout.sync(&model, &state.visible_nodes(&model));
        layout.set_viewport(Vec2::new(1000.0, 1000.0));
        assert_near(layout.position("center").unwrap(), Pos2::new(500.0, 500.0));
        assert_near(layout.position("a").unwrap(), Pos2::new(650.0, 500.0));
    }

    #[test]
    fn force_layout_settles_and_spreads_nodes() {
        let model = model();
        let state = expanded(&model, &["center", "a"]);
        let mut layout = engine(LayoutMode::Force);
        assert!(layout.sync(&model, &state.visible_nodes(&model)));
        assert!(!layout.is_settled());

        let mut ticks = 0;
        while layout.tick() {
            ticks += 1;
            assert!(ticks < 2000, "simulation never settled");
        }
        assert!(layout.is_settled());
        assert!(layout.alpha() < 0.001);

        // Every pair of bodies ends up separated, and positions are finite
        let bodies: Vec<_> = layout.bodies().map(|(_, b)| *b).collect();
        for (i, a) in bodies.iter().enumerate() {
            assert!(a.pos.x.is_finite() && a.pos.y.is_finite());
            for b in &bodies[i + 1..] {
                assert!((a.pos - b.pos).length() > 10.0);
            }
        }
    }

    #[test]
    fn new_nodes_spawn_near_parent_and_reheat() {
        let model = model();
        let mut layout = engine(LayoutMode::Force);
        let mut state = expanded(&model, &["center"]);
        layout.sync(&model, &state.visible_nodes(&model));
        while layout.tick() {}

        state.activate(&model, "a");
        let parent = layout.position("a").unwrap();
        assert!(layout.sync(&model, &state.visible_nodes(&model)));
        assert!(!layout.is_settled());
        let child = layout.position("a1").unwrap();
        assert!((child - parent).length() <= 10.0 * 2f32.sqrt() + 1e-3);

        // Same visible set again is not a change
        assert!(!layout.sync(&model, &state.visible_nodes(&model)));
    }

    #[test]
    fn pinned_node_holds_position_during_simulation() {
        let model = model();
        let state = expanded(&model, &["center"]);
        let mut layout = engine(LayoutMode::Force);
        layout.sync(&model, &state.visible_nodes(&model));

        assert!(layout.begin_drag("b"));
        let target = Pos2::new(50.0, 60.0);
        layout.drag_to("b", target);
        for _ in 0..200 {
            layout.tick();
        }
        assert_near(layout.position("b").unwrap(), target);
        // Drag keeps the simulation warm
        assert!(!layout.is_settled());

        layout.end_drag("b");
        assert!(layout.body("b").unwrap().pin.is_none());
        while layout.tick() {}
        assert!(layout.is_settled());
    }

    #[test]
    fn sticky_policy_keeps_pin_after_release() {
        let model = model();
        let state = expanded(&model, &["center"]);
        let mut layout = LayoutEngine::new(
            LayoutConfig {
                mode: LayoutMode::Radial,
                pin_policy: PinPolicy::Sticky,
                ..Default::default()
            },
            Vec2::new(800.0, 600.0),
        );
        layout.sync(&model, &state.visible_nodes(&model));
        layout.begin_drag("a");
        layout.drag_to("a", Pos2::new(10.0, 10.0));
        layout.end_drag("a");
        assert_near(layout.position("a").unwrap(), Pos2::new(10.0, 10.0));

        layout.clear_pins();
        assert_near(layout.position("a").unwrap(), Pos2::new(550.0, 300.0));
    }

    #[test]
    fn elastic_release_in_radial_mode_snaps_back() {
        let model = model();
        let state = expanded(&model, &["center", "a"]);
        let mut layout = engine(LayoutMode::Radial);
        layout.sync(&model, &state.visible_nodes(&model));
        let home = layout.position("a").unwrap();

        layout.begin_drag("a");
        layout.drag_to("a", Pos2::new(100.0, 100.0));
        // Children follow the dragged parent
        assert_near(layout.position("a1").unwrap(), Pos2::new(220.0, 100.0));
        layout.end_drag("a");
        assert_near(layout.position("a").unwrap(), home);
    }
}
