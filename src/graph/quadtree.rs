//! Barnes-Hut quadtree for the many-body charge force.
//!
//! Distant groups of bodies are approximated by their center of charge,
//! bringing the charge pass from O(n²) down to O(n log n).

use egui::{Pos2, Vec2};

/// Bodies closer than this are treated as the body itself and skipped
const SELF_EPSILON: f32 = 1e-3;

#[derive(Debug, Default)]
pub enum QuadNode {
    #[default]
    Empty,
    Leaf {
        pos: Pos2,
        charge: f32,
    },
    Internal {
        /// Charge-weighted centroid of every body in the cell
        centroid: Pos2,
        charge: f32,
        count: u32,
        /// NW, NE, SW, SE
        children: Box<[QuadNode; 4]>,
    },
}

/// Square cell extent
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Pos2,
    pub max: Pos2,
}

impl Bounds {
    pub fn new(min: Pos2, max: Pos2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Pos2 {
        self.min + (self.max - self.min) * 0.5
    }

    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    pub fn contains_point(&self, pos: Pos2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// 0=NW, 1=NE, 2=SW, 3=SE
    pub fn quadrant(&self, pos: Pos2) -> usize {
        let c = self.center();
        usize::from(pos.x >= c.x) + 2 * usize::from(pos.y >= c.y)
    }

    pub fn child(&self, quadrant: usize) -> Bounds {
        let c = self.center();
        match quadrant {
            0 => Bounds::new(self.min, c),
            1 => Bounds::new(Pos2::new(c.x, self.min.y), Pos2::new(self.max.x, c.y)),
            2 => Bounds::new(Pos2::new(self.min.x, c.y), Pos2::new(c.x, self.max.y)),
            _ => Bounds::new(c, self.max),
        }
    }
}

pub struct Quadtree {
    pub root: QuadNode,
    pub bounds: Bounds,
    /// Cell width / distance below which a cell is approximated
    pub theta: f32,
}

impl Quadtree {
    /// Build a tree over `(position, charge weight)` pairs
    pub fn build(bodies: &[(Pos2, f32)], theta: f32) -> Self {
        let Some(&(first, _)) = bodies.first() else {
            return Self {
                root: QuadNode::Empty,
                bounds: Bounds::new(Pos2::ZERO, Pos2::ZERO),
                theta,
            };
        };

        let (mut min, mut max) = (first, first);
        for (pos, _) in bodies {
            min = min.min(*pos);
            max = max.max(*pos);
        }

        // Square it up with a little slack so edge bodies land inside
        let size = (max.x - min.x).max(max.y - min.y) + 2.0;
        let min = min - Vec2::splat(1.0);
        let bounds = Bounds::new(min, min + Vec2::splat(size));

        let mut tree = Self {
            root: QuadNode::Empty,
            bounds,
            theta,
        };
        for &(pos, charge) in bodies {
            tree.insert(pos, charge);
        }
        tree
    }

    pub fn insert(&mut self, pos: Pos2, charge: f32) {
        self.root = Self::insert_into(std::mem::take(&mut self.root), pos, charge, self.bounds, 0);
    }

    fn insert_into(node: QuadNode, pos: Pos2, charge: f32, bounds: Bounds, depth: u32) -> QuadNode {
        match node {
            QuadNode::Empty => QuadNode::Leaf { pos, charge },

            QuadNode::Leaf {
                pos: existing,
                charge: existing_charge,
            } => {
                // Coincident bodies would otherwise subdivide forever
                if depth > 48 {
                    return QuadNode::Leaf {
                        pos: existing,
                        charge: existing_charge + charge,
                    };
                }

                // Push the resident body down one level, then insert as usual
                let mut children: Box<[QuadNode; 4]> = Box::default();
                children[bounds.quadrant(existing)] = QuadNode::Leaf {
                    pos: existing,
                    charge: existing_charge,
                };
                let split = QuadNode::Internal {
                    centroid: existing,
                    charge: existing_charge,
                    count: 1,
                    children,
                };
                Self::insert_into(split, pos, charge, bounds, depth)
            }

            QuadNode::Internal {
                centroid,
                charge: total,
                count,
                mut children,
            } => {
                let q = bounds.quadrant(pos);
                children[q] = Self::insert_into(
                    std::mem::take(&mut children[q]),
                    pos,
                    charge,
                    bounds.child(q),
                    depth + 1,
                );

                let new_total = total + charge;
                let centroid = if new_total.abs() > f32::EPSILON {
                    Pos2::new(
                        (centroid.x * total + pos.x * charge) / new_total,
                        (centroid.y * total + pos.y * charge) / new_total,
                    )
                } else {
                    centroid
                };

                QuadNode::Internal {
                    centroid,
                    charge: new_total,
                    count: count + 1,
                    children,
                }
            }
        }
    }

    pub fn len(&self) -> u32 {
        match &self.root {
            QuadNode::Empty => 0,
            QuadNode::Leaf { .. } => 1,
            QuadNode::Internal { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Velocity change on a body at `pos` from every other body.
    ///
    /// Each contribution is `delta * strength * weight / d²`, where `delta`
    /// points from `pos` toward the other body, so a negative `strength`
    /// pushes bodies apart. `d²` is clamped to `min_distance²`.
    pub fn velocity_delta(&self, pos: Pos2, strength: f32, min_distance: f32) -> Vec2 {
        self.accumulate(&self.root, pos, strength, min_distance * min_distance, self.bounds)
    }

    fn accumulate(
        &self,
        node: &QuadNode,
        pos: Pos2,
        strength: f32,
        min_distance_sq: f32,
        bounds: Bounds,
    ) -> Vec2 {
        match node {
            QuadNode::Empty => Vec2::ZERO,

            QuadNode::Leaf { pos: body, charge } => {
                let delta = *body - pos;
                let dist_sq = delta.length_sq();
                if dist_sq < SELF_EPSILON * SELF_EPSILON {
                    return Vec2::ZERO;
                }
                delta * (strength * charge / dist_sq.max(min_distance_sq))
            }

            QuadNode::Internal {
                centroid,
                charge,
                children,
                ..
            } => {
                let delta = *centroid - pos;
                let dist_sq = delta.length_sq();

                // Far enough away, and not our own cell: treat it as one body
                let width = bounds.width();
                if !bounds.contains_point(pos) && width * width < self.theta * self.theta * dist_sq {
                    return delta * (strength * charge / dist_sq.max(min_distance_sq));
                }

                children
                    .iter()
                    .enumerate()
                    .map(|(q, child)| {
                        self.accumulate(child, pos, strength, min_distance_sq, bounds.child(q))
                    })
                    .fold(Vec2::ZERO, |acc, v| acc + v)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_body() {
        let bodies = vec![
            (Pos2::new(0.0, 0.0), 1.0),
            (Pos2::new(100.0, 0.0), 1.0),
            (Pos2::new(0.0, 100.0), 1.0),
            (Pos2::new(100.0, 100.0), 1.0),
        ];
        let tree = Quadtree::build(&bodies, 0.9);
        assert_eq!(tree.len(), 4);
        assert!(matches!(tree.root, QuadNode::Internal { count: 4, .. }));
    }

    #[test]
    fn negative_strength_repels() {
        let bodies = vec![(Pos2::new(0.0, 0.0), 1.0), (Pos2::new(100.0, 0.0), 1.0)];
        let tree = Quadtree::build(&bodies, 0.9);

        let dv = tree.velocity_delta(Pos2::new(0.0, 0.0), -400.0, 1.0);
        assert!(dv.x < 0.0, "should be pushed left: {dv:?}");
        assert!((dv.x + 4.0).abs() < 1e-3, "expected -400/100, got {dv:?}");
    }

    #[test]
    fn approximation_close_to_exact_for_distant_cluster() {
        let mut bodies: Vec<(Pos2, f32)> = (0..16)
            .map(|i| (Pos2::new(1000.0 + (i % 4) as f32, 1000.0 + (i / 4) as f32), 1.0))
            .collect();
        bodies.push((Pos2::ZERO, 1.0));

        let exact: Vec2 = bodies[..16]
            .iter()
            .map(|(p, _)| {
                let d = *p - Pos2::ZERO;
                d * (-30.0 / d.length_sq())
            })
            .fold(Vec2::ZERO, |a, b| a + b);
        let approx = Quadtree::build(&bodies, 0.9).velocity_delta(Pos2::ZERO, -30.0, 1.0);
        assert!((exact - approx).length() < exact.length() * 0.05);
    }

    #[test]
    fn empty_tree_has_no_effect() {
        let tree = Quadtree::build(&[], 0.9);
        assert!(tree.is_empty());
        assert_eq!(tree.velocity_delta(Pos2::new(5.0, 5.0), -400.0, 1.0), Vec2::ZERO);
    }
}
