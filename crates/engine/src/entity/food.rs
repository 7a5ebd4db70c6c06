//! Food pellet.

use glam::Vec2;

use super::{radius_of_mass, NodeId};

/// A food pellet. Consumed whole by at most one cell per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    pub id: NodeId,
    pub position: Vec2,
    pub mass: f32,
}

impl Food {
    pub fn new(id: NodeId, position: Vec2, mass: f32) -> Self {
        Self { id, position, mass }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        radius_of_mass(self.mass)
    }
}
