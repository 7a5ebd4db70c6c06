//! Virus.

use glam::Vec2;

use super::{radius_of_mass, NodeId};

/// A virus. Pops any cell at least as large as itself on contact and is
/// consumed in the process; smaller cells pass over it untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Virus {
    pub id: NodeId,
    pub position: Vec2,
    pub mass: f32,
}

impl Virus {
    pub fn new(id: NodeId, position: Vec2, mass: f32) -> Self {
        Self { id, position, mass }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        radius_of_mass(self.mass)
    }
}
