//! Player cell.

use glam::Vec2;

use super::{NodeId, PlayerId};

/// Radius is `sqrt(MASS_SCALE * mass)`.
pub const MASS_SCALE: f32 = 100.0;

/// Radius of a body of the given mass. Strictly increasing in mass.
#[inline]
pub fn radius_of_mass(mass: f32) -> f32 {
    (MASS_SCALE * mass).sqrt()
}

/// Split launch state: the cell travels `distance` more units along
/// `direction`, covering a tenth of what remains each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostData {
    pub distance: f32,
    pub direction: Vec2,
}

/// One mass-bearing circular body owned by a player.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: NodeId,
    pub owner: PlayerId,
    pub position: Vec2,
    mass: f32,
    /// Drift carried between ticks; decays while the owner floats.
    pub velocity: Vec2,
    pub boost: Option<BoostData>,
    /// Ticks left before this cell may merge with a sibling.
    pub merge_lock: u32,
}

impl Cell {
    pub fn new(id: NodeId, owner: PlayerId, position: Vec2, mass: f32) -> Self {
        assert_valid_mass(mass);
        Self {
            id,
            owner,
            position,
            mass,
            velocity: Vec2::ZERO,
            boost: None,
            merge_lock: 0,
        }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        radius_of_mass(self.mass)
    }

    /// Replace the mass. A non-positive or non-finite mass is a defect in
    /// the caller, never a runtime condition.
    #[inline]
    pub fn set_mass(&mut self, mass: f32) {
        assert_valid_mass(mass);
        self.mass = mass;
    }

    #[inline]
    pub fn is_merge_locked(&self) -> bool {
        self.merge_lock > 0
    }

    /// Count the merge lock down by one tick.
    #[inline]
    pub fn tick_merge_lock(&mut self) {
        self.merge_lock = self.merge_lock.saturating_sub(1);
    }

    /// Launch the cell along `direction` (normalised here).
    pub fn set_boost(&mut self, distance: f32, direction: Vec2) {
        let direction = direction.try_normalize().unwrap_or(Vec2::Y);
        self.boost = Some(BoostData {
            distance,
            direction,
        });
    }

    /// Advance boost movement. Returns true while the cell is still boosting.
    pub fn update_boost(&mut self) -> bool {
        let Some(boost) = self.boost.as_mut() else {
            return false;
        };
        if boost.distance < 1.0 {
            self.boost = None;
            return false;
        }
        let step = boost.distance / 10.0;
        boost.distance -= step;
        self.position += boost.direction * step;
        true
    }

    /// Clamp the centre so the whole cell stays inside the border.
    #[inline]
    pub fn check_border(&mut self, min: Vec2, max: Vec2) {
        let r = self.radius().min((max.x - min.x) / 2.0).min((max.y - min.y) / 2.0);
        self.position.x = self.position.x.clamp(min.x + r, max.x - r);
        self.position.y = self.position.y.clamp(min.y + r, max.y - r);
    }
}

#[inline]
fn assert_valid_mass(mass: f32) {
    assert!(
        mass.is_finite() && mass > 0.0,
        "cell mass must be positive and finite, got {mass}"
    );
}
