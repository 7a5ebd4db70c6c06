//! Game entities.
//!
//! Plain records with derived accessors; all behaviour lives in
//! [`crate::dynamics`] and [`crate::collision`].

mod cell;
mod food;
mod player;
mod virus;

pub use cell::{radius_of_mass, BoostData, Cell, MASS_SCALE};
pub use food::Food;
pub use player::{Controller, Player};
pub use virus::Virus;

use glam::Vec2;

/// Stable id of any body in the world (cells, food and viruses share one space).
pub type NodeId = u32;
/// Stable id of a player. Allocation order is creation order.
pub type PlayerId = u32;

/// Collision categories, in resolution priority order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyKind {
    Cell = 0,
    Food = 1,
    Virus = 2,
}

/// A borrowed view of any body, dispatched by variant.
#[derive(Debug, Clone, Copy)]
pub enum BodyRef<'a> {
    Cell(&'a Cell),
    Food(&'a Food),
    Virus(&'a Virus),
}

impl BodyRef<'_> {
    #[inline]
    pub fn id(&self) -> NodeId {
        match self {
            BodyRef::Cell(c) => c.id,
            BodyRef::Food(f) => f.id,
            BodyRef::Virus(v) => v.id,
        }
    }

    #[inline]
    pub fn kind(&self) -> BodyKind {
        match self {
            BodyRef::Cell(_) => BodyKind::Cell,
            BodyRef::Food(_) => BodyKind::Food,
            BodyRef::Virus(_) => BodyKind::Virus,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        match self {
            BodyRef::Cell(c) => c.position,
            BodyRef::Food(f) => f.position,
            BodyRef::Virus(v) => v.position,
        }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        match self {
            BodyRef::Cell(c) => c.mass(),
            BodyRef::Food(f) => f.mass,
            BodyRef::Virus(v) => v.mass,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        radius_of_mass(self.mass())
    }
}
