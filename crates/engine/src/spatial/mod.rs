//! Spatial indexing for the collision broad phase.

mod grid;

pub use grid::{Bounds, GridItem, SpatialGrid};
