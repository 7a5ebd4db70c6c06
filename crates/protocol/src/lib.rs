//! Shared protocol crate for the arena.
//!
//! This crate contains:
//! - Binary reading/writing utilities
//! - The sync message catalogue (intents and state broadcasts)
//! - Shared types (Position)

mod binary;
mod error;
pub mod packets;

pub use binary::{BinaryReader, BinaryWriter};
pub use error::ProtocolError;
pub use packets::{CellRecord, Intent, PelletRecord, PlayerRecord, RankRecord, StateBroadcast};

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;
