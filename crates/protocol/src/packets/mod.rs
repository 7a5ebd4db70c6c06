//! Message catalogue for the sync protocol.
//!
//! Observers send [`Intent`]s to the Authority; the Authority fans
//! [`StateBroadcast`]s out to every Observer.

mod broadcast;
mod intent;

pub use broadcast::*;
pub use intent::*;

/// Upper bound on any collection inside a single message.
pub const MAX_RECORDS: u32 = 1 << 16;

/// Opcodes for observer -> authority messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOpcode {
    /// Ask the Authority to create a player.
    SpawnRequest = 0x00,
    /// Movement target for this tick.
    Move = 0x10,
    /// Split trigger.
    Split = 0x11,
    /// Explicit "no input this tick".
    Floating = 0x12,
}

/// Opcodes for authority -> observer messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOpcode {
    /// Full world snapshot.
    State = 0x20,
}
