//! Arena simulation and synchronization engine.
//!
//! One [`SessionController`] per participant: Solo runs the world locally,
//! the Authority runs it and broadcasts snapshots, Observers mirror those
//! snapshots and send intents back.

pub mod ai;
pub mod collision;
pub mod config;
pub mod dynamics;
pub mod entity;
pub mod error;
pub mod leaderboard;
pub mod movement;
pub mod net;
pub mod runtime;
pub mod session;
pub mod spatial;
pub mod spawn;
pub mod sync;
pub mod world;

// Re-export commonly used types
pub use ai::Autopilot;
pub use config::Config;
pub use error::{EngineError, Result};
pub use net::{HostTransport, JoinTransport};
pub use runtime::{run_session, InputSource, OutputSink};
pub use session::{FrameInput, Phase, Role, SessionController, SessionRole, SessionSummary, TickOutput};
pub use sync::{link, LocalHub};
pub use world::World;
