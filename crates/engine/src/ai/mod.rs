//! Scripted opponents and the headless autopilot.

mod autopilot;
mod bot;
pub mod policy;

pub use autopilot::Autopilot;
pub use bot::{Bot, BotManager, BotTier};
