//! Player record.

use glam::Vec2;

use super::{NodeId, PlayerId};
use crate::sync::PeerId;

/// Who steers a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    /// The participant running this process.
    Local,
    /// A remote Observer, identified by its transport peer id.
    Peer(PeerId),
    /// A scripted opponent.
    Bot,
}

/// A participant in the arena. Holds ids of its cells, never the cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Owned cells, in creation order.
    pub cells: Vec<NodeId>,
    /// Movement target; `None` while floating.
    pub target: Option<Vec2>,
    pub controller: Controller,
    /// Observer-chosen spawn ticket (0 when not spawned by a request).
    pub ticket: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, controller: Controller) -> Self {
        Self {
            id,
            name,
            cells: Vec::new(),
            target: None,
            controller,
            ticket: 0,
        }
    }

    /// A player with no cells is dead.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.cells.is_empty()
    }

    /// Name shown on the leaderboard.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "An unnamed cell"
        } else {
            &self.name
        }
    }
}
