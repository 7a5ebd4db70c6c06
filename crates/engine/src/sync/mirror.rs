//! Observer-side view of the Authority's world.

use glam::Vec2;
use protocol::{RankRecord, StateBroadcast};
use tracing::debug;

use crate::entity::{radius_of_mass, PlayerId};
use crate::movement;
use crate::world::WorldBorder;

/// Effect of applying one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorUpdate {
    /// Tick not newer than the last applied one; dropped.
    Stale,
    Applied,
    /// Our spawn request was honoured; this is our player.
    Confirmed(PlayerId),
    /// Our confirmed player is gone.
    Eliminated(PlayerId),
}

/// Last-writer-wins replica of StateBroadcasts, plus a display copy that
/// may run ahead with optimistic local movement.
#[derive(Debug)]
pub struct ObserverMirror {
    last_tick: Option<u64>,
    authoritative: Option<StateBroadcast>,
    display: Option<StateBroadcast>,
    leaderboard: Vec<RankRecord>,
    ticket: u32,
    local_player: Option<PlayerId>,
    border: WorldBorder,
}

impl ObserverMirror {
    pub fn new(border: WorldBorder) -> Self {
        Self {
            last_tick: None,
            authoritative: None,
            display: None,
            leaderboard: Vec::new(),
            ticket: 0,
            local_player: None,
            border,
        }
    }

    /// Wait for a player spawned under `ticket`.
    pub fn expect_spawn(&mut self, ticket: u32) {
        self.ticket = ticket;
        self.local_player = None;
    }

    /// True while a spawn request is outstanding.
    #[inline]
    pub fn awaiting_spawn(&self) -> bool {
        self.ticket != 0 && self.local_player.is_none()
    }

    /// Apply a broadcast unless it is stale. Accepted broadcasts replace
    /// both the authoritative and the display copy wholesale.
    pub fn apply(&mut self, state: StateBroadcast) -> MirrorUpdate {
        if self.last_tick.is_some_and(|last| state.tick <= last) {
            debug!("Dropping stale broadcast {} (last {:?})", state.tick, self.last_tick);
            return MirrorUpdate::Stale;
        }
        self.last_tick = Some(state.tick);
        if let Some(rows) = &state.leaderboard {
            self.leaderboard = rows.clone();
        }

        let update = match self.local_player {
            Some(pid) if !state.players.iter().any(|p| p.id == pid) => {
                self.local_player = None;
                self.ticket = 0;
                MirrorUpdate::Eliminated(pid)
            }
            Some(_) => MirrorUpdate::Applied,
            None if self.ticket != 0 => match state.players.iter().find(|p| p.ticket == self.ticket) {
                Some(p) => {
                    self.local_player = Some(p.id);
                    MirrorUpdate::Confirmed(p.id)
                }
                None => MirrorUpdate::Applied,
            },
            None => MirrorUpdate::Applied,
        };

        self.display = Some(state.clone());
        self.authoritative = Some(state);
        update
    }

    /// Move our own cells in the display copy toward `target`.
    pub fn advance_display(&mut self, target: Option<Vec2>, speed: f32) {
        let (Some(pid), Some(target), Some(display)) = (self.local_player, target, self.display.as_mut()) else {
            return;
        };
        let (min, max) = (self.border.min(), self.border.max());
        for cell in display.cells.iter_mut().filter(|c| c.owner == pid) {
            if let Some(step) = movement::step_toward(cell.position, cell.mass, target, speed) {
                let r = radius_of_mass(cell.mass).min((max.x - min.x) / 2.0).min((max.y - min.y) / 2.0);
                let next = cell.position + step;
                cell.position = Vec2::new(next.x.clamp(min.x + r, max.x - r), next.y.clamp(min.y + r, max.y - r));
            }
        }
    }

    #[inline]
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    #[inline]
    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    /// Last applied broadcast, untouched.
    #[inline]
    pub fn authoritative(&self) -> Option<&StateBroadcast> {
        self.authoritative.as_ref()
    }

    /// What to draw. `None` until the first broadcast arrives.
    #[inline]
    pub fn display(&self) -> Option<&StateBroadcast> {
        self.display.as_ref()
    }

    #[inline]
    pub fn leaderboard(&self) -> &[RankRecord] {
        &self.leaderboard
    }

    /// Total mass of our player per the display copy.
    pub fn score(&self) -> f32 {
        match (self.local_player, &self.display) {
            (Some(pid), Some(d)) => d.cells.iter().filter(|c| c.owner == pid).map(|c| c.mass).sum(),
            _ => 0.0,
        }
    }

    /// Mass-weighted centre of our cells in the display copy.
    pub fn center(&self) -> Option<Vec2> {
        let pid = self.local_player?;
        let display = self.display.as_ref()?;
        let (acc, total) = display
            .cells
            .iter()
            .filter(|c| c.owner == pid)
            .fold((Vec2::ZERO, 0.0), |(acc, total), c| (acc + c.position * c.mass, total + c.mass));
        (total > 0.0).then(|| acc / total)
    }

    /// Forget everything (session end).
    pub fn clear(&mut self) {
        *self = Self::new(self.border);
    }
}
