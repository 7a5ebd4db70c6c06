//! World state management.
//!
//! The world owns every body by id. Each body kind lives in its own
//! id-ordered table; players refer to their cells by id only.

use std::collections::BTreeMap;

use glam::Vec2;
use protocol::{CellRecord, PelletRecord, PlayerRecord, StateBroadcast};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::entity::{BodyRef, Cell, Controller, Food, NodeId, Player, PlayerId, Virus};

/// World border bounds. The world is centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBorder {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            min_x: -half_w,
            min_y: -half_h,
            max_x: half_w,
            max_y: half_h,
            width,
            height,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.max_x, self.max_y)
    }

    /// Get a random position within the border.
    #[inline]
    pub fn random_position(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            rng.random_range(self.min_x..self.max_x),
            rng.random_range(self.min_y..self.max_y),
        )
    }

    /// Clamp a point into the border.
    #[inline]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }
}

/// The arena: id-indexed tables per body kind plus the player table.
#[derive(Debug)]
pub struct World {
    next_node_id: NodeId,
    next_player_id: PlayerId,

    pub cells: BTreeMap<NodeId, Cell>,
    pub food: BTreeMap<NodeId, Food>,
    pub viruses: BTreeMap<NodeId, Virus>,
    /// Iteration order is creation order.
    pub players: BTreeMap<PlayerId, Player>,

    pub border: WorldBorder,
    pub rng: StdRng,
}

impl World {
    /// Create an empty world for the given config.
    pub fn new(config: &Config) -> Self {
        let rng = match config.session.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(
            config.border.width as f32,
            config.border.height as f32,
            rng,
        )
    }

    /// Create an empty world with an explicit border and RNG.
    pub fn with_rng(width: f32, height: f32, rng: StdRng) -> Self {
        Self {
            next_node_id: 1,
            next_player_id: 1,
            cells: BTreeMap::new(),
            food: BTreeMap::new(),
            viruses: BTreeMap::new(),
            players: BTreeMap::new(),
            border: WorldBorder::new(width, height),
            rng,
        }
    }

    /// Get the next node ID. Ids are never reused within a world.
    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id = self.next_node_id.wrapping_add(1).max(1);
        id
    }

    /// Upper bound (exclusive) of node ids handed out so far.
    #[inline]
    pub fn id_bound(&self) -> usize {
        self.next_node_id as usize
    }

    /// A random position inside the border.
    pub fn random_position(&mut self) -> Vec2 {
        self.border.random_position(&mut self.rng)
    }

    /// Look up any body by id.
    pub fn body(&self, id: NodeId) -> Option<BodyRef<'_>> {
        if let Some(c) = self.cells.get(&id) {
            return Some(BodyRef::Cell(c));
        }
        if let Some(f) = self.food.get(&id) {
            return Some(BodyRef::Food(f));
        }
        self.viruses.get(&id).map(BodyRef::Virus)
    }

    // ---- players ----

    /// Register a player with no cells yet.
    pub fn add_player(&mut self, name: String, controller: Controller) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.insert(id, Player::new(id, name, controller));
        id
    }

    /// Remove a player and any cells it still owns.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        for cell_id in &player.cells {
            self.cells.remove(cell_id);
        }
        Some(player)
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Sum of the player's cell masses. Zero for unknown players.
    pub fn total_mass(&self, id: PlayerId) -> f32 {
        self.player_cells(id).map(|c| c.mass()).sum()
    }

    /// Mass-weighted centroid of the player's cells.
    pub fn center_position(&self, id: PlayerId) -> Option<Vec2> {
        let mut total = 0.0;
        let mut acc = Vec2::ZERO;
        for cell in self.player_cells(id) {
            acc += cell.position * cell.mass();
            total += cell.mass();
        }
        (total > 0.0).then(|| acc / total)
    }

    /// A player is dead when it owns no cells; unknown players count as dead.
    pub fn is_dead(&self, id: PlayerId) -> bool {
        self.players.get(&id).is_none_or(Player::is_dead)
    }

    /// Live cells owned by a player, in the player's order.
    pub fn player_cells(&self, id: PlayerId) -> impl Iterator<Item = &Cell> + '_ {
        self.players
            .get(&id)
            .into_iter()
            .flat_map(|p| p.cells.iter())
            .filter_map(|cid| self.cells.get(cid))
    }

    // ---- cells ----

    /// Create a cell for `owner`. Returns `None` if the owner is unknown.
    pub fn add_cell(&mut self, owner: PlayerId, position: Vec2, mass: f32) -> Option<NodeId> {
        if !self.players.contains_key(&owner) {
            return None;
        }
        let id = self.next_id();
        self.cells.insert(id, Cell::new(id, owner, position, mass));
        if let Some(player) = self.players.get_mut(&owner) {
            player.cells.push(id);
        }
        Some(id)
    }

    /// Remove a cell and unlink it from its owner.
    pub fn remove_cell(&mut self, id: NodeId) -> Option<Cell> {
        let cell = self.cells.remove(&id)?;
        if let Some(player) = self.players.get_mut(&cell.owner) {
            player.cells.retain(|&c| c != id);
        }
        Some(cell)
    }

    // ---- food / viruses ----

    pub fn add_food(&mut self, position: Vec2, mass: f32) -> NodeId {
        let id = self.next_id();
        self.food.insert(id, Food::new(id, position, mass));
        id
    }

    pub fn remove_food(&mut self, id: NodeId) -> Option<Food> {
        self.food.remove(&id)
    }

    pub fn add_virus(&mut self, position: Vec2, mass: f32) -> NodeId {
        let id = self.next_id();
        self.viruses.insert(id, Virus::new(id, position, mass));
        id
    }

    pub fn remove_virus(&mut self, id: NodeId) -> Option<Virus> {
        self.viruses.remove(&id)
    }

    /// Full renderable snapshot at `tick`, without leaderboard.
    pub fn snapshot(&self, tick: u64) -> StateBroadcast {
        StateBroadcast {
            tick,
            players: self
                .players
                .values()
                .map(|p| PlayerRecord {
                    id: p.id,
                    ticket: p.ticket,
                    name: p.name.clone(),
                })
                .collect(),
            cells: self
                .cells
                .values()
                .map(|c| CellRecord {
                    id: c.id,
                    owner: c.owner,
                    position: c.position,
                    mass: c.mass(),
                })
                .collect(),
            food: self
                .food
                .values()
                .map(|f| PelletRecord {
                    id: f.id,
                    position: f.position,
                    mass: f.mass,
                })
                .collect(),
            viruses: self
                .viruses
                .values()
                .map(|v| PelletRecord {
                    id: v.id,
                    position: v.position,
                    mass: v.mass,
                })
                .collect(),
            leaderboard: None,
        }
    }
}
