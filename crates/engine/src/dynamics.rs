//! Mass dynamics: growth, splitting, continuous eating, merging and death.
//!
//! Every transfer keeps cell masses at or above the minimum viable mass, so
//! a non-positive mass can only come from a caller bug.

use std::f32::consts::TAU;

use glam::Vec2;
use tracing::debug;

use crate::config::PlayerConfig;
use crate::entity::{Cell, NodeId, Player, PlayerId};
use crate::world::World;

/// Angular spread between children launched toward a target.
const AIMED_SPREAD: f32 = 0.35;

/// Where split children are launched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitAim {
    /// Fan out around the direction to a point (user split).
    Toward(Vec2),
    /// Spread evenly around the parent (virus pop).
    Radial,
}

/// Result of one continuous-eat step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EatOutcome {
    /// Partial transfer; the small cell survives.
    Transferred(f32),
    /// The small cell was drained completely and removed.
    Consumed(f32),
}

/// Add mass to a cell.
#[inline]
pub fn grow(cell: &mut Cell, mass: f32) {
    cell.set_mass(cell.mass() + mass);
}

/// How many children a parent of `parent_mass` splits into when its owner
/// currently has `owned` cells. Zero means the parent does not split.
pub fn split_child_count(parent_mass: f32, owned: usize, cfg: &PlayerConfig) -> usize {
    let slots = (cfg.max_cells + 1).saturating_sub(owned);
    let mut k = cfg.split_children_cap.min(slots);
    while k >= 2 && (parent_mass / k as f32) < cfg.min_mass as f32 {
        k -= 1;
    }
    if k >= 2 { k } else { 0 }
}

/// Split one cell into `k` children of equal mass. The parent keeps its id
/// and stays in place as the first child; the returned new cells are
/// launched outward.
pub fn split_cell(world: &mut World, cell_id: NodeId, aim: SplitAim, cfg: &PlayerConfig) -> Vec<NodeId> {
    let Some(parent) = world.cells.get(&cell_id) else {
        return Vec::new();
    };
    let owner = parent.owner;
    let origin = parent.position;
    let mass = parent.mass();
    let owned = world.player(owner).map_or(0, |p| p.cells.len());

    let k = split_child_count(mass, owned, cfg);
    if k == 0 {
        return Vec::new();
    }

    let child_mass = mass / k as f32;
    let parent_mass = mass - child_mass * (k - 1) as f32;
    let offset = crate::entity::radius_of_mass(child_mass);
    let directions = launch_directions(origin, aim, k, &mut world.rng);

    if let Some(parent) = world.cells.get_mut(&cell_id) {
        parent.set_mass(parent_mass);
        parent.merge_lock = cfg.merge_lock_ticks;
    }

    let mut children = Vec::with_capacity(k - 1);
    for dir in directions {
        let Some(id) = world.add_cell(owner, origin + dir * offset, child_mass) else {
            break;
        };
        if let Some(child) = world.cells.get_mut(&id) {
            child.merge_lock = cfg.merge_lock_ticks;
            child.set_boost(cfg.split_boost as f32, dir);
        }
        children.push(id);
    }
    debug!("Cell {} of player {} split into {} (child mass {:.1})", cell_id, owner, k, child_mass);
    children
}

/// Launch directions for the `k - 1` new children.
fn launch_directions(origin: Vec2, aim: SplitAim, k: usize, rng: &mut impl rand::Rng) -> Vec<Vec2> {
    let n = k - 1;
    match aim {
        SplitAim::Toward(target) => {
            let base = (target - origin).try_normalize().unwrap_or(Vec2::Y);
            let base_angle = base.y.atan2(base.x);
            let mid = (n as f32 - 1.0) / 2.0;
            (0..n)
                .map(|i| Vec2::from_angle(base_angle + (i as f32 - mid) * AIMED_SPREAD))
                .collect()
        }
        SplitAim::Radial => {
            let start = rng.random_range(0.0..TAU);
            (1..k)
                .map(|i| Vec2::from_angle(start + TAU * i as f32 / k as f32))
                .collect()
        }
    }
}

/// User-initiated split: every cell at or above the split threshold splits,
/// heaviest first, while the owner has room. Invalid requests are no-ops.
pub fn split(world: &mut World, player_id: PlayerId, cfg: &PlayerConfig) -> usize {
    let Some(player) = world.player(player_id) else {
        return 0;
    };
    let target = player.target;
    let mut eligible: Vec<(NodeId, f32, Vec2)> = world
        .player_cells(player_id)
        .filter(|c| c.mass() >= cfg.min_split_mass as f32)
        .map(|c| (c.id, c.mass(), c.position))
        .collect();
    eligible.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut created = 0;
    for (id, _, position) in eligible {
        let aim = SplitAim::Toward(target.unwrap_or(position + Vec2::Y));
        created += split_cell(world, id, aim, cfg).len();
    }
    created
}

/// One tick of continuous eating: move up to `chunk` mass from `small` into
/// `big`. If the remainder would fall below `min_mass` the small cell is
/// drained completely and removed.
pub fn eat_step(world: &mut World, big: NodeId, small: NodeId, chunk: f32, min_mass: f32) -> Option<EatOutcome> {
    let small_mass = world.cells.get(&small)?.mass();
    world.cells.get(&big)?;

    let outcome = if small_mass - chunk < min_mass {
        world.remove_cell(small);
        EatOutcome::Consumed(small_mass)
    } else {
        if let Some(cell) = world.cells.get_mut(&small) {
            cell.set_mass(small_mass - chunk);
        }
        EatOutcome::Transferred(chunk)
    };

    let gained = match outcome {
        EatOutcome::Transferred(m) | EatOutcome::Consumed(m) => m,
    };
    if let Some(cell) = world.cells.get_mut(&big) {
        grow(cell, gained);
    }
    Some(outcome)
}

/// Combine `absorbed` into `keep` at their mass-weighted centroid.
pub fn merge(world: &mut World, keep: NodeId, absorbed: NodeId) -> bool {
    if keep == absorbed {
        return false;
    }
    let Some(other) = world.cells.get(&absorbed).map(|c| (c.position, c.mass())) else {
        return false;
    };
    let Some(cell) = world.cells.get_mut(&keep) else {
        return false;
    };
    let (pos, mass) = other;
    let total = cell.mass() + mass;
    cell.position = (cell.position * cell.mass() + pos * mass) / total;
    cell.set_mass(total);
    world.remove_cell(absorbed);
    true
}

/// Eliminate cells below the minimum viable mass, then remove and return
/// every player left without cells.
pub fn check_death(world: &mut World, cfg: &PlayerConfig) -> Vec<Player> {
    let min_mass = cfg.min_mass as f32;
    let undersized: Vec<NodeId> = world
        .cells
        .values()
        .filter(|c| c.mass() < min_mass)
        .map(|c| c.id)
        .collect();
    for id in undersized {
        world.remove_cell(id);
    }

    let dead: Vec<PlayerId> = world
        .players
        .values()
        .filter(|p| p.is_dead())
        .map(|p| p.id)
        .collect();
    dead.into_iter().filter_map(|id| world.remove_player(id)).collect()
}
