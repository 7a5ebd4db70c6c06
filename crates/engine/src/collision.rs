//! Collision detection and resolution.
//!
//! Each tick: broad-phase contacts from a spatial grid, begin/end tracking
//! against the previous tick, classification against tick-start masses, then
//! resolution in fixed category order (virus, food, cell-vs-cell).

use std::collections::{BTreeMap, BTreeSet};

use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::config::PlayerConfig;
use crate::dynamics::{self, EatOutcome, SplitAim};
use crate::entity::{BodyKind, BodyRef, NodeId};
use crate::spatial::{Bounds, GridItem, SpatialGrid};
use crate::world::World;

/// An unordered pair of overlapping bodies, stored as `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Contact {
    pub a: NodeId,
    pub b: NodeId,
}

impl Contact {
    pub fn new(x: NodeId, y: NodeId) -> Self {
        if x < y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }
}

/// What a contact means this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    /// Cell at least as wide as the virus: pop the cell, consume the virus.
    CellVirus { cell: NodeId, virus: NodeId },
    /// Cell absorbs the food.
    CellFood { cell: NodeId, food: NodeId, cell_mass: f32 },
    /// Sibling cells ready to merge.
    Merge { keep: NodeId, absorbed: NodeId },
    /// `big` drains `small` continuously.
    Eat { big: NodeId, small: NodeId, small_mass: f32 },
}

impl ContactKind {
    #[inline]
    fn category(&self) -> u8 {
        match self {
            ContactKind::CellVirus { .. } => 0,
            ContactKind::CellFood { .. } => 1,
            ContactKind::Merge { .. } | ContactKind::Eat { .. } => 2,
        }
    }
}

/// Begin and end events produced by one tracker update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContactEvents {
    pub began: Vec<Contact>,
    pub ended: Vec<Contact>,
}

/// Remembers which contacts were active last tick and the eat transfers
/// they carry.
#[derive(Debug, Default)]
pub struct ContactTracker {
    active: BTreeSet<Contact>,
    /// Per-tick chunk of each running transfer, keyed by (big, small).
    transfers: BTreeMap<(NodeId, NodeId), f32>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active set and report what began and ended.
    pub fn update(&mut self, contacts: &[Contact]) -> ContactEvents {
        let current: BTreeSet<Contact> = contacts.iter().copied().collect();
        let events = ContactEvents {
            began: current.difference(&self.active).copied().collect(),
            ended: self.active.difference(&current).copied().collect(),
        };
        for contact in &events.ended {
            self.transfers.remove(&(contact.a, contact.b));
            self.transfers.remove(&(contact.b, contact.a));
        }
        self.active = current;
        events
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.transfers.clear();
    }
}

/// What happened during one resolution pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolveReport {
    pub viruses_popped: usize,
    pub food_eaten: usize,
    pub merges: usize,
    /// (eater, eaten) pairs where the eaten cell was fully drained.
    pub consumed: Vec<(NodeId, NodeId)>,
}

/// Every pair of bodies whose circles overlap and that involves a cell.
pub fn find_contacts(world: &World, grid: &mut SpatialGrid) -> Vec<Contact> {
    grid.clear();
    for c in world.cells.values() {
        grid.insert(GridItem::new(c.id, c.position.x, c.position.y, c.radius()));
    }
    for f in world.food.values() {
        grid.insert(GridItem::new(f.id, f.position.x, f.position.y, f.radius()));
    }
    for v in world.viruses.values() {
        grid.insert(GridItem::new(v.id, v.position.x, v.position.y, v.radius()));
    }

    let mut contacts = Vec::new();
    for cell in world.cells.values() {
        let r = cell.radius();
        for other in grid.find_in_radius(cell.position.x, cell.position.y, r) {
            if other == cell.id {
                continue;
            }
            let Some(body) = world.body(other) else {
                continue;
            };
            // Cell pairs are found from both sides; keep one.
            if body.kind() == BodyKind::Cell && other < cell.id {
                continue;
            }
            if cell.position.distance(body.position()) < r + body.radius() {
                contacts.push(Contact::new(cell.id, other));
            }
        }
    }
    contacts.sort_unstable();
    contacts.dedup();
    contacts
}

/// Classify a contact against the current (tick-start) world.
/// `None` means the contact has no effect this tick.
pub fn classify(world: &World, contact: Contact, cfg: &PlayerConfig) -> Option<ContactKind> {
    let x = world.body(contact.a)?;
    let y = world.body(contact.b)?;

    match (x, y) {
        (BodyRef::Cell(cell), BodyRef::Virus(virus)) | (BodyRef::Virus(virus), BodyRef::Cell(cell)) => {
            (cell.radius() >= virus.radius()).then_some(ContactKind::CellVirus {
                cell: cell.id,
                virus: virus.id,
            })
        }
        (BodyRef::Cell(cell), BodyRef::Food(food)) | (BodyRef::Food(food), BodyRef::Cell(cell)) => {
            Some(ContactKind::CellFood {
                cell: cell.id,
                food: food.id,
                cell_mass: cell.mass(),
            })
        }
        (BodyRef::Cell(p), BodyRef::Cell(q)) => {
            // Heavier is big; equal masses go to the lower id.
            let (big, small) = if p.mass() > q.mass() || (p.mass() == q.mass() && p.id < q.id) {
                (p, q)
            } else {
                (q, p)
            };
            let dist = big.position.distance(small.position);
            if big.owner == small.owner {
                let ready = !big.is_merge_locked() && !small.is_merge_locked();
                let deep = dist + small.radius() * (cfg.merge_overlap as f32) < big.radius();
                (ready && deep).then_some(ContactKind::Merge {
                    keep: big.id,
                    absorbed: small.id,
                })
            } else {
                let heavy = big.mass() >= small.mass() * (cfg.eat_mass_ratio as f32);
                let deep = dist + small.radius() * (cfg.eat_overlap as f32) < big.radius();
                (heavy && deep).then_some(ContactKind::Eat {
                    big: big.id,
                    small: small.id,
                    small_mass: small.mass(),
                })
            }
        }
        _ => None,
    }
}

#[inline]
fn mark(set: &mut FixedBitSet, id: NodeId) {
    let idx = id as usize;
    if idx >= set.len() {
        set.grow(idx + 1);
    }
    set.insert(idx);
}

#[inline]
fn marked(set: &FixedBitSet, id: NodeId) -> bool {
    set.contains(id as usize)
}

/// Apply classified contacts in category order, then pair order.
pub fn resolve(
    world: &mut World,
    tracker: &mut ContactTracker,
    contacts: &[Contact],
    cfg: &PlayerConfig,
) -> ResolveReport {
    let mut kinds: Vec<(Contact, ContactKind)> = contacts
        .iter()
        .filter_map(|&c| classify(world, c, cfg).map(|k| (c, k)))
        .collect();
    kinds.sort_by(|(ca, ka), (cb, kb)| ka.category().cmp(&kb.category()).then(ca.cmp(cb)));

    let mut removed = FixedBitSet::with_capacity(world.id_bound());
    let mut report = ResolveReport::default();

    // Food goes to the heaviest contender, lowest id on ties.
    let mut food_winner: BTreeMap<NodeId, (NodeId, f32)> = BTreeMap::new();
    for (_, kind) in &kinds {
        if let ContactKind::CellFood { cell, food, cell_mass } = *kind {
            let entry = food_winner.entry(food).or_insert((cell, cell_mass));
            if cell_mass > entry.1 || (cell_mass == entry.1 && cell < entry.0) {
                *entry = (cell, cell_mass);
            }
        }
    }

    let min_mass = cfg.min_mass as f32;
    let mut live_transfers = BTreeSet::new();

    for (_, kind) in kinds {
        match kind {
            ContactKind::CellVirus { cell, virus } => {
                if marked(&removed, virus) || marked(&removed, cell) {
                    continue;
                }
                world.remove_virus(virus);
                mark(&mut removed, virus);
                dynamics::split_cell(world, cell, SplitAim::Radial, cfg);
                report.viruses_popped += 1;
                debug!("Virus {} popped cell {}", virus, cell);
            }
            ContactKind::CellFood { cell, food, .. } => {
                if food_winner.get(&food).map(|w| w.0) != Some(cell) {
                    continue;
                }
                if marked(&removed, food) || marked(&removed, cell) {
                    continue;
                }
                let Some(pellet) = world.remove_food(food) else {
                    continue;
                };
                mark(&mut removed, food);
                if let Some(c) = world.cells.get_mut(&cell) {
                    dynamics::grow(c, pellet.mass);
                }
                report.food_eaten += 1;
            }
            ContactKind::Merge { keep, absorbed } => {
                if marked(&removed, keep) || marked(&removed, absorbed) {
                    continue;
                }
                if dynamics::merge(world, keep, absorbed) {
                    mark(&mut removed, absorbed);
                    report.merges += 1;
                    debug!("Cell {} merged into {}", absorbed, keep);
                }
            }
            ContactKind::Eat { big, small, small_mass } => {
                if marked(&removed, big) || marked(&removed, small) {
                    continue;
                }
                let chunk = *tracker
                    .transfers
                    .entry((big, small))
                    .or_insert(small_mass / cfg.eat_transfer_ticks as f32);
                live_transfers.insert((big, small));
                if let Some(EatOutcome::Consumed(_)) = dynamics::eat_step(world, big, small, chunk, min_mass) {
                    mark(&mut removed, small);
                    report.consumed.push((big, small));
                    debug!("Cell {} was eaten by {}", small, big);
                }
            }
        }
    }

    // A transfer stops as soon as its pair is no longer eligible.
    tracker.transfers.retain(|pair, _| live_transfers.contains(pair));
    report
}

/// Broad phase, tracking and resolution bundled with reusable buffers.
#[derive(Debug)]
pub struct CollisionResolver {
    grid: SpatialGrid,
    pub tracker: ContactTracker,
}

impl CollisionResolver {
    pub fn new(world: &World) -> Self {
        let b = world.border;
        Self {
            grid: SpatialGrid::for_world(Bounds::new(b.min_x, b.min_y, b.max_x, b.max_y)),
            tracker: ContactTracker::new(),
        }
    }

    /// Run one collision pass.
    pub fn step(&mut self, world: &mut World, cfg: &PlayerConfig, tick: u64) -> ResolveReport {
        let contacts = find_contacts(world, &mut self.grid);
        let events = self.tracker.update(&contacts);
        if !events.began.is_empty() || !events.ended.is_empty() {
            debug!(
                "Tick {}: {} contacts began, {} ended",
                tick,
                events.began.len(),
                events.ended.len()
            );
        }
        resolve(world, &mut self.tracker, &contacts, cfg)
    }
}
