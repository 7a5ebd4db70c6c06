//! Opponent roster: steering and respawn lifecycle.

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use super::policy::{self, Sighting, SmartDecision};
use crate::config::Config;
use crate::entity::{Controller, PlayerId};
use crate::spawn;
use crate::world::World;

/// How far an opponent looks for food, prey and threats.
const SIGHT: f32 = 1200.0;
/// Wander targets are picked this far away.
const WANDER_DISTANCE: f32 = 400.0;

/// Opponent difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotTier {
    /// Nearest food, wander otherwise.
    Simple,
    /// Flee threats, chase prey, else graze.
    Smart,
}

/// One roster slot. Keeps its name and tier across respawns.
#[derive(Debug, Clone)]
pub struct Bot {
    pub name: String,
    pub tier: BotTier,
    /// Live player, if spawned.
    pub player: Option<PlayerId>,
    /// Tick of the last death.
    pub died_at: Option<u64>,
    wander: Option<Vec2>,
}

impl Bot {
    pub fn new(name: String, tier: BotTier, player: Option<PlayerId>) -> Self {
        Self {
            name,
            tier,
            player,
            died_at: None,
            wander: None,
        }
    }
}

/// Drives every opponent.
#[derive(Debug, Default)]
pub struct BotManager {
    pub bots: Vec<Bot>,
}

impl BotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a freshly spawned roster.
    pub fn from_roster(roster: Vec<(PlayerId, BotTier, String)>) -> Self {
        Self {
            bots: roster
                .into_iter()
                .map(|(id, tier, name)| Bot::new(name, tier, Some(id)))
                .collect(),
        }
    }

    /// Set every live opponent's target. Returns opponents that want to split.
    pub fn steer(&mut self, world: &mut World, config: &Config) -> Vec<PlayerId> {
        let eat_ratio = config.player.eat_mass_ratio as f32;
        let split_reach = config.player.split_boost as f32 * 0.5;
        let mut splits = Vec::new();

        for bot in &mut self.bots {
            let Some(pid) = bot.player else {
                continue;
            };
            let Some(me) = world.center_position(pid) else {
                continue;
            };
            let largest = world.player_cells(pid).map(|c| c.mass()).fold(0.0, f32::max);
            let food = world
                .food
                .values()
                .map(|f| f.position)
                .filter(|p| p.distance(me) < SIGHT);

            let target = match bot.tier {
                BotTier::Simple => policy::simple_target(me, food),
                BotTier::Smart => {
                    let others: Vec<Sighting> = world
                        .cells
                        .values()
                        .filter(|c| c.owner != pid)
                        .map(|c| Sighting {
                            position: c.position,
                            mass: c.mass(),
                        })
                        .collect();
                    let decision = policy::smart_target(me, largest, &others, food, eat_ratio, SIGHT);
                    if let Some(SmartDecision::Chase(prey)) = decision {
                        let cells = world.player(pid).map_or(0, |p| p.cells.len());
                        let prey_mass = others
                            .iter()
                            .find(|s| s.position == prey)
                            .map_or(f32::MAX, |s| s.mass);
                        if cells == 1
                            && prey.distance(me) < split_reach
                            && largest / 2.0 >= prey_mass * eat_ratio
                            && largest >= config.player.min_split_mass as f32
                        {
                            splits.push(pid);
                        }
                    }
                    decision.map(|d| d.target())
                }
            };

            let target = match target {
                Some(t) => {
                    bot.wander = None;
                    t
                }
                None => {
                    let reached = bot.wander.is_none_or(|w| w.distance(me) < 10.0);
                    if reached {
                        let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
                        bot.wander = Some(me + Vec2::from_angle(angle) * WANDER_DISTANCE);
                    }
                    bot.wander.unwrap_or(me)
                }
            };

            let border = world.border;
            if let Some(player) = world.player_mut(pid) {
                player.target = Some(border.clamp(target));
            }
        }
        splits
    }

    /// Note that an opponent's player was eliminated.
    pub fn on_death(&mut self, pid: PlayerId, tick: u64) -> bool {
        match self.bots.iter_mut().find(|b| b.player == Some(pid)) {
            Some(bot) => {
                bot.player = None;
                bot.died_at = Some(tick);
                bot.wander = None;
                true
            }
            None => false,
        }
    }

    /// Respawn opponents whose wait is over. Returns how many came back.
    pub fn respawn_due(&mut self, world: &mut World, config: &Config, tick: u64) -> usize {
        let mut count = 0;
        for bot in &mut self.bots {
            let due = bot.player.is_none()
                && bot
                    .died_at
                    .is_none_or(|t| tick.saturating_sub(t) >= config.bots.respawn_ticks);
            if !due {
                continue;
            }
            let pid = spawn::spawn_player(world, bot.name.clone(), Controller::Bot, &config.player);
            bot.player = Some(pid);
            bot.died_at = None;
            count += 1;
            debug!("Opponent {} respawned as player {}", bot.name, pid);
        }
        count
    }
}
