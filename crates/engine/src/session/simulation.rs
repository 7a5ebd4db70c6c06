//! The authoritative tick pipeline shared by Solo and Authority sessions.

use tracing::{debug, info};

use crate::ai::BotManager;
use crate::collision::{CollisionResolver, ResolveReport};
use crate::config::Config;
use crate::dynamics;
use crate::entity::{Controller, Player, PlayerId};
use crate::leaderboard::Leaderboard;
use crate::movement;
use crate::spawn;
use crate::world::World;

/// What one step did.
#[derive(Debug, Default)]
pub struct StepReport {
    pub tick: u64,
    pub spawned_food: usize,
    pub spawned_viruses: usize,
    pub collisions: ResolveReport,
    /// Players removed this tick because they lost their last cell.
    pub eliminated: Vec<Player>,
    pub leaderboard_updated: bool,
}

/// World plus everything that advances it.
#[derive(Debug)]
pub struct Simulation {
    pub world: World,
    pub leaderboard: Leaderboard,
    pub bots: BotManager,
    collision: CollisionResolver,
    tick: u64,
}

impl Simulation {
    pub fn new(config: &Config) -> Self {
        let world = World::new(config);
        let collision = CollisionResolver::new(&world);
        Self {
            world,
            leaderboard: Leaderboard::new(),
            bots: BotManager::new(),
            collision,
            tick: 0,
        }
    }

    /// Ticks completed so far.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed food and viruses, and the opponent roster when asked.
    pub fn populate(&mut self, config: &Config, with_roster: bool) {
        spawn::seed_world(&mut self.world, config);
        if with_roster {
            let roster = spawn::spawn_roster(&mut self.world, &config.bots, &config.player);
            self.bots = BotManager::from_roster(roster);
        }
        self.leaderboard.recompute(&self.world, self.tick);
    }

    /// Spawn a player with a starting cell.
    pub fn spawn_player(&mut self, name: String, controller: Controller, config: &Config) -> PlayerId {
        let pid = spawn::spawn_player(&mut self.world, name, controller, &config.player);
        info!("Player {} joined ({:?})", pid, controller);
        pid
    }

    /// Split a player's cells now. Intents drained at tick start use this.
    pub fn split(&mut self, pid: PlayerId, config: &Config) -> usize {
        dynamics::split(&mut self.world, pid, &config.player)
    }

    /// Advance one tick: top-ups, opponents, movement, collisions, deaths,
    /// leaderboard cadence.
    pub fn step(&mut self, config: &Config) -> StepReport {
        self.tick += 1;
        let tick = self.tick;
        let mut report = StepReport {
            tick,
            ..Default::default()
        };

        report.spawned_food = spawn::top_up_food(&mut self.world, &config.food);
        report.spawned_viruses = spawn::top_up_viruses(&mut self.world, &config.virus, tick);

        self.bots.respawn_due(&mut self.world, config, tick);
        for pid in self.bots.steer(&mut self.world, config) {
            dynamics::split(&mut self.world, pid, &config.player);
        }

        movement::move_cells(&mut self.world, &config.player);
        report.collisions = self.collision.step(&mut self.world, &config.player, tick);

        report.eliminated = dynamics::check_death(&mut self.world, &config.player);
        for player in &report.eliminated {
            if player.controller == Controller::Bot {
                self.bots.on_death(player.id, tick);
            }
            info!("Player {} ({}) was eliminated", player.id, player.display_name());
        }

        if tick % config.session.leaderboard_interval == 0 {
            self.leaderboard.recompute(&self.world, tick);
            report.leaderboard_updated = true;
        }

        debug!(
            "Tick {}: +{} food, +{} viruses, {} eaten, {} merges",
            tick,
            report.spawned_food,
            report.spawned_viruses,
            report.collisions.food_eaten,
            report.collisions.merges
        );
        report
    }

    /// Drop transient collision state (session end).
    pub fn clear_transients(&mut self) {
        self.collision.tracker.clear();
    }
}
