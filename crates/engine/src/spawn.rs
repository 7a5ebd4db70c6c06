//! Population control: capped food and virus pools, player and roster spawns.

use tracing::{debug, info};

use crate::ai::BotTier;
use crate::config::{BotConfig, Config, FoodConfig, PlayerConfig, VirusConfig};
use crate::entity::{Controller, PlayerId};
use crate::world::World;

/// Bot names to use.
const BOT_NAMES: &[&str] = &[
    "Hunter", "Hungry", "Nomnom", "Blob", "Eater", "Seeker", "Roamer", "Wanderer",
    "Ghost", "Shadow", "Swift", "Tiny",
];

/// Add up to `min(limit - count, spawn_per_tick)` food. Returns how many.
pub fn top_up_food(world: &mut World, cfg: &FoodConfig) -> usize {
    let n = cfg.limit.saturating_sub(world.food.len()).min(cfg.spawn_per_tick);
    for _ in 0..n {
        let pos = world.random_position();
        world.add_food(pos, cfg.mass as f32);
    }
    n
}

/// Add one virus every `respawn_interval` ticks while below the limit.
pub fn top_up_viruses(world: &mut World, cfg: &VirusConfig, tick: u64) -> usize {
    if tick % cfg.respawn_interval != 0 || world.viruses.len() >= cfg.limit {
        return 0;
    }
    let pos = world.random_position();
    world.add_virus(pos, cfg.mass as f32);
    1
}

/// Seed the initial food and viruses, capped by their limits.
pub fn seed_world(world: &mut World, config: &Config) {
    let food = config.food.initial.min(config.food.limit).saturating_sub(world.food.len());
    for _ in 0..food {
        let pos = world.random_position();
        world.add_food(pos, config.food.mass as f32);
    }
    let viruses = config
        .virus
        .initial
        .min(config.virus.limit)
        .saturating_sub(world.viruses.len());
    for _ in 0..viruses {
        let pos = world.random_position();
        world.add_virus(pos, config.virus.mass as f32);
    }
    info!("World initialized: {} food, {} viruses", world.food.len(), world.viruses.len());
}

/// Create a player with one starting cell at a random position.
pub fn spawn_player(world: &mut World, name: String, controller: Controller, cfg: &PlayerConfig) -> PlayerId {
    let id = world.add_player(name, controller);
    let pos = world.random_position();
    world.add_cell(id, pos, cfg.start_mass as f32);
    debug!("Spawned player {} at ({:.0}, {:.0})", id, pos.x, pos.y);
    id
}

/// Name for the `index`-th opponent of a roster.
pub fn bot_name(index: usize) -> String {
    format!("{}{}", BOT_NAMES[index % BOT_NAMES.len()], index + 1)
}

/// Spawn the scripted opponent roster: simple tier first, then smart.
pub fn spawn_roster(world: &mut World, bots: &BotConfig, cfg: &PlayerConfig) -> Vec<(PlayerId, BotTier, String)> {
    let tiers = std::iter::repeat_n(BotTier::Simple, bots.simple).chain(std::iter::repeat_n(BotTier::Smart, bots.smart));
    let roster: Vec<_> = tiers
        .enumerate()
        .map(|(i, tier)| {
            let name = bot_name(i);
            let id = spawn_player(world, name.clone(), Controller::Bot, cfg);
            (id, tier, name)
        })
        .collect();
    info!("Spawned {} opponents", roster.len());
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::empty_config;

    #[test]
    fn test_food_never_exceeds_limit() {
        let mut config = empty_config();
        config.food.limit = 12;
        config.food.spawn_per_tick = 5;
        let mut world = World::new(&config);

        assert_eq!(top_up_food(&mut world, &config.food), 5);
        assert_eq!(top_up_food(&mut world, &config.food), 5);
        assert_eq!(top_up_food(&mut world, &config.food), 2);
        for _ in 0..50 {
            top_up_food(&mut world, &config.food);
            assert!(world.food.len() <= config.food.limit);
        }
        assert_eq!(world.food.len(), 12);
    }

    #[test]
    fn test_viruses_one_at_a_time_on_interval() {
        let mut config = empty_config();
        config.virus.limit = 3;
        config.virus.respawn_interval = 10;
        let mut world = World::new(&config);

        for tick in 1..=200 {
            top_up_viruses(&mut world, &config.virus, tick);
            assert!(world.viruses.len() <= config.virus.limit);
            if tick == 25 {
                assert_eq!(world.viruses.len(), 2);
            }
        }
        assert_eq!(world.viruses.len(), 3);
    }

    #[test]
    fn test_seed_respects_limits() {
        let mut config = empty_config();
        config.food.initial = 100;
        config.food.limit = 40;
        config.virus.initial = 15;
        config.virus.limit = 25;
        let mut world = World::new(&config);

        seed_world(&mut world, &config);
        assert_eq!(world.food.len(), 40);
        assert_eq!(world.viruses.len(), 15);
    }

    #[test]
    fn test_spawn_player_has_start_mass() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = spawn_player(&mut world, "me".into(), Controller::Local, &config.player);
        assert_eq!(world.total_mass(p), 10.0);
        assert!(!world.is_dead(p));
    }

    #[test]
    fn test_roster_tiers() {
        let mut config = empty_config();
        config.bots.simple = 2;
        config.bots.smart = 1;
        let mut world = World::new(&config);

        let roster = spawn_roster(&mut world, &config.bots, &config.player);
        let tiers: Vec<_> = roster.iter().map(|r| r.1).collect();
        assert_eq!(tiers, vec![BotTier::Simple, BotTier::Simple, BotTier::Smart]);
        assert_eq!(world.players.len(), 3);
    }
}
