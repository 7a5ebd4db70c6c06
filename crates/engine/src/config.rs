//! Arena configuration.

use protocol::packets::MAX_RECORDS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{EngineError, Result};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "arena.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub border: BorderConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub bots: BotConfig,
    #[serde(default)]
    pub net: NetConfig,
}

impl Config {
    /// Load configuration from `arena.toml`, writing the defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::from_path(path)
        } else {
            info!("No {} found, creating default config", DEFAULT_CONFIG_FILE);
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.session.tick_interval_ms == 0 {
            return fail("session.tick_interval_ms must be positive");
        }
        if self.session.broadcast_interval == 0 || self.session.leaderboard_interval == 0 {
            return fail("session intervals must be at least one tick");
        }
        if self.virus.respawn_interval == 0 {
            return fail("virus.respawn_interval must be at least one tick");
        }
        if self.border.width <= 0.0 || self.border.height <= 0.0 {
            return fail("border dimensions must be positive");
        }
        let p = &self.player;
        if p.start_mass <= 0.0 || p.min_mass <= 0.0 || p.start_mass < p.min_mass {
            return fail("player.start_mass must be positive and at least player.min_mass");
        }
        if p.max_cells == 0 {
            return fail("player.max_cells must be at least 1");
        }
        if p.split_children_cap < 2 {
            return fail("player.split_children_cap must be at least 2");
        }
        if p.eat_mass_ratio <= 1.0 {
            return fail("player.eat_mass_ratio must exceed 1");
        }
        if p.eat_transfer_ticks == 0 {
            return fail("player.eat_transfer_ticks must be at least 1");
        }
        if self.food.mass <= 0.0 || self.virus.mass <= 0.0 {
            return fail("food.mass and virus.mass must be positive");
        }
        // Every pool has to fit in one StateBroadcast.
        let max_records = MAX_RECORDS as usize;
        if self.food.limit > max_records || self.virus.limit > max_records {
            return fail(&format!("food.limit and virus.limit must not exceed {}", max_records));
        }
        let roster = self.bots.simple + self.bots.smart + 1;
        if roster.saturating_mul(p.max_cells) > max_records {
            return fail(&format!(
                "bots and player.max_cells allow more than {} cells",
                max_records
            ));
        }
        Ok(())
    }
}

/// Tick cadence and session-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Ticks between StateBroadcasts (Authority only).
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval: u64,
    /// Ticks between leaderboard recomputes.
    #[serde(default = "default_leaderboard_interval")]
    pub leaderboard_interval: u64,
    /// RNG seed. Unset means seeded from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Display name of the local player.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            broadcast_interval: default_broadcast_interval(),
            leaderboard_interval: default_leaderboard_interval(),
            seed: None,
            player_name: default_player_name(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_tick_interval() -> u64 {
    40
}
fn default_broadcast_interval() -> u64 {
    3
}
fn default_leaderboard_interval() -> u64 {
    25
}
fn default_player_name() -> String {
    "Player".to_string()
}
fn default_max_name_length() -> usize {
    30
}

/// World border configuration. The world is centred on the origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BorderConfig {
    #[serde(default = "default_border_size")]
    pub width: f64,
    #[serde(default = "default_border_size")]
    pub height: f64,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: default_border_size(),
            height: default_border_size(),
        }
    }
}

fn default_border_size() -> f64 {
    6000.0
}

/// Player cell dynamics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_start_mass")]
    pub start_mass: f64,
    /// Cells below this mass are eliminated.
    #[serde(default = "default_player_min_mass")]
    pub min_mass: f64,
    /// Cells must be at least this heavy to split.
    #[serde(default = "default_player_min_split_mass")]
    pub min_split_mass: f64,
    #[serde(default = "default_player_max_cells")]
    pub max_cells: usize,
    /// Upper bound on children produced from one parent cell.
    #[serde(default = "default_split_children_cap")]
    pub split_children_cap: usize,
    /// Ticks a freshly split cell must wait before it can merge.
    #[serde(default = "default_merge_lock_ticks")]
    pub merge_lock_ticks: u32,
    /// Big cell mass must be at least this multiple of the small one to eat it.
    #[serde(default = "default_eat_mass_ratio")]
    pub eat_mass_ratio: f64,
    /// How deep the small cell must sit inside the big one, in small radii.
    #[serde(default = "default_eat_overlap")]
    pub eat_overlap: f64,
    /// Ticks of sustained overlap needed to drain a small cell completely.
    #[serde(default = "default_eat_transfer_ticks")]
    pub eat_transfer_ticks: u32,
    /// How deep sibling cells must overlap to merge, in small radii.
    #[serde(default = "default_merge_overlap")]
    pub merge_overlap: f64,
    #[serde(default = "default_player_speed")]
    pub speed: f64,
    /// Launch distance of split children.
    #[serde(default = "default_split_boost")]
    pub split_boost: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_mass: default_player_start_mass(),
            min_mass: default_player_min_mass(),
            min_split_mass: default_player_min_split_mass(),
            max_cells: default_player_max_cells(),
            split_children_cap: default_split_children_cap(),
            merge_lock_ticks: default_merge_lock_ticks(),
            eat_mass_ratio: default_eat_mass_ratio(),
            eat_overlap: default_eat_overlap(),
            eat_transfer_ticks: default_eat_transfer_ticks(),
            merge_overlap: default_merge_overlap(),
            speed: default_player_speed(),
            split_boost: default_split_boost(),
        }
    }
}

fn default_player_start_mass() -> f64 {
    10.0
}
fn default_player_min_mass() -> f64 {
    5.0
}
fn default_player_min_split_mass() -> f64 {
    20.0
}
fn default_player_max_cells() -> usize {
    16
}
fn default_split_children_cap() -> usize {
    4
}
fn default_merge_lock_ticks() -> u32 {
    375
}
fn default_eat_mass_ratio() -> f64 {
    1.25
}
fn default_eat_overlap() -> f64 {
    0.4
}
fn default_eat_transfer_ticks() -> u32 {
    5
}
fn default_merge_overlap() -> f64 {
    0.5
}
fn default_player_speed() -> f64 {
    30.0
}
fn default_split_boost() -> f64 {
    400.0
}

/// Food pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Hard cap on live food (FoodLimit).
    #[serde(default = "default_food_limit")]
    pub limit: usize,
    /// Maximum new food per tick (FoodRespawnRatePerTick).
    #[serde(default = "default_food_spawn_per_tick")]
    pub spawn_per_tick: usize,
    #[serde(default = "default_food_mass")]
    pub mass: f64,
    /// Food seeded at session start.
    #[serde(default = "default_food_initial")]
    pub initial: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            limit: default_food_limit(),
            spawn_per_tick: default_food_spawn_per_tick(),
            mass: default_food_mass(),
            initial: default_food_initial(),
        }
    }
}

fn default_food_limit() -> usize {
    500
}
fn default_food_spawn_per_tick() -> usize {
    5
}
fn default_food_mass() -> f64 {
    1.0
}
fn default_food_initial() -> usize {
    100
}

/// Virus pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VirusConfig {
    /// Hard cap on live viruses (VirusLimit).
    #[serde(default = "default_virus_limit")]
    pub limit: usize,
    /// Ticks between single-virus top-ups (VirusRespawnInterval).
    #[serde(default = "default_virus_respawn_interval")]
    pub respawn_interval: u64,
    #[serde(default = "default_virus_mass")]
    pub mass: f64,
    /// Viruses seeded at session start.
    #[serde(default = "default_virus_initial")]
    pub initial: usize,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            limit: default_virus_limit(),
            respawn_interval: default_virus_respawn_interval(),
            mass: default_virus_mass(),
            initial: default_virus_initial(),
        }
    }
}

fn default_virus_limit() -> usize {
    25
}
fn default_virus_respawn_interval() -> u64 {
    250
}
fn default_virus_mass() -> f64 {
    100.0
}
fn default_virus_initial() -> usize {
    15
}

/// Scripted opponents (Solo only).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Opponents with the simple reactive policy.
    #[serde(default = "default_bots_per_tier")]
    pub simple: usize,
    /// Opponents with the pursuit/avoidance policy.
    #[serde(default = "default_bots_per_tier")]
    pub smart: usize,
    /// Ticks a dead opponent waits before respawning.
    #[serde(default = "default_bot_respawn_ticks")]
    pub respawn_ticks: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            simple: default_bots_per_tier(),
            smart: default_bots_per_tier(),
            respawn_ticks: default_bot_respawn_ticks(),
        }
    }
}

fn default_bots_per_tier() -> usize {
    4
}
fn default_bot_respawn_ticks() -> u64 {
    75
}

/// Transport adapter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetConfig {
    /// Bind address for the Authority.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Authority URL an Observer connects to.
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            url: default_url(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    11443
}
fn default_url() -> String {
    "ws://127.0.0.1:11443".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str("[food]\nlimit = 42\n").unwrap();
        assert_eq!(config.food.limit, 42);
        assert_eq!(config.food.spawn_per_tick, 5);
        assert_eq!(config.player.max_cells, 16);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_eat_ratio_at_most_one() {
        let err = Config::from_toml_str("[player]\neat_mass_ratio = 1.0\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::from_toml_str("[session]\nbroadcast_interval = 0\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_pools_too_large_to_broadcast() {
        let over = MAX_RECORDS as usize + 1;
        let text = format!("[food]\nlimit = {over}\ninitial = {over}\n");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));

        let err = Config::from_toml_str(&format!("[virus]\nlimit = {over}\n")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));

        let at_cap = format!("[food]\nlimit = {}\n", MAX_RECORDS);
        assert!(Config::from_toml_str(&at_cap).is_ok());
    }

    #[test]
    fn test_rejects_roster_too_large_to_broadcast() {
        let err = Config::from_toml_str("[bots]\nsimple = 5000\n[player]\nmax_cells = 16\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_defaults_survive_toml_roundtrip() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed.virus.limit, Config::default().virus.limit);
    }
}
