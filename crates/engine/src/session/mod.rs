//! Session lifecycle: role, phase, local player and per-tick orchestration.
//!
//! Phases move `Lobby -> Running <-> Paused`, `Running -> GameOver ->
//! Running` (on respawn). The role is fixed at construction.

mod simulation;

pub use simulation::{Simulation, StepReport};

use glam::Vec2;
use protocol::{Intent, StateBroadcast};
use rand::Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::entity::{Controller, PlayerId};
use crate::leaderboard::LeaderboardEntry;
use crate::sync::{AuthorityLink, AuthorityState, MirrorUpdate, ObserverLink, ObserverMirror};
use crate::world::{World, WorldBorder};

/// Role of this process for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Solo,
    Authority,
    Observer,
}

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Lobby,
    Running,
    Paused,
    GameOver,
}

/// A role together with the link it talks through.
#[derive(Debug)]
pub enum SessionRole {
    Solo,
    Authority(AuthorityLink),
    Observer(ObserverLink),
}

/// Resolved input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Movement target; `None` means floating.
    pub target: Option<Vec2>,
    pub split: bool,
    /// Toggle pause.
    pub pause: bool,
    /// Respawn if the local player is dead.
    pub respawn: bool,
}

/// Everything the presentation layer needs after a tick.
#[derive(Debug, Clone, Default)]
pub struct TickOutput {
    /// Authoritative tick this output reflects (last applied one for Observers).
    pub tick: u64,
    pub phase: Phase,
    pub local_player: Option<PlayerId>,
    pub score: f32,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub snapshot: StateBroadcast,
    pub camera: Vec2,
    pub game_over: bool,
    pub paused: bool,
    /// Observer sent a spawn request that no broadcast has answered yet.
    pub awaiting_spawn: bool,
}

/// What a session left behind when it was torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Local ticks run.
    pub ticks: u64,
    /// Link messages still queued at teardown and dropped unprocessed.
    pub discarded: usize,
}

#[derive(Debug)]
enum Backend {
    Solo(Simulation),
    Authority {
        sim: Simulation,
        link: AuthorityLink,
        state: AuthorityState,
    },
    Observer {
        mirror: ObserverMirror,
        link: ObserverLink,
    },
}

/// Owns all tick-scoped state for one participant.
#[derive(Debug)]
pub struct SessionController {
    config: Config,
    phase: Phase,
    local_player: Option<PlayerId>,
    backend: Backend,
    local_tick: u64,
}

impl SessionController {
    pub fn new(config: Config, role: SessionRole) -> Self {
        let backend = match role {
            SessionRole::Solo => Backend::Solo(Simulation::new(&config)),
            SessionRole::Authority(link) => Backend::Authority {
                sim: Simulation::new(&config),
                link,
                state: AuthorityState::new(),
            },
            SessionRole::Observer(link) => {
                let border = WorldBorder::new(config.border.width as f32, config.border.height as f32);
                Backend::Observer {
                    mirror: ObserverMirror::new(border),
                    link,
                }
            }
        };
        Self {
            config,
            phase: Phase::Lobby,
            local_player: None,
            backend,
            local_tick: 0,
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        match self.backend {
            Backend::Solo(_) => Role::Solo,
            Backend::Authority { .. } => Role::Authority,
            Backend::Observer { .. } => Role::Observer,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Local player id, if one exists (confirmed one for Observers).
    #[inline]
    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    /// Canonical world (Solo and Authority only).
    pub fn world(&self) -> Option<&World> {
        self.simulation().map(|s| &s.world)
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.simulation_mut().map(|s| &mut s.world)
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        match &self.backend {
            Backend::Solo(sim) | Backend::Authority { sim, .. } => Some(sim),
            Backend::Observer { .. } => None,
        }
    }

    pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
        match &mut self.backend {
            Backend::Solo(sim) | Backend::Authority { sim, .. } => Some(sim),
            Backend::Observer { .. } => None,
        }
    }

    /// Observer replica (Observer only).
    pub fn mirror(&self) -> Option<&ObserverMirror> {
        match &self.backend {
            Backend::Observer { mirror, .. } => Some(mirror),
            _ => None,
        }
    }

    /// Leave the lobby: populate the world and spawn the local player
    /// (Solo/Authority), or ask the Authority for one (Observer).
    pub fn start(&mut self) {
        if self.phase != Phase::Lobby {
            return;
        }
        let name = self.config.session.player_name.clone();
        match &mut self.backend {
            Backend::Solo(sim) => {
                sim.populate(&self.config, true);
                self.local_player = Some(sim.spawn_player(name, Controller::Local, &self.config));
            }
            Backend::Authority { sim, .. } => {
                sim.populate(&self.config, false);
                self.local_player = Some(sim.spawn_player(name, Controller::Local, &self.config));
            }
            Backend::Observer { mirror, link } => {
                request_spawn(mirror, link, name);
            }
        }
        self.phase = Phase::Running;
        info!("Session started as {:?}", self.role());
    }

    /// Running -> Paused. In Solo the world freezes; otherwise it keeps going.
    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            info!("Session paused");
        }
    }

    /// Paused -> Running.
    pub fn resume(&mut self) {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            info!("Session resumed");
        }
    }

    /// Create a new local player if there is none alive. Observers send a
    /// spawn request and wait for a broadcast to confirm it.
    pub fn respawn(&mut self) {
        if self.phase == Phase::Lobby {
            return;
        }
        let name = self.config.session.player_name.clone();
        match &mut self.backend {
            Backend::Solo(sim) | Backend::Authority { sim, .. } => {
                if self.local_player.is_some_and(|pid| !sim.world.is_dead(pid)) {
                    return;
                }
                self.local_player = Some(sim.spawn_player(name, Controller::Local, &self.config));
            }
            Backend::Observer { mirror, link } => {
                if self.local_player.is_some() || mirror.awaiting_spawn() {
                    return;
                }
                request_spawn(mirror, link, name);
            }
        }
        self.phase = Phase::Running;
        info!("Local player respawning");
    }

    /// Run one tick with the given input.
    pub fn tick(&mut self, input: FrameInput) -> TickOutput {
        if self.phase == Phase::Lobby {
            return self.output();
        }
        if input.pause {
            match self.phase {
                Phase::Running => self.pause(),
                Phase::Paused => self.resume(),
                _ => {}
            }
        }
        if input.respawn && self.phase == Phase::GameOver {
            self.respawn();
        }
        self.local_tick += 1;

        // Paused or dead participants contribute no input.
        let active = self.phase == Phase::Running;
        let target = input.target.filter(|_| active);
        let split = input.split && active;

        match &mut self.backend {
            Backend::Solo(sim) => {
                if self.phase != Phase::Paused {
                    apply_local(sim, self.local_player, target, split, &self.config);
                    sim.step(&self.config);
                }
            }
            Backend::Authority { sim, link, state } => {
                for event in link.drain() {
                    state.apply(sim, event, &self.config);
                }
                apply_local(sim, self.local_player, target, split, &self.config);
                sim.step(&self.config);
                if let Some(broadcast) = state.broadcast_due(sim, &self.config) {
                    let _ = link.send(broadcast);
                }
            }
            Backend::Observer { mirror, link } => {
                for broadcast in link.drain() {
                    match mirror.apply(broadcast) {
                        MirrorUpdate::Confirmed(pid) => {
                            info!("Spawn confirmed as player {}", pid);
                            self.local_player = Some(pid);
                        }
                        MirrorUpdate::Eliminated(pid) => {
                            info!("Player {} eliminated", pid);
                            self.local_player = None;
                        }
                        MirrorUpdate::Stale | MirrorUpdate::Applied => {}
                    }
                }
                if self.phase != Phase::GameOver || mirror.awaiting_spawn() {
                    let intent = match target {
                        Some(target) => Intent::Move { target },
                        None => Intent::Floating,
                    };
                    let _ = link.send(intent);
                    if split && self.local_player.is_some() {
                        let _ = link.send(Intent::Split);
                    }
                }
                mirror.advance_display(target, self.config.player.speed as f32);
            }
        }

        self.check_game_over();
        self.output()
    }

    fn check_game_over(&mut self) {
        if !matches!(self.phase, Phase::Running | Phase::Paused) {
            return;
        }
        let dead = match &self.backend {
            Backend::Solo(sim) | Backend::Authority { sim, .. } => {
                self.local_player.is_none_or(|pid| sim.world.is_dead(pid))
            }
            Backend::Observer { mirror, .. } => self.local_player.is_none() && !mirror.awaiting_spawn(),
        };
        if dead {
            self.local_player = None;
            self.phase = Phase::GameOver;
            info!("Game over");
        }
    }

    /// Build the output for the current state.
    pub fn output(&self) -> TickOutput {
        let mut out = TickOutput {
            phase: self.phase,
            local_player: self.local_player,
            game_over: self.phase == Phase::GameOver,
            paused: self.phase == Phase::Paused,
            ..Default::default()
        };
        match &self.backend {
            Backend::Solo(sim) | Backend::Authority { sim, .. } => {
                let world = &sim.world;
                out.tick = sim.tick();
                out.score = self.local_player.map_or(0.0, |pid| world.total_mass(pid));
                out.leaderboard = sim.leaderboard.entries().to_vec();
                out.snapshot = world.snapshot(sim.tick());
                out.camera = self
                    .local_player
                    .and_then(|pid| world.center_position(pid))
                    .or_else(|| world.players.keys().find_map(|&pid| world.center_position(pid)))
                    .unwrap_or(Vec2::ZERO);
            }
            Backend::Observer { mirror, .. } => {
                out.tick = mirror.last_tick().unwrap_or(0);
                out.score = mirror.score();
                out.leaderboard = mirror.leaderboard().iter().map(LeaderboardEntry::from).collect();
                out.snapshot = mirror.display().cloned().unwrap_or_default();
                out.camera = mirror.center().unwrap_or(Vec2::ZERO);
                out.awaiting_spawn = mirror.awaiting_spawn();
            }
        }
        out
    }

    /// Tear the session down, discarding anything still queued.
    pub fn end(mut self) -> SessionSummary {
        let discarded = match &mut self.backend {
            Backend::Solo(sim) => {
                sim.clear_transients();
                0
            }
            Backend::Authority { sim, link, .. } => {
                sim.clear_transients();
                link.discard()
            }
            Backend::Observer { mirror, link, .. } => {
                mirror.clear();
                link.discard()
            }
        };
        debug!("Discarded {} queued messages", discarded);
        info!("Session ended after {} ticks", self.local_tick);
        SessionSummary {
            ticks: self.local_tick,
            discarded,
        }
    }
}

fn apply_local(sim: &mut Simulation, pid: Option<PlayerId>, target: Option<Vec2>, split: bool, config: &Config) {
    let Some(pid) = pid else {
        return;
    };
    let border = sim.world.border;
    if let Some(player) = sim.world.player_mut(pid) {
        player.target = target.map(|t| border.clamp(t));
    }
    if split {
        sim.split(pid, config);
    }
}

/// Tickets come from the OS-seeded thread RNG so that observers sharing a
/// configured world seed still pick distinct tickets.
fn request_spawn(mirror: &mut ObserverMirror, link: &ObserverLink, name: String) {
    let ticket = rand::rng().random_range(1..=u32::MAX);
    mirror.expect_spawn(ticket);
    let _ = link.send(Intent::SpawnRequest { ticket, name });
    debug!("Sent spawn request with ticket {}", ticket);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::LocalHub;
    use crate::world::tests::empty_config;

    fn solo(config: Config) -> SessionController {
        let mut session = SessionController::new(config, SessionRole::Solo);
        session.start();
        session
    }

    #[test]
    fn test_solo_food_is_scored_next_tick() {
        let mut session = solo(empty_config());
        let pid = session.local_player().unwrap();
        let world = session.world_mut().unwrap();
        let at = world.center_position(pid).unwrap();
        world.add_food(at, 1.0);

        assert_eq!(session.output().score, 10.0);
        let out = session.tick(FrameInput::default());
        assert_eq!(out.score, 11.0);
        assert!(!out.game_over);
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = SessionController::new(empty_config(), SessionRole::Solo);
        assert_eq!(session.phase(), Phase::Lobby);
        assert_eq!(session.tick(FrameInput::default()).tick, 0);

        session.start();
        assert_eq!(session.phase(), Phase::Running);
        session.pause();
        assert_eq!(session.phase(), Phase::Paused);
        session.resume();
        assert_eq!(session.phase(), Phase::Running);
    }

    #[test]
    fn test_solo_pause_freezes_ticks() {
        let mut session = solo(empty_config());
        session.tick(FrameInput::default());
        let out = session.tick(FrameInput {
            pause: true,
            ..Default::default()
        });
        assert!(out.paused);
        assert_eq!(out.tick, 1);
        assert_eq!(session.tick(FrameInput::default()).tick, 1);

        let out = session.tick(FrameInput {
            pause: true,
            ..Default::default()
        });
        assert!(!out.paused);
        assert_eq!(out.tick, 2);
    }

    #[test]
    fn test_authority_keeps_ticking_while_paused() {
        let (_hub, link) = LocalHub::new();
        let mut session = SessionController::new(empty_config(), SessionRole::Authority(link));
        session.start();
        session.pause();
        let out = session.tick(FrameInput::default());
        assert!(out.paused);
        assert_eq!(out.tick, 1);
    }

    #[test]
    fn test_game_over_and_respawn() {
        let mut session = solo(empty_config());
        let pid = session.local_player().unwrap();
        session.world_mut().unwrap().remove_player(pid);

        let out = session.tick(FrameInput::default());
        assert!(out.game_over);
        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(out.local_player, None);

        session.respawn();
        assert_eq!(session.phase(), Phase::Running);
        let again = session.local_player().unwrap();
        assert_ne!(again, pid);
        assert_eq!(session.output().score, 10.0);
    }

    #[test]
    fn test_solo_split_input() {
        let mut config = empty_config();
        config.player.start_mass = 100.0;
        let mut session = solo(config);
        let out = session.tick(FrameInput {
            target: Some(Vec2::new(100.0, 0.0)),
            split: true,
            ..Default::default()
        });
        let pid = out.local_player.unwrap();
        assert_eq!(out.snapshot.cells.iter().filter(|c| c.owner == pid).count(), 4);
        assert!((out.score - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_solo_spawns_roster() {
        let mut config = empty_config();
        config.bots.simple = 2;
        config.bots.smart = 1;
        let session = solo(config);
        assert_eq!(session.world().unwrap().players.len(), 4);
    }

    #[test]
    fn test_authority_split_reaches_both_observers() {
        let mut config = empty_config();
        config.session.broadcast_interval = 1;
        let (mut hub, link) = LocalHub::new();
        let (_, link_a) = hub.connect();
        let (_, link_b) = hub.connect();

        let mut authority = SessionController::new(config.clone(), SessionRole::Authority(link));
        let mut obs_a = SessionController::new(config.clone(), SessionRole::Observer(link_a));
        let mut obs_b = SessionController::new(config.clone(), SessionRole::Observer(link_b));
        authority.start();
        obs_a.start();
        obs_b.start();
        assert!(obs_a.output().awaiting_spawn);

        // Spawn requests reach the authority; the next broadcast confirms them.
        hub.pump();
        authority.tick(FrameInput::default());
        hub.pump();
        let out_a = obs_a.tick(FrameInput::default());
        obs_b.tick(FrameInput::default());
        let pid_a = out_a.local_player.expect("observer A confirmed");
        assert!(!out_a.awaiting_spawn);
        assert_ne!(obs_b.local_player(), Some(pid_a));

        // Give observer A a single 100-mass cell.
        {
            let world = authority.world_mut().unwrap();
            let cells = world.player(pid_a).unwrap().cells.clone();
            assert_eq!(cells.len(), 1);
            world.cells.get_mut(&cells[0]).unwrap().set_mass(100.0);
        }

        obs_a.tick(FrameInput {
            split: true,
            ..Default::default()
        });
        hub.pump();
        authority.tick(FrameInput::default());
        hub.pump();

        for observer in [&mut obs_a, &mut obs_b] {
            let out = observer.tick(FrameInput::default());
            let cells: Vec<_> = out.snapshot.cells.iter().filter(|c| c.owner == pid_a).collect();
            assert_eq!(cells.len(), 4);
            for cell in cells {
                assert!((cell.mass - 25.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_observer_game_over_when_player_vanishes() {
        let mut config = empty_config();
        config.session.broadcast_interval = 1;
        let (mut hub, link) = LocalHub::new();
        let (_, link_a) = hub.connect();
        let mut authority = SessionController::new(config.clone(), SessionRole::Authority(link));
        let mut observer = SessionController::new(config, SessionRole::Observer(link_a));
        authority.start();
        observer.start();

        hub.pump();
        authority.tick(FrameInput::default());
        hub.pump();
        let pid = observer.tick(FrameInput::default()).local_player.unwrap();

        authority.world_mut().unwrap().remove_player(pid);
        authority.tick(FrameInput::default());
        hub.pump();
        let out = observer.tick(FrameInput::default());
        assert!(out.game_over);

        observer.respawn();
        assert!(observer.output().awaiting_spawn);
        assert_eq!(observer.phase(), Phase::Running);
    }

    #[test]
    fn test_end_discards_queue() {
        let (mut hub, link) = LocalHub::new();
        let _ = hub.connect();
        let mut authority = SessionController::new(empty_config(), SessionRole::Authority(link));
        authority.start();
        authority.tick(FrameInput::default());
        // Arrive after the last tick and are never applied.
        let _ = hub.connect();
        let _ = hub.connect();

        let summary = authority.end();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.discarded, 2);
    }

    #[test]
    fn test_observer_end_discards_unread_broadcasts() {
        let (mut hub, authority_link) = LocalHub::new();
        let (_, observer_link) = hub.connect();
        let mut authority = SessionController::new(empty_config(), SessionRole::Authority(authority_link));
        let observer = SessionController::new(empty_config(), SessionRole::Observer(observer_link));
        authority.start();
        for _ in 0..6 {
            authority.tick(FrameInput::default());
        }
        hub.pump();

        let summary = observer.end();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.discarded, 2);
    }
}
