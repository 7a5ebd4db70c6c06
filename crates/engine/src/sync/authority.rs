//! Authority-side handling of peer events and broadcast cadence.

use std::collections::BTreeMap;

use protocol::{Intent, StateBroadcast};
use tracing::{debug, info};

use super::{PeerEvent, PeerId};
use crate::config::Config;
use crate::entity::{Controller, PlayerId};
use crate::session::Simulation;

/// Which peer steers which player, plus broadcast bookkeeping.
#[derive(Debug, Default)]
pub struct AuthorityState {
    peers: BTreeMap<PeerId, Option<PlayerId>>,
    /// Leaderboard recompute tick already sent to observers.
    sent_leaderboard: Option<u64>,
}

impl AuthorityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player currently owned by `peer`.
    pub fn player_of(&self, peer: PeerId) -> Option<PlayerId> {
        self.peers.get(&peer).copied().flatten()
    }

    /// Apply one event. Invalid intents are ignored.
    pub fn apply(&mut self, sim: &mut Simulation, event: PeerEvent, config: &Config) {
        match event {
            PeerEvent::Joined(peer) => {
                info!("Observer {} connected", peer);
                self.peers.entry(peer).or_insert(None);
            }
            PeerEvent::Left(peer) => {
                info!("Observer {} disconnected", peer);
                if let Some(pid) = self.peers.remove(&peer).flatten() {
                    sim.world.remove_player(pid);
                }
            }
            PeerEvent::Intent(peer, intent) => self.apply_intent(sim, peer, intent, config),
        }
    }

    fn apply_intent(&mut self, sim: &mut Simulation, peer: PeerId, intent: Intent, config: &Config) {
        let alive = self.player_of(peer).filter(|&pid| !sim.world.is_dead(pid));

        match (intent, alive) {
            (Intent::SpawnRequest { ticket, name }, None) => {
                let name: String = name.chars().take(config.session.max_name_length).collect();
                let pid = sim.spawn_player(name, Controller::Peer(peer), config);
                if let Some(player) = sim.world.player_mut(pid) {
                    player.ticket = ticket;
                }
                self.peers.insert(peer, Some(pid));
            }
            (Intent::SpawnRequest { .. }, Some(pid)) => {
                debug!("Ignoring spawn request from {}: player {} is alive", peer, pid);
            }
            (Intent::Move { target }, Some(pid)) => {
                let target = sim.world.border.clamp(target);
                if let Some(player) = sim.world.player_mut(pid) {
                    player.target = Some(target);
                }
            }
            (Intent::Floating, Some(pid)) => {
                if let Some(player) = sim.world.player_mut(pid) {
                    player.target = None;
                }
            }
            (Intent::Split, Some(pid)) => {
                sim.split(pid, config);
            }
            (intent, None) => {
                debug!("Ignoring {:?} from {}: no live player", intent.opcode(), peer);
            }
        }
    }

    /// Build the broadcast for this tick if one is due. Carries the
    /// leaderboard when it was recomputed since the last one sent.
    pub fn broadcast_due(&mut self, sim: &Simulation, config: &Config) -> Option<StateBroadcast> {
        let tick = sim.tick();
        if tick % config.session.broadcast_interval != 0 {
            return None;
        }
        let mut state = sim.world.snapshot(tick);
        let computed = sim.leaderboard.computed_at();
        if computed.is_some() && computed != self.sent_leaderboard {
            state.leaderboard = Some(sim.leaderboard.to_records());
            self.sent_leaderboard = computed;
        }
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::empty_config;
    use protocol::Position;

    fn spawned(config: &Config) -> (Simulation, AuthorityState, PlayerId) {
        let mut sim = Simulation::new(config);
        let mut auth = AuthorityState::new();
        auth.apply(&mut sim, PeerEvent::Joined(1), config);
        auth.apply(
            &mut sim,
            PeerEvent::Intent(
                1,
                Intent::SpawnRequest {
                    ticket: 77,
                    name: "observer".into(),
                },
            ),
            config,
        );
        let pid = auth.player_of(1).unwrap();
        (sim, auth, pid)
    }

    #[test]
    fn test_spawn_request_creates_player_once() {
        let config = empty_config();
        let (mut sim, mut auth, pid) = spawned(&config);
        assert_eq!(sim.world.player(pid).unwrap().ticket, 77);

        auth.apply(
            &mut sim,
            PeerEvent::Intent(
                1,
                Intent::SpawnRequest {
                    ticket: 78,
                    name: "again".into(),
                },
            ),
            &config,
        );
        assert_eq!(sim.world.players.len(), 1);
        assert_eq!(auth.player_of(1), Some(pid));
    }

    #[test]
    fn test_long_names_are_truncated() {
        let mut config = empty_config();
        config.session.max_name_length = 4;
        let mut sim = Simulation::new(&config);
        let mut auth = AuthorityState::new();
        auth.apply(
            &mut sim,
            PeerEvent::Intent(
                3,
                Intent::SpawnRequest {
                    ticket: 1,
                    name: "abcdefgh".into(),
                },
            ),
            &config,
        );
        let pid = auth.player_of(3).unwrap();
        assert_eq!(sim.world.player(pid).unwrap().name, "abcd");
    }

    #[test]
    fn test_floating_clears_target() {
        let config = empty_config();
        let (mut sim, mut auth, pid) = spawned(&config);
        auth.apply(
            &mut sim,
            PeerEvent::Intent(
                1,
                Intent::Move {
                    target: Position::new(50.0, 50.0),
                },
            ),
            &config,
        );
        assert_eq!(sim.world.player(pid).unwrap().target, Some(Position::new(50.0, 50.0)));

        auth.apply(&mut sim, PeerEvent::Intent(1, Intent::Floating), &config);
        sim.step(&config);
        assert_eq!(sim.world.player(pid).unwrap().target, None);
    }

    #[test]
    fn test_move_target_is_clamped() {
        let config = empty_config();
        let (mut sim, mut auth, pid) = spawned(&config);
        auth.apply(
            &mut sim,
            PeerEvent::Intent(
                1,
                Intent::Move {
                    target: Position::new(1e9, -1e9),
                },
            ),
            &config,
        );
        assert_eq!(sim.world.player(pid).unwrap().target, Some(Position::new(3000.0, -3000.0)));
    }

    #[test]
    fn test_intents_without_player_are_ignored() {
        let config = empty_config();
        let mut sim = Simulation::new(&config);
        let mut auth = AuthorityState::new();
        auth.apply(&mut sim, PeerEvent::Intent(5, Intent::Split), &config);
        auth.apply(&mut sim, PeerEvent::Intent(5, Intent::Floating), &config);
        assert!(sim.world.players.is_empty());
    }

    #[test]
    fn test_leaving_removes_player() {
        let config = empty_config();
        let (mut sim, mut auth, pid) = spawned(&config);
        auth.apply(&mut sim, PeerEvent::Left(1), &config);
        assert!(sim.world.player(pid).is_none());
        assert_eq!(auth.player_of(1), None);
    }

    #[test]
    fn test_leaderboard_sent_once_per_recompute() {
        let mut config = empty_config();
        config.session.broadcast_interval = 1;
        config.session.leaderboard_interval = 2;
        let (mut sim, mut auth, _) = spawned(&config);

        sim.step(&config);
        assert!(auth.broadcast_due(&sim, &config).unwrap().leaderboard.is_none());
        sim.step(&config);
        assert!(auth.broadcast_due(&sim, &config).unwrap().leaderboard.is_some());
        sim.step(&config);
        assert!(auth.broadcast_due(&sim, &config).unwrap().leaderboard.is_none());
    }

    #[test]
    fn test_broadcast_cadence() {
        let mut config = empty_config();
        config.session.broadcast_interval = 3;
        let (mut sim, mut auth, _) = spawned(&config);
        let sent: Vec<u64> = (0..9)
            .filter_map(|_| {
                sim.step(&config);
                auth.broadcast_due(&sim, &config).map(|b| b.tick)
            })
            .collect();
        assert_eq!(sent, vec![3, 6, 9]);
    }
}
