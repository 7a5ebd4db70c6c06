//! Headless local input: graze with the simple policy, split when big,
//! respawn after game over.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::policy;
use crate::entity::PlayerId;
use crate::runtime::InputSource;
use crate::session::{FrameInput, TickOutput};

/// Chance per tick of splitting once a cell is big enough.
const SPLIT_CHANCE: f64 = 0.02;

/// Drives the local player from the previous tick's output.
#[derive(Debug)]
pub struct Autopilot {
    /// Largest own cell must reach this before a split is considered.
    split_mass: f32,
    rng: StdRng,
}

impl Autopilot {
    pub fn new(min_split_mass: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            split_mass: min_split_mass * 2.0,
            rng,
        }
    }

    fn wants_split(&mut self, out: &TickOutput, pid: PlayerId) -> bool {
        let largest = out
            .snapshot
            .cells
            .iter()
            .filter(|c| c.owner == pid)
            .map(|c| c.mass)
            .fold(0.0, f32::max);
        largest >= self.split_mass && self.rng.random_bool(SPLIT_CHANCE)
    }
}

impl InputSource for Autopilot {
    fn next_input(&mut self, last: Option<&TickOutput>) -> FrameInput {
        let Some(out) = last else {
            return FrameInput::default();
        };
        if out.game_over {
            return FrameInput {
                respawn: true,
                ..Default::default()
            };
        }
        let Some(pid) = out.local_player else {
            return FrameInput::default();
        };
        FrameInput {
            target: policy::simple_target(out.camera, out.snapshot.food.iter().map(|f| f.position)),
            split: self.wants_split(out, pid),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;
    use glam::Vec2;
    use protocol::{CellRecord, PelletRecord};

    fn output(pid: u32, mass: f32) -> TickOutput {
        let mut out = TickOutput {
            phase: Phase::Running,
            local_player: Some(pid),
            ..Default::default()
        };
        out.snapshot.cells.push(CellRecord {
            id: 10,
            owner: pid,
            position: Vec2::ZERO,
            mass,
        });
        for (id, x) in [(20, 300.0), (21, -50.0)] {
            out.snapshot.food.push(PelletRecord {
                id,
                position: Vec2::new(x, 0.0),
                mass: 1.0,
            });
        }
        out
    }

    #[test]
    fn test_heads_for_nearest_food() {
        let mut pilot = Autopilot::new(20.0, Some(1));
        let input = pilot.next_input(Some(&output(1, 10.0)));
        assert_eq!(input.target, Some(Vec2::new(-50.0, 0.0)));
        assert!(!input.split);
    }

    #[test]
    fn test_respawns_after_game_over() {
        let mut pilot = Autopilot::new(20.0, Some(1));
        let out = TickOutput {
            phase: Phase::GameOver,
            game_over: true,
            ..Default::default()
        };
        assert!(pilot.next_input(Some(&out)).respawn);
        assert_eq!(pilot.next_input(None), FrameInput::default());
    }

    #[test]
    fn test_small_cells_never_split() {
        let mut pilot = Autopilot::new(20.0, Some(3));
        let out = output(1, 39.0);
        assert!((0..500).all(|_| !pilot.next_input(Some(&out)).split));

        let big = output(1, 400.0);
        assert!((0..500).any(|_| pilot.next_input(Some(&big)).split));
    }
}
