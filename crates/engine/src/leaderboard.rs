//! Ranked snapshot of live players by total mass.

use protocol::RankRecord;

use crate::world::World;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f32,
}

impl From<&LeaderboardEntry> for RankRecord {
    fn from(entry: &LeaderboardEntry) -> Self {
        RankRecord {
            name: entry.name.clone(),
            score: entry.score,
        }
    }
}

impl From<&RankRecord> for LeaderboardEntry {
    fn from(record: &RankRecord) -> Self {
        LeaderboardEntry {
            name: record.name.clone(),
            score: record.score,
        }
    }
}

/// Periodically rebuilt ranking. Never patched in place.
#[derive(Debug, Default, Clone)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    computed_at: Option<u64>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch: live players, descending score, ties kept in
    /// creation order.
    pub fn recompute(&mut self, world: &World, tick: u64) {
        let mut entries: Vec<LeaderboardEntry> = world
            .players
            .values()
            .filter(|p| !p.is_dead())
            .map(|p| LeaderboardEntry {
                name: p.display_name().to_string(),
                score: world.total_mass(p.id),
            })
            .collect();
        // sort_by is stable
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.entries = entries;
        self.computed_at = Some(tick);
    }

    #[inline]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Tick of the last recompute.
    #[inline]
    pub fn computed_at(&self) -> Option<u64> {
        self.computed_at
    }

    pub fn to_records(&self) -> Vec<RankRecord> {
        self.entries.iter().map(RankRecord::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Controller;
    use crate::world::tests::empty_config;
    use glam::Vec2;

    #[test]
    fn test_ties_keep_creation_order() {
        let mut world = World::new(&empty_config());
        for (name, mass) in [("A", 30.0), ("B", 10.0), ("C", 30.0)] {
            let p = world.add_player(name.into(), Controller::Bot);
            world.add_cell(p, Vec2::ZERO, mass);
        }

        let mut board = Leaderboard::new();
        board.recompute(&world, 25);
        let names: Vec<_> = board.entries().iter().map(|e| e.name.as_str()).collect();
        let scores: Vec<_> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
        assert_eq!(scores, vec![30.0, 30.0, 10.0]);
        assert_eq!(board.computed_at(), Some(25));
    }

    #[test]
    fn test_dead_players_excluded_and_sorted() {
        let mut world = World::new(&empty_config());
        world.add_player("ghost".into(), Controller::Bot);
        for mass in [5.0, 50.0, 20.0, 35.0] {
            let p = world.add_player(String::new(), Controller::Bot);
            world.add_cell(p, Vec2::ZERO, mass);
        }

        let mut board = Leaderboard::new();
        board.recompute(&world, 1);
        assert_eq!(board.entries().len(), 4);
        assert!(board.entries().windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(board.entries()[0].name, "An unnamed cell");
    }
}
