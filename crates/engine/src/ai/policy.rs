//! Steering policies shared by the opponents and the autopilot.
//!
//! Policies are pure: they see positions and masses and return a target.

use glam::Vec2;

/// Distance a fleeing cell aims past its own centre.
const FLEE_DISTANCE: f32 = 600.0;

/// Another player's cell as seen by a policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub position: Vec2,
    pub mass: f32,
}

/// Nearest point to `me`, if any.
pub fn nearest(me: Vec2, points: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
    points
        .into_iter()
        .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)))
}

/// Simple tier: head for the nearest food.
pub fn simple_target(me: Vec2, food: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
    nearest(me, food)
}

/// What a smart opponent decided this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmartDecision {
    Flee(Vec2),
    Chase(Vec2),
    Graze(Vec2),
}

impl SmartDecision {
    #[inline]
    pub fn target(&self) -> Vec2 {
        match *self {
            SmartDecision::Flee(t) | SmartDecision::Chase(t) | SmartDecision::Graze(t) => t,
        }
    }
}

/// Smart tier: flee the nearest threat in sight, else chase the nearest
/// prey in sight, else the nearest food.
pub fn smart_target(
    me: Vec2,
    my_mass: f32,
    others: &[Sighting],
    food: impl IntoIterator<Item = Vec2>,
    eat_ratio: f32,
    sight: f32,
) -> Option<SmartDecision> {
    let in_sight = |s: &&Sighting| s.position.distance(me) < sight;

    let threat = others
        .iter()
        .filter(in_sight)
        .filter(|s| s.mass >= my_mass * eat_ratio)
        .min_by(|a, b| a.position.distance_squared(me).total_cmp(&b.position.distance_squared(me)));
    if let Some(threat) = threat {
        let away = (me - threat.position).try_normalize().unwrap_or(Vec2::X);
        return Some(SmartDecision::Flee(me + away * FLEE_DISTANCE));
    }

    let prey = others
        .iter()
        .filter(in_sight)
        .filter(|s| my_mass >= s.mass * eat_ratio)
        .map(|s| s.position);
    if let Some(p) = nearest(me, prey) {
        return Some(SmartDecision::Chase(p));
    }

    nearest(me, food).map(SmartDecision::Graze)
}
