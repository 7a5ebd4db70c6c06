//! Per-tick movement: steering toward targets, split boosts, floating
//! drift, border clamping and sibling push-apart.

use glam::Vec2;

use crate::config::PlayerConfig;
use crate::entity::{radius_of_mass, NodeId};
use crate::world::{World, WorldBorder};

/// Distance to the target at which a cell reaches full speed.
const SATURATION_DISTANCE: f32 = 32.0;
/// Floating velocity is multiplied by this each tick.
const FLOAT_DECAY: f32 = 0.9;
/// Push-apart passes per tick.
const RIGID_PASSES: usize = 2;

/// Full speed of a cell of the given radius.
#[inline]
pub fn max_speed(radius: f32, speed: f32) -> f32 {
    2.2 * radius.powf(-0.439) * 40.0 * (speed / 30.0)
}

/// Displacement of one tick toward `target`, or `None` when already there.
pub fn step_toward(position: Vec2, mass: f32, target: Vec2, speed: f32) -> Option<Vec2> {
    let delta = target - position;
    let dist = delta.length();
    if dist < 1.0 {
        return None;
    }
    let v = max_speed(radius_of_mass(mass), speed) * (dist.min(SATURATION_DISTANCE) / SATURATION_DISTANCE);
    Some(delta / dist * v)
}

/// Move every cell once.
pub fn move_cells(world: &mut World, cfg: &PlayerConfig) {
    let speed = cfg.speed as f32;
    let border = world.border;

    for player in world.players.values() {
        for cell_id in &player.cells {
            let Some(cell) = world.cells.get_mut(cell_id) else {
                continue;
            };
            cell.tick_merge_lock();
            if cell.update_boost() {
                cell.check_border(border.min(), border.max());
                continue;
            }
            match player.target {
                Some(target) => {
                    cell.velocity = step_toward(cell.position, cell.mass(), target, speed).unwrap_or(Vec2::ZERO);
                }
                None => {
                    cell.velocity *= FLOAT_DECAY;
                    if cell.velocity.length_squared() < 0.01 {
                        cell.velocity = Vec2::ZERO;
                    }
                }
            }
            cell.position += cell.velocity;
            cell.check_border(border.min(), border.max());
        }
    }

    push_apart(world, &border);
}

/// Separate overlapping cells of one player that may not merge yet.
/// Boosting cells are left alone so split launches are not disturbed.
fn push_apart(world: &mut World, border: &WorldBorder) {
    struct Body {
        id: NodeId,
        position: Vec2,
        radius: f32,
        mass: f32,
        rigid: bool,
    }

    let owners: Vec<Vec<NodeId>> = world
        .players
        .values()
        .filter(|p| p.cells.len() > 1)
        .map(|p| p.cells.clone())
        .collect();

    for ids in owners {
        let mut bodies: Vec<Body> = ids
            .iter()
            .filter_map(|id| world.cells.get(id))
            .map(|c| Body {
                id: c.id,
                position: c.position,
                radius: c.radius(),
                mass: c.mass(),
                rigid: c.boost.is_none(),
            })
            .collect();
        let locked: Vec<bool> = ids
            .iter()
            .filter_map(|id| world.cells.get(id))
            .map(|c| c.is_merge_locked())
            .collect();

        for _ in 0..RIGID_PASSES {
            for i in 0..bodies.len() {
                for j in (i + 1)..bodies.len() {
                    if !(locked[i] || locked[j]) || !(bodies[i].rigid && bodies[j].rigid) {
                        continue;
                    }
                    let delta = bodies[j].position - bodies[i].position;
                    let dist = delta.length();
                    let overlap = bodies[i].radius + bodies[j].radius - dist;
                    if overlap <= 0.0 {
                        continue;
                    }
                    let dir = if dist > 0.0 { delta / dist } else { Vec2::X };
                    let (mi, mj) = (bodies[i].mass, bodies[j].mass);
                    let total = mi + mj;
                    bodies[i].position -= dir * overlap * (mj / total);
                    bodies[j].position += dir * overlap * (mi / total);
                }
            }
        }

        for body in bodies {
            if let Some(cell) = world.cells.get_mut(&body.id) {
                cell.position = body.position;
                cell.check_border(border.min(), border.max());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Controller;
    use crate::world::tests::empty_config;

    #[test]
    fn test_small_cells_are_faster() {
        assert!(max_speed(radius_of_mass(10.0), 30.0) > max_speed(radius_of_mass(100.0), 30.0));
    }

    #[test]
    fn test_step_toward_saturates_and_stops() {
        let near = step_toward(Vec2::ZERO, 10.0, Vec2::new(8.0, 0.0), 30.0).unwrap();
        let far = step_toward(Vec2::ZERO, 10.0, Vec2::new(800.0, 0.0), 30.0).unwrap();
        assert!(near.x < far.x);
        assert_eq!(far.y, 0.0);
        assert!(step_toward(Vec2::ZERO, 10.0, Vec2::new(0.5, 0.0), 30.0).is_none());
    }

    #[test]
    fn test_cell_moves_toward_target() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = world.add_player("a".into(), Controller::Local);
        let c = world.add_cell(p, Vec2::ZERO, 10.0).unwrap();
        world.player_mut(p).unwrap().target = Some(Vec2::new(500.0, 0.0));

        move_cells(&mut world, &config.player);
        let x = world.cells[&c].position.x;
        assert!(x > 0.0);
    }

    #[test]
    fn test_floating_decays_velocity() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = world.add_player("a".into(), Controller::Local);
        let c = world.add_cell(p, Vec2::ZERO, 10.0).unwrap();
        world.cells.get_mut(&c).unwrap().velocity = Vec2::new(10.0, 0.0);

        move_cells(&mut world, &config.player);
        let first = world.cells[&c].position.x;
        move_cells(&mut world, &config.player);
        let second = world.cells[&c].position.x - first;
        assert!((first - 9.0).abs() < 1e-4);
        assert!(second < first);
    }

    #[test]
    fn test_locked_siblings_pushed_apart() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = world.add_player("a".into(), Controller::Local);
        let a = world.add_cell(p, Vec2::ZERO, 25.0).unwrap();
        let b = world.add_cell(p, Vec2::new(10.0, 0.0), 25.0).unwrap();
        for id in [a, b] {
            world.cells.get_mut(&id).unwrap().merge_lock = 100;
        }

        move_cells(&mut world, &config.player);
        let gap = world.cells[&b].position.x - world.cells[&a].position.x;
        assert!(gap > 10.0);
    }

    #[test]
    fn test_push_apart_moves_lighter_cell_further() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = world.add_player("a".into(), Controller::Local);
        let heavy = world.add_cell(p, Vec2::ZERO, 100.0).unwrap();
        let light = world.add_cell(p, Vec2::new(10.0, 0.0), 25.0).unwrap();
        for id in [heavy, light] {
            world.cells.get_mut(&id).unwrap().merge_lock = 100;
        }

        move_cells(&mut world, &config.player);
        let heavy_x = world.cells[&heavy].position.x;
        let light_x = world.cells[&light].position.x;
        // Radii 100 and 50 overlap by 140, split 1:4 by mass.
        assert!((heavy_x + 28.0).abs() < 1e-3);
        assert!((light_x - 122.0).abs() < 1e-3);
    }

    #[test]
    fn test_unlocked_siblings_may_overlap() {
        let config = empty_config();
        let mut world = World::new(&config);
        let p = world.add_player("a".into(), Controller::Local);
        let a = world.add_cell(p, Vec2::ZERO, 25.0).unwrap();
        let b = world.add_cell(p, Vec2::new(10.0, 0.0), 25.0).unwrap();

        move_cells(&mut world, &config.player);
        let gap = world.cells[&b].position.x - world.cells[&a].position.x;
        assert!((gap - 10.0).abs() < 1e-4);
    }
}
