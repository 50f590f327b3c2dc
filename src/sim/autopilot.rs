//! Demo driver
//!
//! Measures the free road ahead in each lane, heads for the lane with the
//! most room (pickups break ties), and only slides through lanes with
//! enough room to cross before the next obstacle arrives.

use super::spawn::LaneSet;
use super::state::GameState;
use crate::center_lane;
use crate::consts::*;

/// Look-ahead distance at zero speed
const LOOKAHEAD_BASE: f32 = 40.0;
/// Extra look-ahead per unit of speed
const LOOKAHEAD_TICKS: f32 = 45.0;
/// Ticks of free road a lane needs before the car slides into it
const LANE_CHANGE_TICKS: f32 = 10.0;

fn lane_of(x: f32) -> usize {
    let lane = (x / LANE_WIDTH).round() + center_lane() as f32;
    lane.clamp(0.0, (LANE_COUNT - 1) as f32) as usize
}

/// Lane shift (-1, 0 or +1) toward the safest reachable lane
pub fn choose_shift(state: &GameState) -> i8 {
    let speed = state.session.speed;
    let horizon = LOOKAHEAD_BASE + speed * LOOKAHEAD_TICKS;
    // Free road before the nearest obstacle, per lane
    let mut gap = [f32::INFINITY; LANE_COUNT];
    let mut loot = [0u32; LANE_COUNT];

    for (_, e) in state.pool.iter_active() {
        let (half_width, reach) = e.kind.extents();
        let ahead = -e.pos.z;
        // Beyond the window, or already behind the car
        if ahead > horizon || ahead < -(reach + speed) {
            continue;
        }
        if e.kind.is_obstacle() {
            let lanes = LaneSet::covered(e.pos.x, half_width + PLAYER_HALF_WIDTH);
            let room = (ahead - reach).max(0.0);
            for (lane, free) in gap.iter_mut().enumerate() {
                if lanes.contains(lane) {
                    *free = free.min(room);
                }
            }
        } else if e.kind.is_pickup() && ahead > 0.0 {
            loot[lane_of(e.pos.x)] += 1;
        }
    }

    let current = state.player.lane;
    let passable = |lane: usize| gap[lane] > speed * LANE_CHANGE_TICKS;
    // Every lane entered on the way must be passable; staying is always allowed
    let reachable = |target: usize| {
        if target > current {
            (current + 1..=target).all(passable)
        } else {
            (target..current).all(passable)
        }
    };

    let best = (0..LANE_COUNT)
        .filter(|&lane| reachable(lane))
        .max_by_key(|&lane| {
            let clear = gap[lane].is_infinite();
            let room = if clear { 0 } else { gap[lane] as i64 };
            let detour = current.abs_diff(lane) as i64;
            // Clear road first, then the longest gap, then loot, then staying
            // put; ties go to the lower lane
            (clear, room, loot[lane] as i64 * 4 - detour, -(lane as i64))
        });

    match best {
        Some(target) if target > current => 1,
        Some(target) if target < current => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane_x;
    use crate::sim::state::{EntityKind, RunModifiers};
    use glam::Vec3;

    fn playing() -> GameState {
        let mut state = GameState::new(2);
        state.start(RunModifiers::default()).unwrap();
        state
    }

    #[test]
    fn test_stays_put_on_empty_road() {
        let state = playing();
        assert_eq!(choose_shift(&state), 0);
    }

    #[test]
    fn test_dodges_obstacle_ahead() {
        let mut state = playing();
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(1), 0.0, -30.0));
        // Both neighbours are clear; ties go to the lower lane
        assert_eq!(choose_shift(&state), -1);
    }

    #[test]
    fn test_leaves_own_lane_when_neighbour_blocked() {
        let mut state = playing();
        state.player.lane = 0;
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(0), 0.0, -40.0));
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(2), 0.0, -20.0));
        assert_eq!(choose_shift(&state), 1);
    }

    #[test]
    fn test_prefers_the_longest_gap() {
        let mut state = playing();
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(0), 0.0, -50.0));
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(1), 0.0, -20.0));
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(2), 0.0, -70.0));
        assert_eq!(choose_shift(&state), 1);
    }

    #[test]
    fn test_truck_blocks_both_lanes_it_straddles() {
        let mut state = playing();
        state.player.lane = 2;
        state.spawn_at(EntityKind::Truck, Vec3::new(lane_x(0) + LANE_WIDTH * 0.5, 0.0, -40.0));
        state.spawn_at(EntityKind::Coin, Vec3::new(lane_x(0), 1.0, -30.0));
        assert_eq!(choose_shift(&state), 0);
    }

    #[test]
    fn test_goes_for_loot() {
        let mut state = playing();
        state.spawn_at(EntityKind::Coin, Vec3::new(lane_x(2), 1.0, -30.0));
        assert_eq!(choose_shift(&state), 1);
    }

    #[test]
    fn test_never_crosses_blocked_lane() {
        let mut state = playing();
        state.player.lane = 0;
        // Too close to slide through at this speed
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(1), 0.0, -8.0));
        state.spawn_at(EntityKind::Coin, Vec3::new(lane_x(2), 1.0, -30.0));
        assert_eq!(choose_shift(&state), 0);
    }
}
