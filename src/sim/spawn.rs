//! Procedural spawning
//!
//! One spawn decision every `spawn_interval(speed)` ticks. Obstacles are only
//! committed if at least one lane near the spawn line stays open.

use glam::Vec3;
use rand::Rng;

use super::pool::Pool;
use super::state::{EntityKind, GameState, PowerUpKind};
use crate::consts::*;
use crate::{lane_pair_x, lane_x};

/// Ticks between spawns at the given speed
pub fn spawn_interval(speed: f32) -> u32 {
    let ticks = (BASE_SPAWN_INTERVAL / (speed.max(0.01) * SPAWN_SPEED_FACTOR)).floor();
    (ticks as u32).max(MIN_SPAWN_INTERVAL)
}

/// What a single roll turns into, before the fairness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnClass {
    PowerUp,
    Gem,
    Obstacle,
    Coin,
}

/// Classify a uniform roll in [0, 1). `gem_chance` widens the gem band.
pub fn classify(roll: f32, gem_chance: f32) -> SpawnClass {
    if roll > POWER_UP_ROLL {
        SpawnClass::PowerUp
    } else if roll > GEM_ROLL - gem_chance {
        SpawnClass::Gem
    } else if roll > OBSTACLE_ROLL {
        SpawnClass::Obstacle
    } else {
        SpawnClass::Coin
    }
}

/// Bit set of lane indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneSet(u8);

impl LaneSet {
    pub fn single(lane: usize) -> Self {
        Self(1 << lane)
    }

    /// Lanes whose centre lies within `half_width` of `x`
    pub fn covered(x: f32, half_width: f32) -> Self {
        let mut set = Self::default();
        for lane in 0..LANE_COUNT {
            if (lane_x(lane) - x).abs() < half_width {
                set.insert(lane);
            }
        }
        set
    }

    pub fn insert(&mut self, lane: usize) {
        self.0 |= 1 << lane;
    }

    pub fn contains(self, lane: usize) -> bool {
        self.0 & (1 << lane) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every lane is blocked
    pub fn is_full(self) -> bool {
        self.len() >= LANE_COUNT
    }
}

/// Lanes occupied by obstacles still close to the spawn line
pub fn occupied_lanes(pool: &Pool) -> LaneSet {
    pool.iter_active()
        .filter(|(_, e)| e.kind.is_obstacle() && e.pos.z < SPAWN_Z + FAIRNESS_WINDOW)
        .fold(LaneSet::default(), |set, (_, e)| {
            set.union(LaneSet::covered(e.pos.x, e.kind.extents().0))
        })
}

/// Adding `candidate` keeps at least one lane open
pub fn is_fair(occupied: LaneSet, candidate: LaneSet) -> bool {
    !occupied.union(candidate).is_full()
}

/// Final shape of an obstacle roll after the fairness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Truck straddling lanes `pair` and `pair + 1`
    Truck { pair: usize },
    Obstacle { lane: usize },
    /// Would have closed the road
    Coin { lane: usize },
}

/// Resolve an obstacle roll. A truck that would close the road falls back to a
/// single obstacle, and an obstacle that would close it falls back to a coin.
pub fn place_obstacle(lane: usize, truck_pair: Option<usize>, occupied: LaneSet) -> Placement {
    if let Some(pair) = truck_pair {
        let straddled = LaneSet::single(pair).union(LaneSet::single(pair + 1));
        if is_fair(occupied, straddled) {
            return Placement::Truck { pair };
        }
    }
    if is_fair(occupied, LaneSet::single(lane)) {
        Placement::Obstacle { lane }
    } else {
        Placement::Coin { lane }
    }
}

/// Lane pair a truck rolled on `lane` should straddle
fn truck_pair_for(lane: usize, prefer_left: bool) -> usize {
    let last_pair = LANE_COUNT - 2;
    let left = lane.saturating_sub(1).min(last_pair);
    let right = lane.min(last_pair);
    if prefer_left { left } else { right }
}

/// Spawn cadence state
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    ticks_since: u32,
}

impl Spawner {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count one tick; true when a spawn is due at this speed
    pub fn ready(&mut self, speed: f32) -> bool {
        self.ticks_since += 1;
        if self.ticks_since >= spawn_interval(speed) {
            self.ticks_since = 0;
            true
        } else {
            false
        }
    }
}

/// Run the spawn policy for one tick
pub fn update(state: &mut GameState) {
    if !state.spawner.ready(state.session.speed) {
        return;
    }

    let lane = state.rng.random_range(0..LANE_COUNT);
    let roll: f32 = state.rng.random();
    let at = |x: f32| Vec3::new(x, 0.0, SPAWN_Z);

    let (kind, x, power_up) = match classify(roll, state.modifiers.gem_chance) {
        SpawnClass::PowerUp => {
            let kind = if state.rng.random_bool(0.5) {
                PowerUpKind::Magnet
            } else {
                PowerUpKind::Shield
            };
            (EntityKind::PowerUp, lane_x(lane), Some(kind))
        }
        SpawnClass::Gem => (EntityKind::Gem, lane_x(lane), None),
        SpawnClass::Coin => (EntityKind::Coin, lane_x(lane), None),
        SpawnClass::Obstacle => {
            let truck_pair = state
                .rng
                .random_bool(TRUCK_CHANCE)
                .then(|| truck_pair_for(lane, state.rng.random_bool(0.5)));
            match place_obstacle(lane, truck_pair, occupied_lanes(&state.pool)) {
                Placement::Truck { pair } => (EntityKind::Truck, lane_pair_x(pair), None),
                Placement::Obstacle { lane } => (EntityKind::Obstacle, lane_x(lane), None),
                Placement::Coin { lane } => {
                    log::trace!("Lane {} would close the road, spawning coin", lane);
                    (EntityKind::Coin, lane_x(lane), None)
                }
            }
        }
    };

    let id = state.spawn_at(kind, at(x));
    if let Some(entity) = state.pool.get_mut(id) {
        entity.pos.y = kind.height();
        entity.power_up = power_up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RunModifiers;
    use proptest::prelude::*;

    #[test]
    fn test_interval_shrinks_with_speed() {
        assert_eq!(spawn_interval(0.8), 87);
        assert_eq!(spawn_interval(2.0), 35);
        assert_eq!(spawn_interval(7.0), 10);
        assert_eq!(spawn_interval(15.0), 10);
        assert!(spawn_interval(0.0) >= MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(0.97, 0.0), SpawnClass::PowerUp);
        assert_eq!(classify(0.93, 0.0), SpawnClass::Gem);
        assert_eq!(classify(0.91, 0.0), SpawnClass::Obstacle);
        assert_eq!(classify(0.91, 0.02), SpawnClass::Gem);
        assert_eq!(classify(0.5, 0.0), SpawnClass::Obstacle);
        assert_eq!(classify(0.1, 0.0), SpawnClass::Coin);
    }

    #[test]
    fn test_lane_coverage() {
        assert_eq!(LaneSet::covered(lane_x(0), 1.0), LaneSet::single(0));
        let truck = LaneSet::covered(lane_pair_x(1), 4.0);
        assert!(truck.contains(1) && truck.contains(2) && !truck.contains(0));
    }

    #[test]
    fn test_last_open_lane_becomes_coin() {
        let occupied = LaneSet::single(0).union(LaneSet::single(1));
        assert_eq!(place_obstacle(2, None, occupied), Placement::Coin { lane: 2 });
        // Stacking behind an existing obstacle is fine
        assert_eq!(place_obstacle(1, None, occupied), Placement::Obstacle { lane: 1 });
    }

    #[test]
    fn test_unfair_truck_degrades_to_obstacle() {
        let occupied = LaneSet::single(0);
        assert_eq!(place_obstacle(1, Some(1), occupied), Placement::Obstacle { lane: 1 });
        assert_eq!(place_obstacle(2, Some(1), LaneSet::default()), Placement::Truck { pair: 1 });
    }

    #[test]
    fn test_truck_pair_contains_lane() {
        assert_eq!(truck_pair_for(0, true), 0);
        assert_eq!(truck_pair_for(0, false), 0);
        assert_eq!(truck_pair_for(1, true), 0);
        assert_eq!(truck_pair_for(1, false), 1);
        assert_eq!(truck_pair_for(2, true), 1);
        assert_eq!(truck_pair_for(2, false), 1);
    }

    #[test]
    fn test_occupied_ignores_entities_past_window() {
        let mut state = GameState::new(1);
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(0), 0.0, SPAWN_Z));
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(1), 0.0, -100.0));
        state.spawn_at(EntityKind::Coin, Vec3::new(lane_x(2), 1.0, SPAWN_Z));
        assert_eq!(occupied_lanes(&state.pool), LaneSet::single(0));
    }

    #[test]
    fn test_spawner_cadence() {
        let mut spawner = Spawner::default();
        let due = (0..35).filter(|_| spawner.ready(2.0)).count();
        assert_eq!(due, 1);
    }

    proptest! {
        #[test]
        fn prop_spawning_never_closes_the_road(seed in any::<u64>(), speed in 0.8f32..15.0) {
            let mut state = GameState::new(seed);
            state.start(RunModifiers::default()).unwrap();
            state.session.speed = speed;
            for _ in 0..600 {
                update(&mut state);
                prop_assert!(!occupied_lanes(&state.pool).is_full());
                // Drift everything forward so the window keeps changing
                let mut ids = Vec::new();
                state.pool.ids_into(&mut ids);
                for id in ids {
                    if let Some(e) = state.pool.get_mut(id) {
                        e.pos.z += speed * if e.kind == EntityKind::Truck { TRUCK_SPEED_FACTOR } else { 1.0 };
                        if e.pos.z > DESPAWN_Z {
                            state.pool.release(id);
                        }
                    }
                }
            }
        }
    }
}
