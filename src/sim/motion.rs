//! Motion and integration
//!
//! Speed ramp, distance/score/multiplier accrual, steering, power-up timers,
//! road translation, magnet homing and particles. All per fixed tick.

use glam::Vec3;
use rand::Rng;

use super::state::{EntityKind, GameEvent, GameState};
use crate::consts::*;

/// Multiplier earned at `distance`, given the distance per step
pub fn multiplier_for(distance: f64, milestone: f64) -> u32 {
    if milestone <= 0.0 {
        return MAX_MULTIPLIER;
    }
    let steps = (distance.max(0.0) / milestone).floor();
    (steps as u32).saturating_add(1).min(MAX_MULTIPLIER)
}

/// Ramp speed toward the cap
pub fn ramp_speed(speed: f32, acceleration: f32, max_speed: f32) -> f32 {
    (speed + acceleration).min(max_speed)
}

/// Speed, distance, score, multiplier and fever for one tick
pub fn advance_run(state: &mut GameState) {
    let mods = state.modifiers;
    let session = &mut state.session;

    session.speed = ramp_speed(session.speed, mods.acceleration, mods.max_speed);
    session.distance += session.speed as f64;
    session.score += session.speed as f64 * SCORE_PER_SPEED;

    let earned = multiplier_for(session.distance, mods.milestone);
    if earned > session.multiplier {
        session.multiplier = earned;
        state.events.push(GameEvent::MultiplierUp {
            multiplier: earned,
        });
    }

    if session.multiplier >= MAX_MULTIPLIER && !session.fever_spent {
        session.fever_spent = true;
        session.fever_ticks = FEVER_TICKS;
        state.events.push(GameEvent::FeverStarted);
        log::debug!("Fever at distance {:.0}", session.distance);
    }
}

/// Translate world objects toward the player, pulling coins in under a magnet
pub fn move_entities(state: &mut GameState) {
    let speed = state.session.speed;
    let magnet = state.has_magnet();
    let player = state.player.pos();

    let mut ids = std::mem::take(&mut state.scratch);
    state.pool.ids_into(&mut ids);
    for &id in &ids {
        let Some(entity) = state.pool.get_mut(id) else {
            continue;
        };
        match entity.kind {
            EntityKind::Particle => {}
            EntityKind::Truck => entity.pos.z += speed * TRUCK_SPEED_FACTOR,
            EntityKind::Coin if magnet && entity.pos.distance(player) < MAGNET_RADIUS => {
                entity.pos = entity.pos.lerp(player, MAGNET_PULL);
            }
            _ => entity.pos.z += speed,
        }
    }
    state.scratch = ids;
}

/// Move particles by their velocity, apply gravity and retire dead ones
pub fn update_particles(state: &mut GameState) {
    let mut ids = std::mem::take(&mut state.scratch);
    state.pool.ids_into(&mut ids);
    for &id in &ids {
        let Some(p) = state.pool.get_mut(id) else {
            continue;
        };
        if p.kind != EntityKind::Particle {
            continue;
        }
        p.pos += p.vel;
        p.vel.y -= PARTICLE_GRAVITY;
        p.life -= PARTICLE_DECAY;
        if p.life <= 0.0 {
            state.pool.release(id);
        }
    }
    state.scratch = ids;
}

/// One driving tick of motion: run counters, steering, timers, world
pub fn step(state: &mut GameState) {
    advance_run(state);
    state.player.steer(state.modifiers.steer_rate);
    state.session.tick_power_ups();
    move_entities(state);
    update_particles(state);
}

/// Smoke while the crash animation plays
pub fn crash_effects(state: &mut GameState) {
    if state.rng.random_bool(CRASH_SMOKE_CHANCE) {
        let origin = state.player.pos() + Vec3::Y * 0.5;
        state.emit_particles(origin, 3, 1.0, 0xffaa00);
    }
    update_particles(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rarity;
    use crate::sim::state::{Loadout, PowerUpKind, RunModifiers};
    use proptest::prelude::*;

    fn playing(seed: u64, mods: RunModifiers) -> GameState {
        let mut state = GameState::new(seed);
        state.start(mods).unwrap();
        state
    }

    #[test]
    fn test_multiplier_steps() {
        assert_eq!(multiplier_for(0.0, 3000.0), 1);
        assert_eq!(multiplier_for(2999.9, 3000.0), 1);
        assert_eq!(multiplier_for(3000.0, 3000.0), 2);
        assert_eq!(multiplier_for(1.0e9, 3000.0), MAX_MULTIPLIER);
    }

    #[test]
    fn test_mythic_reaches_milestones_sooner() {
        let common = RunModifiers::from_loadout(&Loadout::default()).milestone;
        let mythic = RunModifiers::from_loadout(&Loadout {
            rarity: Rarity::Mythic,
            ..Loadout::default()
        })
        .milestone;
        for step in 1..MAX_MULTIPLIER {
            let d = common * step as f64;
            assert_eq!(multiplier_for(d, common), step + 1);
            assert_eq!(multiplier_for(d / 1.5, mythic), step + 1);
            assert_eq!(multiplier_for(d / 1.5 - 1.0, mythic), step);
        }
    }

    #[test]
    fn test_speed_ramps_to_cap() {
        let mut speed = START_SPEED;
        for _ in 0..100_000 {
            speed = ramp_speed(speed, ACCELERATION, MAX_SPEED);
        }
        assert_eq!(speed, MAX_SPEED);
    }

    #[test]
    fn test_advance_accrues_distance_and_score() {
        let mut state = playing(1, RunModifiers::default());
        advance_run(&mut state);
        let speed = START_SPEED + ACCELERATION;
        assert!((state.session.speed - speed).abs() < 1e-6);
        assert!((state.session.distance - speed as f64).abs() < 1e-6);
        assert!((state.session.score - speed as f64 * 10.0).abs() < 1e-4);
        assert_eq!(state.session.multiplier, 1);
    }

    #[test]
    fn test_fever_fires_once() {
        let mut state = playing(1, RunModifiers::default());
        state.session.distance = 3000.0 * 19.0;
        advance_run(&mut state);
        assert_eq!(state.session.multiplier, MAX_MULTIPLIER);
        assert_eq!(state.session.fever_ticks, FEVER_TICKS);
        assert!(state.has_shield());

        state.session.fever_ticks = 0;
        advance_run(&mut state);
        assert_eq!(state.session.fever_ticks, 0);
        let fevers = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::FeverStarted))
            .count();
        assert_eq!(fevers, 1);
    }

    #[test]
    fn test_trucks_move_slower() {
        let mut state = playing(1, RunModifiers::default());
        state.session.speed = 2.0;
        let car = state.spawn_at(EntityKind::Obstacle, Vec3::new(0.0, 0.0, -100.0));
        let truck = state.spawn_at(EntityKind::Truck, Vec3::new(3.0, 0.0, -100.0));
        move_entities(&mut state);
        assert_eq!(state.pool.get(car).unwrap().pos.z, -98.0);
        assert!((state.pool.get(truck).unwrap().pos.z - -98.2).abs() < 1e-4);
    }

    #[test]
    fn test_magnet_pulls_only_nearby_coins() {
        let mut state = playing(1, RunModifiers::default());
        state.session.speed = 1.0;
        state.session.refresh_power_up(PowerUpKind::Magnet, 100);
        let near = state.spawn_at(EntityKind::Coin, Vec3::new(6.0, 1.0, -20.0));
        let far = state.spawn_at(EntityKind::Coin, Vec3::new(6.0, 1.0, -200.0));
        let gem = state.spawn_at(EntityKind::Gem, Vec3::new(6.0, 1.0, -20.0));
        move_entities(&mut state);

        let near = state.pool.get(near).unwrap().pos;
        assert!((near.x - 6.0 * 0.85).abs() < 1e-4);
        assert!((near.z - -20.0 * 0.85).abs() < 1e-4);
        assert_eq!(state.pool.get(far).unwrap().pos.z, -199.0);
        assert_eq!(state.pool.get(gem).unwrap().pos.z, -19.0);
    }

    #[test]
    fn test_particles_fall_and_die() {
        let mut state = GameState::new(1);
        state.emit_particles(Vec3::ZERO, 4, 1.0, 0xffffff);
        update_particles(&mut state);
        for (_, p) in state.pool.iter_active() {
            assert!((p.life - 0.98).abs() < 1e-6);
        }
        for _ in 0..60 {
            update_particles(&mut state);
        }
        assert_eq!(state.pool.active_count_of(EntityKind::Particle), 0);
    }

    proptest! {
        #[test]
        fn prop_multiplier_never_drops(steps in prop::collection::vec(0.0f64..500.0, 1..300), mythic in any::<bool>()) {
            let rarity = if mythic { Rarity::Mythic } else { Rarity::Common };
            let mods = RunModifiers::from_loadout(&Loadout { rarity, ..Loadout::default() });
            let mut state = playing(5, mods);
            let mut last = state.session.multiplier;
            for extra in steps {
                state.session.distance += extra;
                advance_run(&mut state);
                prop_assert!(state.session.multiplier >= last);
                prop_assert!(state.session.multiplier <= MAX_MULTIPLIER);
                last = state.session.multiplier;
            }
        }
    }
}
