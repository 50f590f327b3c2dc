//! Collision detection and resolution
//!
//! Independent per-axis thresholds between the player and each live entity.
//! The forward threshold grows with speed so a fast tick cannot carry an
//! entity clean through the player.

use super::state::{Entity, EntityKind, GameEvent, GameState, Phase, PowerUpKind};
use crate::consts::*;
use crate::rewards::coin_value;

const ENEMY_TINT: u32 = 0xff0055;
const COIN_TINT: u32 = 0xffd700;
const GEM_TINT: u32 = 0xf43f5e;
const SHIELD_TINT: u32 = 0x00ffff;
const MAGNET_TINT: u32 = 0xff00ff;

/// Player at lateral `player_x` touches `entity` this tick
pub fn overlaps(player_x: f32, entity: &Entity, speed: f32) -> bool {
    let (half_width, reach) = entity.kind.extents();
    (player_x - entity.pos.x).abs() < half_width + PLAYER_HALF_WIDTH
        && entity.pos.z.abs() < reach + speed
}

/// What touching an entity amounts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Shielded hit, the obstacle is destroyed instead of the player
    Smash,
    Crash,
    Coin,
    Gem,
    PowerUp,
}

pub fn contact_for(kind: EntityKind, shielded: bool) -> Option<Contact> {
    match kind {
        EntityKind::Obstacle | EntityKind::Truck if shielded => Some(Contact::Smash),
        EntityKind::Obstacle | EntityKind::Truck => Some(Contact::Crash),
        EntityKind::Coin => Some(Contact::Coin),
        EntityKind::Gem => Some(Contact::Gem),
        EntityKind::PowerUp => Some(Contact::PowerUp),
        EntityKind::Particle => None,
    }
}

/// Resolve every contact for this tick and recycle entities behind the camera
pub fn resolve(state: &mut GameState) {
    let speed = state.session.speed;
    let player_x = state.player.x;

    let mut ids = std::mem::take(&mut state.scratch);
    state.pool.ids_into(&mut ids);
    for &id in &ids {
        let Some(entity) = state.pool.get(id) else {
            continue;
        };
        if entity.kind == EntityKind::Particle {
            continue;
        }

        if !overlaps(player_x, entity, speed) {
            if entity.pos.z > DESPAWN_Z {
                state.pool.release(id);
            }
            continue;
        }

        let entity = entity.clone();
        let Some(contact) = contact_for(entity.kind, state.has_shield()) else {
            continue;
        };
        match contact {
            Contact::Smash => {
                state.pool.release(id);
                state.emit_particles(entity.pos, 30, 1.0, ENEMY_TINT);
                state.events.push(GameEvent::ObstacleSmashed);
            }
            // Only the first hit of a run crashes
            Contact::Crash if state.is_crashing() => {}
            Contact::Crash => crash(state, &entity),
            Contact::Coin => {
                state.pool.release(id);
                let value = coin_value(state.session.multiplier, state.modifiers.coin_mult);
                state.session.credits += value;
                state.emit_particles(entity.pos, 10, 0.5, COIN_TINT);
                state.events.push(GameEvent::CoinCollected { value });
            }
            Contact::Gem => {
                state.pool.release(id);
                state.session.gems += 1;
                state.emit_particles(entity.pos, 15, 0.5, GEM_TINT);
                state.events.push(GameEvent::GemCollected);
            }
            Contact::PowerUp => {
                state.pool.release(id);
                if let Some(kind) = entity.power_up {
                    let ticks = state.modifiers.power_up_ticks(kind);
                    state.session.refresh_power_up(kind, ticks);
                    let tint = match kind {
                        PowerUpKind::Shield => SHIELD_TINT,
                        PowerUpKind::Magnet => MAGNET_TINT,
                    };
                    state.emit_particles(entity.pos, 30, 0.5, tint);
                    state.events.push(GameEvent::PowerUpCollected { kind, ticks });
                }
            }
        }
    }
    state.scratch = ids;
}

/// First unshielded obstacle hit: start the crash animation
fn crash(state: &mut GameState, obstacle: &Entity) {
    state.phase = Phase::Crashing {
        remaining: CRASH_DELAY_TICKS,
    };
    let player = state.player.pos();
    state.emit_particles(player, 80, 1.0, state.modifiers.tint);
    state.emit_particles(obstacle.pos, 60, 1.0, ENEMY_TINT);
    state.events.push(GameEvent::Crashed);
    log::info!(
        "Crashed into {:?} at distance {:.0}, score {}",
        obstacle.kind,
        state.session.distance,
        state.session.whole_score()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RunModifiers;
    use glam::Vec3;

    fn playing() -> GameState {
        let mut state = GameState::new(11);
        state.start(RunModifiers::default()).unwrap();
        state
    }

    #[test]
    fn test_overlap_thresholds() {
        let mut e = Entity::new(EntityKind::Obstacle);
        e.pos = Vec3::new(2.2, 0.0, -3.0);
        assert!(overlaps(0.0, &e, 1.0));
        e.pos.x = 2.25;
        assert!(!overlaps(0.0, &e, 1.0));
        e.pos = Vec3::new(0.0, 0.0, -4.4);
        assert!(overlaps(0.0, &e, 1.0));
        assert!(!overlaps(0.0, &e, 0.8));
    }

    #[test]
    fn test_speed_allowance_prevents_tunnelling() {
        let mut e = Entity::new(EntityKind::Coin);
        // A coin that jumped from -12 to +3 at speed 15 is still caught
        e.pos = Vec3::new(0.0, 1.0, 3.0);
        assert!(overlaps(0.0, &e, 15.0));
    }

    #[test]
    fn test_coin_scales_with_multiplier_gem_does_not() {
        let mut state = playing();
        state.session.multiplier = 3;
        state.spawn_at(EntityKind::Coin, Vec3::new(0.0, 1.0, 0.0));
        state.spawn_at(EntityKind::Gem, Vec3::new(0.0, 1.0, 1.0));
        resolve(&mut state);
        assert_eq!(state.session.credits, 30);
        assert_eq!(state.session.gems, 1);
        assert_eq!(state.pool.active_count_of(EntityKind::Coin), 0);
        assert_eq!(state.pool.active_count_of(EntityKind::Gem), 0);
    }

    #[test]
    fn test_crash_happens_once() {
        let mut state = playing();
        state.spawn_at(EntityKind::Obstacle, Vec3::new(0.0, 0.0, 0.0));
        state.spawn_at(EntityKind::Truck, Vec3::new(3.0, 0.0, 1.0));
        resolve(&mut state);
        assert_eq!(state.phase, Phase::Crashing { remaining: CRASH_DELAY_TICKS });
        let crashes = state.events.iter().filter(|e| **e == GameEvent::Crashed).count();
        assert_eq!(crashes, 1);

        resolve(&mut state);
        let crashes = state.events.iter().filter(|e| **e == GameEvent::Crashed).count();
        assert_eq!(crashes, 1);
    }

    #[test]
    fn test_pickups_on_crash_tick_still_collected() {
        let mut state = playing();
        state.spawn_at(EntityKind::Obstacle, Vec3::new(0.0, 0.0, 0.0));
        let coin = state.spawn_at(EntityKind::Coin, Vec3::new(0.0, 1.0, 0.0));
        resolve(&mut state);
        assert!(state.is_crashing());
        assert_eq!(state.session.credits, 10);
        assert!(!state.pool.is_active(coin));
    }

    #[test]
    fn test_shield_smashes_obstacles() {
        let mut state = playing();
        state.session.refresh_power_up(PowerUpKind::Shield, 50);
        let id = state.spawn_at(EntityKind::Obstacle, Vec3::new(0.0, 0.0, 0.0));
        resolve(&mut state);
        assert_eq!(state.phase, Phase::Playing);
        assert!(!state.pool.is_active(id));
        assert!(state.events.contains(&GameEvent::ObstacleSmashed));
    }

    #[test]
    fn test_fever_counts_as_shield() {
        let mut state = playing();
        state.session.fever_ticks = 10;
        state.spawn_at(EntityKind::Truck, Vec3::new(3.0, 0.0, 0.0));
        resolve(&mut state);
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_power_up_uses_modifier_duration() {
        let mut state = playing();
        state.modifiers.shield_ticks = 900;
        let id = state.spawn_at(EntityKind::PowerUp, Vec3::new(0.0, 1.5, 0.0));
        state.pool.get_mut(id).unwrap().power_up = Some(PowerUpKind::Shield);
        resolve(&mut state);
        assert_eq!(state.session.power_up_ticks(PowerUpKind::Shield), 900);
    }

    #[test]
    fn test_passed_entities_are_recycled() {
        let mut state = playing();
        let behind = state.spawn_at(EntityKind::Obstacle, Vec3::new(6.0, 0.0, 31.0));
        let ahead = state.spawn_at(EntityKind::Obstacle, Vec3::new(6.0, 0.0, -100.0));
        resolve(&mut state);
        assert!(!state.pool.is_active(behind));
        assert!(state.pool.is_active(ahead));
        assert_eq!(state.phase, Phase::Playing);
    }
}
