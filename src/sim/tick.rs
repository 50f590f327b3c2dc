//! Fixed timestep simulation tick
//!
//! Spawn, then motion, then collision. Paused, idle and game-over states do
//! not advance at all.

use super::state::{GameEvent, GameState, Phase};
use super::{autopilot, collision, motion, spawn};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Lane change this tick: negative = left, positive = right
    pub lane_shift: i8,
    /// Let the demo driver steer
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    match state.phase {
        Phase::Playing => {}
        Phase::Crashing { remaining } => {
            crash_tick(state, remaining);
            return;
        }
        Phase::Idle | Phase::Paused { .. } | Phase::GameOver => return,
    }

    let shift = if input.autopilot {
        autopilot::choose_shift(state)
    } else {
        input.lane_shift
    };
    state.change_lane(shift);

    state.session.ticks += 1;
    spawn::update(state);
    motion::step(state);
    collision::resolve(state);
}

/// Count the crash animation down; the run ends when it runs out
fn crash_tick(state: &mut GameState, remaining: u32) {
    motion::crash_effects(state);

    let remaining = remaining.saturating_sub(1);
    if remaining > 0 {
        state.phase = Phase::Crashing { remaining };
        return;
    }

    state.phase = Phase::GameOver;
    state.events.push(GameEvent::GameOver);
    log::info!(
        "Game over: score {}, distance {:.0}, credits {}, gems {}",
        state.session.whole_score(),
        state.session.distance,
        state.session.credits,
        state.session.gems
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::lane_x;
    use crate::sim::state::{EntityKind, GamePhase, RunModifiers};
    use glam::Vec3;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start(RunModifiers::default()).unwrap();
        state
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut state = GameState::new(1);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.ticks, 0);
        assert_eq!(state.pool.active_count(), 0);
    }

    #[test]
    fn test_crash_leads_to_game_over_after_delay() {
        let mut state = playing(1);
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(1), 0.0, -2.0));
        tick(&mut state, &TickInput::default());
        assert!(state.is_crashing());
        assert_eq!(state.game_phase(), GamePhase::Playing);

        let distance = state.session.distance;
        for _ in 0..CRASH_DELAY_TICKS - 1 {
            tick(&mut state, &TickInput { lane_shift: 1, autopilot: false });
        }
        assert!(state.is_crashing());
        assert_eq!(state.player.lane, 1);
        assert_eq!(state.session.distance, distance);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.game_phase(), GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = playing(9);
        for _ in 0..200 {
            tick(&mut state, &TickInput::default());
        }
        state.session.refresh_power_up(crate::sim::PowerUpKind::Magnet, 50);
        state.pause().unwrap();

        let session = state.session.clone();
        let positions: Vec<Vec3> = state.pool.iter_active().map(|(_, e)| e.pos).collect();
        for _ in 0..500 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.session, session);
        let after: Vec<Vec3> = state.pool.iter_active().map(|(_, e)| e.pos).collect();
        assert_eq!(after, positions);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = playing(42);
        let mut b = playing(42);
        let input = TickInput {
            lane_shift: 0,
            autopilot: true,
        };
        for _ in 0..3000 {
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.session, b.session);
        assert_eq!(a.player, b.player);
        assert_eq!(a.phase, b.phase);
        let ea: Vec<_> = a.pool.iter_active().map(|(_, e)| e.clone()).collect();
        let eb: Vec<_> = b.pool.iter_active().map(|(_, e)| e.clone()).collect();
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_autopilot_steers_out_of_blocked_lane() {
        let mut state = playing(7);
        let lane = state.player.lane;
        state.spawn_at(EntityKind::Obstacle, Vec3::new(lane_x(lane), 0.0, -60.0));
        let input = TickInput { lane_shift: 0, autopilot: true };
        for _ in 0..120 {
            tick(&mut state, &input);
            assert!(!state.is_crashing());
        }
        assert_ne!(state.player.lane, lane);
        assert_eq!(state.game_phase(), GamePhase::Playing);
    }

    #[test]
    fn test_long_run_invariants() {
        let mut state = playing(7);
        let mut last_multiplier = 1;
        for _ in 0..5000 {
            tick(&mut state, &TickInput { lane_shift: 0, autopilot: true });
            assert!(state.session.multiplier >= last_multiplier);
            last_multiplier = state.session.multiplier;
            assert!(state.pool.active_count_of(EntityKind::Particle) <= MAX_PARTICLES);
            for (_, e) in state.pool.iter_active() {
                assert!(e.pos.z <= DESPAWN_Z + MAX_SPEED * 2.0 || e.kind == EntityKind::Particle);
            }
            if state.game_phase() == GamePhase::GameOver {
                break;
            }
        }
        assert!(state.session.ticks > 0);
        assert!(state.session.distance > 0.0);
    }
}
