//! Neon Velocity headless driver
//!
//! Plays autopilot runs against the on-disk save and logs what happened.
//! Usage: `neon-velocity [seed] [ticks]`. The save path comes from
//! `NEON_VELOCITY_SAVE`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use neon_velocity::Game;
    use neon_velocity::audio::LogSink;
    use neon_velocity::persistence::FileStorage;
    use neon_velocity::sim::GamePhase;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| neon_velocity::platform::now_millis() as u64);
    let ticks: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 60);
    let path = std::env::var("NEON_VELOCITY_SAVE")
        .unwrap_or_else(|_| "neon-velocity-save.json".to_string());

    log::info!("Neon Velocity (native) starting with seed {}", seed);
    let mut game = Game::new(Box::new(FileStorage::open(&path)), seed);
    let mut sink = LogSink::default();
    game.set_autopilot(true);

    let mut runs = 0;
    for _ in 0..ticks {
        match game.phase() {
            GamePhase::Idle | GamePhase::GameOver => {
                let stamp = neon_velocity::platform::now_millis() as u64;
                game.new_day(&neon_velocity::platform::today(), stamp);
                if game.start_run().is_err() {
                    break;
                }
                runs += 1;
            }
            _ => {}
        }
        game.step();
        game.dispatch_cues(&mut sink);
    }

    let hud = game.hud();
    log::info!(
        "{} runs over {} ticks: last score {}, best {}, balance {} credits / {} gems, {} cues",
        runs,
        ticks,
        hud.score,
        hud.high_score,
        hud.credits,
        hud.gems,
        sink.played
    );
    for mission in &hud.missions {
        log::info!(
            "Mission {}: {}/{}{}",
            mission.description,
            mission.progress,
            mission.target,
            if mission.completed { " (done)" } else { "" }
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::WebGame, this is just to satisfy the compiler
}
