//! Browser entry point
//!
//! A thin `wasm-bindgen` wrapper around `Game`. The page's own loop calls
//! `frame` once per animation frame and reads the HUD back as JSON.

use wasm_bindgen::prelude::*;

use crate::audio::Cue;
use crate::economy::Stat;
use crate::game::Game;
use crate::persistence::LocalStorage;
use crate::settings::Language;
use crate::sim::PowerUpKind;

fn to_js<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("Failed to encode for JS: {}", e);
        "null".to_string()
    })
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    last_time: f64,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("Logger already initialised");
        }
        log::info!("Neon Velocity starting...");

        let seed = js_sys::Date::now() as u64;
        WebGame {
            game: Game::new(Box::new(LocalStorage::new()), seed),
            last_time: 0.0,
        }
    }

    /// Advance by wall time; `time` is the rAF timestamp in ms
    pub fn frame(&mut self, time: f64) -> u32 {
        let dt = if self.last_time > 0.0 {
            ((time - self.last_time) / 1000.0) as f32
        } else {
            0.0
        };
        self.last_time = time;
        self.game.advance(dt)
    }

    pub fn hud(&self) -> String {
        to_js(&self.game.hud())
    }

    /// Pending cues as a JSON array of names
    pub fn cues(&mut self) -> String {
        let cues: Vec<Cue> = self.game.drain_cues();
        to_js(&cues)
    }

    pub fn catalog(&self) -> String {
        to_js(&crate::catalog::VEHICLES)
    }

    /// Paint shop colours as a JSON array
    pub fn palette(&self) -> String {
        to_js(&crate::catalog::NEON_PALETTE)
    }

    pub fn start(&mut self) -> bool {
        self.last_time = 0.0;
        self.game
            .new_day(&crate::platform::today(), crate::platform::now_millis() as u64);
        self.game.start_run().is_ok()
    }

    pub fn pause(&mut self) -> bool {
        self.game.pause().is_ok()
    }

    pub fn resume(&mut self) -> bool {
        self.last_time = 0.0;
        self.game.resume().is_ok()
    }

    pub fn quit(&mut self) -> bool {
        self.game.quit_to_menu().is_ok()
    }

    pub fn restart(&mut self) -> bool {
        self.last_time = 0.0;
        self.game.restart().is_ok()
    }

    pub fn revive(&mut self) -> bool {
        self.last_time = 0.0;
        self.game.revive().is_ok()
    }

    pub fn left(&mut self) -> bool {
        self.game.change_lane(-1)
    }

    pub fn right(&mut self) -> bool {
        self.game.change_lane(1)
    }

    pub fn select_vehicle(&mut self, index: usize) {
        self.game.select_vehicle(index);
    }

    pub fn purchase_vehicle(&mut self, id: &str, cost: u64) -> bool {
        self.game.purchase_vehicle(id, cost).unwrap_or(false)
    }

    /// `stat` is "speed" or "handling"
    pub fn upgrade_stat(&mut self, vehicle: &str, stat: &str) -> bool {
        let stat = match stat {
            "speed" => Stat::Speed,
            "handling" => Stat::Handling,
            _ => return false,
        };
        self.game.upgrade_stat(vehicle, stat).is_ok()
    }

    /// `kind` is "SHIELD" or "MAGNET"
    pub fn upgrade_power_up(&mut self, kind: &str) -> bool {
        let kind = match kind {
            "SHIELD" => PowerUpKind::Shield,
            "MAGNET" => PowerUpKind::Magnet,
            _ => return false,
        };
        self.game.upgrade_power_up(kind).is_ok()
    }

    pub fn change_color(&mut self, vehicle: &str, color: &str) {
        self.game.change_color(vehicle, color);
    }

    pub fn claim_mission(&mut self, id: &str) -> bool {
        self.game.claim_mission(id).is_ok()
    }

    pub fn buy_credits(&mut self, gem_cost: u64, amount: u64) -> bool {
        self.game.buy_credits(gem_cost, amount).is_ok()
    }

    pub fn set_language(&mut self, tag: &str) {
        if let Some(language) = Language::parse(tag) {
            self.game.set_language(language);
        }
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.game.set_music_volume(volume);
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.game.set_sfx_volume(volume);
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
