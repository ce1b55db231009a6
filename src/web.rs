//! ブラウザ向けバインディング。
//!
//! JS 側は毎フレーム `frame()` を呼び、`snapshot()` の戻り値だけで
//! 画面を描く。数値の整形もこちら側で済ませるので、JS に桁区切りや
//! 漢数字のロジックは持たせない。時刻は常に `Date.now()` をこちらで
//! 取る。rAF のタイムスタンプはページ基準なのでセーブと混ぜられない。

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::cost;
use crate::engine::ParticleGame;
use crate::format;
use crate::prestige;
use crate::state::{Notation, Phase};
use crate::storage::LocalStore;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Serialize)]
struct TierView {
    name: &'static str,
    owned: f64,
    purchased: u32,
    production_multiplier: f64,
    unit_price: f64,
    unit_price_text: String,
    bulk_count: u32,
    bulk_price: f64,
    max_affordable: u32,
    affordable: bool,
    auto_unlocked: bool,
    auto_enabled: bool,
}

#[derive(Serialize)]
struct MetaUpgradeView {
    id: u32,
    name: &'static str,
    cost: f64,
    owned: bool,
    affordable: bool,
}

#[derive(Serialize)]
struct LogView {
    text: String,
    important: bool,
}

/// 1 フレームぶんの描画に必要な値をまとめたビュー。
#[derive(Serialize)]
struct Snapshot {
    particles: f64,
    particles_text: String,
    total_particles: f64,
    production_rate: f64,
    production_rate_text: String,
    global_multiplier: f64,
    run_time_text: String,
    lifetime_particles: f64,
    total_linacs: u32,
    total_shifts: u32,
    tiers: Vec<TierView>,
    linac_count: u32,
    linac_requirement: f64,
    linac_ready: bool,
    shift_count: u32,
    shift_requirement: u32,
    shift_ready: bool,
    infinity_points: f64,
    crunches: u32,
    best_crunch_ms: Option<f64>,
    limit_broken: bool,
    crunch_ready: bool,
    crunch_award: f64,
    crunching: bool,
    crunch_remaining_seconds: f64,
    meta_upgrades: Vec<MetaUpgradeView>,
    notation: u8,
    bulk_buy: u32,
    skip_confirm: bool,
    log: Vec<LogView>,
}

#[derive(Serialize)]
struct OfflineView {
    simulated_seconds: f64,
    steps: u32,
    gained: f64,
    gained_text: String,
}

#[wasm_bindgen]
pub struct ParticleApp {
    game: ParticleGame<LocalStore>,
}

#[wasm_bindgen]
impl ParticleApp {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ParticleApp {
        let game = ParticleGame::new(LocalStore, Tuning::default(), js_sys::Date::now());
        web_sys::console::log_1(&format!("the Particle v{} 起動", version()).into());
        ParticleApp { game }
    }

    pub fn frame(&mut self) {
        self.game.frame(js_sys::Date::now());
    }

    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.build_snapshot()).unwrap_or(JsValue::NULL)
    }

    /// 起動時のオフライン進行レポート。無ければ null。
    pub fn offline_report(&self) -> JsValue {
        match self.game.offline_report() {
            Some(report) => {
                let view = OfflineView {
                    simulated_seconds: report.simulated_seconds,
                    steps: report.steps,
                    gained: report.gained,
                    gained_text: self.game.format_particles(report.gained),
                };
                serde_wasm_bindgen::to_value(&view).unwrap_or(JsValue::NULL)
            }
            None => JsValue::NULL,
        }
    }

    pub fn buy(&mut self, index: usize, count: u32) -> bool {
        self.game.buy(index, count).is_ok()
    }

    /// 設定中のまとめ買い数で購入。
    pub fn buy_bulk(&mut self, index: usize) -> bool {
        let count = self.game.state().settings.bulk_buy;
        self.game.buy(index, count).is_ok()
    }

    /// 買えるだけ買う。購入できた個数を返す。
    pub fn buy_max(&mut self, index: usize) -> u32 {
        match self.game.buy_max(index) {
            Ok(outcome) => outcome.count,
            Err(_) => 0,
        }
    }

    pub fn toggle_autobuyer(&mut self, index: usize) -> bool {
        self.game.toggle_autobuyer(index).is_ok()
    }

    pub fn linac(&mut self) -> bool {
        self.game.attempt_linac().is_ok()
    }

    pub fn shift(&mut self) -> bool {
        self.game.attempt_shift().is_ok()
    }

    pub fn buy_meta_upgrade(&mut self, id: u32) -> bool {
        self.game.buy_meta_upgrade(id).is_ok()
    }

    pub fn save(&mut self) -> bool {
        match self.game.save() {
            Ok(()) => true,
            Err(e) => {
                web_sys::console::warn_1(&format!("セーブ失敗: {}", e).into());
                false
            }
        }
    }

    pub fn export_token(&self) -> Option<String> {
        match self.game.export_token() {
            Ok(token) => Some(token),
            Err(e) => {
                web_sys::console::warn_1(&format!("エクスポート失敗: {}", e).into());
                None
            }
        }
    }

    /// ブラウザを閉じていた間の進行を含めて保存データを読み直す。
    /// ブロブが無い・壊れている場合は false（状態は変わらない）。
    pub fn load(&mut self) -> bool {
        match self.game.load(js_sys::Date::now()) {
            Ok(loaded) => loaded,
            Err(e) => {
                web_sys::console::warn_1(&format!("ロード失敗: {}", e).into());
                false
            }
        }
    }

    /// トークンを検証して取り込む。結果メッセージを画面にそのまま出せる。
    pub fn import_token(&mut self, token: &str) -> String {
        use crate::save::ImportError;
        match self.game.import_token(token, js_sys::Date::now()) {
            Ok(()) => "インポート完了".to_string(),
            Err(ImportError::Invalid) => "インポートできない形式です".to_string(),
            Err(ImportError::MissingCurrency) => "粒子データが見つかりません".to_string(),
            Err(ImportError::TooOld { saved, min }) => {
                format!("セーブバージョン {} は古すぎます (最低 {})", saved, min)
            }
        }
    }

    pub fn hard_reset(&mut self) {
        self.game.hard_reset(js_sys::Date::now());
    }

    /// 0: 指数表記, 1: 桁区切り, 2: 漢数字。その他は指数表記扱い。
    pub fn set_notation(&mut self, notation: u8) {
        self.game.set_notation(match notation {
            1 => Notation::Grouped,
            2 => Notation::Kanji,
            _ => Notation::Scientific,
        });
    }

    pub fn set_bulk_buy(&mut self, count: u32) {
        self.game.set_bulk_buy(count);
    }

    pub fn set_skip_confirm(&mut self, skip: bool) {
        self.game.set_skip_confirm(skip);
    }

    pub fn format(&self, value: f64) -> String {
        self.game.format_particles(value)
    }
}

impl ParticleApp {
    fn build_snapshot(&self) -> Snapshot {
        let game = &self.game;
        let state = game.state();
        let tuning = game.tuning();
        let notation = state.settings.notation;
        let rate = game.production_rate();
        let crunching = state.is_crunching();

        let tiers = tuning
            .tiers
            .iter()
            .zip(&state.generators)
            .map(|(spec, gen)| {
                let unit_price = cost::unit_cost(gen.base_cost, gen.cost_growth, gen.purchased);
                TierView {
                    name: spec.name,
                    owned: gen.owned,
                    purchased: gen.purchased,
                    production_multiplier: gen.production_multiplier,
                    unit_price,
                    unit_price_text: format::format(unit_price, notation),
                    bulk_count: state.settings.bulk_buy,
                    bulk_price: cost::bulk_cost(
                        gen.base_cost,
                        gen.cost_growth,
                        gen.purchased,
                        state.settings.bulk_buy,
                    ),
                    max_affordable: cost::max_affordable(
                        gen.base_cost,
                        gen.cost_growth,
                        gen.purchased,
                        state.particles,
                    ),
                    affordable: state.particles >= unit_price,
                    auto_unlocked: gen.auto_unlocked,
                    auto_enabled: gen.auto_enabled,
                }
            })
            .collect();

        let linac_requirement = game.linac_requirement();
        let top_owned = state.generators.last().map(|g| g.owned).unwrap_or(0.0);
        let shift_requirement = game.shift_requirement();

        let meta_upgrades = prestige::META_UPGRADES
            .iter()
            .map(|u| MetaUpgradeView {
                id: u.id,
                name: u.name,
                cost: u.cost,
                owned: state.infinity.upgrades.contains(&u.id),
                affordable: state.infinity.points >= u.cost,
            })
            .collect();

        let crunch_remaining_seconds = match state.phase {
            Phase::Crunching { remaining_seconds } => remaining_seconds.max(0.0),
            Phase::Idle => 0.0,
        };

        Snapshot {
            particles: state.particles,
            particles_text: format::format(state.particles, notation),
            total_particles: state.total_particles,
            production_rate: rate,
            production_rate_text: format::format(rate, notation),
            global_multiplier: game.global_multiplier(),
            run_time_text: format::format_time(state.elapsed_run_seconds()),
            lifetime_particles: state.stats.lifetime_particles,
            total_linacs: state.stats.total_linacs,
            total_shifts: state.stats.total_shifts,
            tiers,
            linac_count: state.linac_count,
            linac_requirement,
            linac_ready: !crunching && top_owned >= linac_requirement,
            shift_count: state.shift_count,
            shift_requirement,
            shift_ready: !crunching && state.linac_count >= shift_requirement,
            infinity_points: state.infinity.points,
            crunches: state.infinity.crunches,
            best_crunch_ms: state.infinity.best_crunch_ms,
            limit_broken: state.infinity.limit_broken,
            crunch_ready: prestige::crunch_ready(state, tuning),
            crunch_award: game.crunch_award(),
            crunching,
            crunch_remaining_seconds,
            meta_upgrades,
            notation: match notation {
                Notation::Scientific => 0,
                Notation::Grouped => 1,
                Notation::Kanji => 2,
            },
            bulk_buy: state.settings.bulk_buy,
            skip_confirm: state.settings.skip_confirm,
            log: state
                .log
                .iter()
                .map(|entry| LogView {
                    text: entry.text.clone(),
                    important: entry.is_important,
                })
                .collect(),
        }
    }
}
