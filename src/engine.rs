//! The simulation engine: sole owner of the game state.
//!
//! The host drives it with `frame(now_ms)` (browser) or `tick(dt)`
//! (headless); every player action is a typed operation that either
//! mutates state and reports what happened, or refuses with an
//! `ActionError` and touches nothing. There is exactly one mutator at
//! a time, so no locking anywhere.

use thiserror::Error;

use crate::autobuyer;
use crate::cost;
use crate::format;
use crate::offline::{self, OfflineReport};
use crate::prestige;
use crate::production;
use crate::save::{self, ImportError, LoadError, SaveError};
use crate::state::{GameState, Notation, Phase};
use crate::storage::KeyValueStore;
use crate::tuning::Tuning;

#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("unknown generator tier {0}")]
    UnknownTier(usize),
    #[error("crunch in progress")]
    CrunchInProgress,
    #[error("insufficient particles (need {needed}, have {have})")]
    InsufficientParticles { needed: f64, have: f64 },
    #[error("requirement not met (need {required}, have {have})")]
    RequirementNotMet { required: f64, have: f64 },
    #[error("autobuyer not unlocked for tier {0}")]
    AutobuyerLocked(usize),
    #[error("unknown meta upgrade {0}")]
    UnknownUpgrade(u32),
    #[error("meta upgrade {0} already owned")]
    UpgradeAlreadyOwned(u32),
    #[error("insufficient infinity points (need {needed}, have {have})")]
    InsufficientPoints { needed: f64, have: f64 },
}

/// What a purchase did, so the UI can react without re-deriving state.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseOutcome {
    pub count: u32,
    pub paid: f64,
    pub balance: f64,
}

/// What a successful Linac/Shift reset left behind.
#[derive(Clone, Debug, PartialEq)]
pub struct PrestigeOutcome {
    pub linac_count: u32,
    pub shift_count: u32,
    pub multiplier: f64,
    pub balance: f64,
}

pub struct ParticleGame<S: KeyValueStore> {
    state: GameState,
    tuning: Tuning,
    store: S,
    autobuy_acc: f64,
    autosave_acc: f64,
    offline_report: Option<OfflineReport>,
}

impl<S: KeyValueStore> ParticleGame<S> {
    /// Boot the engine: restore the persisted state (falling back to a
    /// fresh game on corrupt or too-old data, and migrating the flat
    /// legacy format if that is all there is), then replay any offline
    /// gap and re-anchor the clock to `now_ms`.
    pub fn new(mut store: S, tuning: Tuning, now_ms: f64) -> Self {
        let mut state = match store.get(save::STORAGE_KEY) {
            Some(json) => match save::load(&json, &tuning) {
                Ok(state) => state,
                Err(e) => {
                    store.remove(save::STORAGE_KEY);
                    let mut fresh = GameState::new(&tuning, now_ms);
                    fresh.add_log(
                        &format!("セーブデータを読み込めなかったため破棄しました ({})", e),
                        true,
                    );
                    fresh
                }
            },
            None => match store.get(save::LEGACY_STORAGE_KEY) {
                Some(json) => match save::load_legacy(&json, &tuning) {
                    Ok(mut migrated) => {
                        migrated.add_log("旧バージョンのセーブデータを移行しました", true);
                        migrated
                    }
                    Err(_) => GameState::new(&tuning, now_ms),
                },
                None => GameState::new(&tuning, now_ms),
            },
        };

        let offline_report = catch_up(&mut state, &tuning, now_ms);

        Self {
            state,
            tuning,
            store,
            autobuy_acc: 0.0,
            autosave_acc: 0.0,
            offline_report,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Result of the boot-time offline replay, if one ran.
    pub fn offline_report(&self) -> Option<&OfflineReport> {
        self.offline_report.as_ref()
    }

    pub fn global_multiplier(&self) -> f64 {
        prestige::global_multiplier(&self.state, &self.tuning)
    }

    /// Particles per second at the current multiplier.
    pub fn production_rate(&self) -> f64 {
        self.state.production_rate(self.global_multiplier())
    }

    pub fn linac_requirement(&self) -> f64 {
        prestige::linac_requirement(&self.state, &self.tuning)
    }

    pub fn shift_requirement(&self) -> u32 {
        prestige::shift_requirement(&self.state, &self.tuning)
    }

    pub fn crunch_award(&self) -> f64 {
        prestige::crunch_award(&self.state, &self.tuning)
    }

    pub fn format(&self, value: f64, notation: Notation) -> String {
        format::format(value, notation)
    }

    /// Format in the player's configured notation.
    pub fn format_particles(&self, value: f64) -> String {
        format::format(value, self.state.settings.notation)
    }

    /// `hh:mm:ss` for the stats panel's clocks.
    pub fn format_time(&self, seconds: f64) -> String {
        format::format_time(seconds)
    }

    /// Advance the simulation by `dt` seconds of game time. The dt is
    /// clamped to the tick cap; longer gaps belong to the offline
    /// simulator.
    pub fn tick(&mut self, dt_seconds: f64) {
        let dt = clamp_dt(dt_seconds, self.tuning.max_tick_seconds);
        self.state.last_tick += dt * 1000.0;
        self.tick_internal(dt);
    }

    /// Frame-callback entry point: derives dt from the wall clock,
    /// steps the simulation and autosaves on the configured cadence.
    pub fn frame(&mut self, now_ms: f64) {
        if !now_ms.is_finite() {
            return;
        }
        let dt = clamp_dt(
            (now_ms - self.state.last_tick) / 1000.0,
            self.tuning.max_tick_seconds,
        );
        self.state.last_tick = now_ms;
        self.tick_internal(dt);

        self.autosave_acc += dt;
        if self.autosave_acc >= self.tuning.autosave_interval_seconds {
            self.autosave_acc = 0.0;
            let _ = self.save();
        }
    }

    fn tick_internal(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }

        // クランチ演出中はシミュレーション停止。残り時間だけ進める。
        if let Phase::Crunching { remaining_seconds } = &mut self.state.phase {
            *remaining_seconds -= dt;
            if *remaining_seconds <= 0.0 {
                self.state.phase = Phase::Idle;
                self.state.add_log("新しい宇宙が誕生した", true);
            }
            return;
        }

        let multiplier = prestige::global_multiplier(&self.state, &self.tuning);
        production::advance(&mut self.state, multiplier, dt);

        autobuyer::refresh_unlocks(&mut self.state, &self.tuning);
        self.autobuy_acc += dt;
        while self.autobuy_acc >= self.tuning.autobuy_interval_seconds {
            self.autobuy_acc -= self.tuning.autobuy_interval_seconds;
            autobuyer::sweep(&mut self.state, &self.tuning);
        }

        if prestige::crunch_ready(&self.state, &self.tuning) {
            prestige::big_crunch(&mut self.state, &self.tuning);
        }
    }

    /// Buy `count` units (at least one) of a tier at the bulk price.
    pub fn buy(&mut self, index: usize, count: u32) -> Result<PurchaseOutcome, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        let count = count.max(1);
        let gen = self
            .state
            .generators
            .get(index)
            .ok_or(ActionError::UnknownTier(index))?;
        let price = cost::bulk_cost(gen.base_cost, gen.cost_growth, gen.purchased, count);

        match cost::buy(&mut self.state, &self.tuning, index, count) {
            Some(paid) => Ok(PurchaseOutcome {
                count,
                paid,
                balance: self.state.particles,
            }),
            None => Err(ActionError::InsufficientParticles {
                needed: price,
                have: self.state.particles,
            }),
        }
    }

    /// Buy as many units of a tier as the balance allows. Zero is a
    /// valid outcome, not an error.
    pub fn buy_max(&mut self, index: usize) -> Result<PurchaseOutcome, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        if index >= self.state.generators.len() {
            return Err(ActionError::UnknownTier(index));
        }
        let before = self.state.particles;
        let count = cost::buy_max(&mut self.state, &self.tuning, index);
        Ok(PurchaseOutcome {
            count,
            paid: before - self.state.particles,
            balance: self.state.particles,
        })
    }

    /// Flip a tier's autobuyer. Returns the new enabled flag.
    pub fn toggle_autobuyer(&mut self, index: usize) -> Result<bool, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        if index >= self.state.generators.len() {
            return Err(ActionError::UnknownTier(index));
        }
        autobuyer::toggle(&mut self.state, index).ok_or(ActionError::AutobuyerLocked(index))
    }

    pub fn attempt_linac(&mut self) -> Result<PrestigeOutcome, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        let required = self.linac_requirement();
        let have = self.state.generators.last().map(|g| g.owned).unwrap_or(0.0);
        if !prestige::attempt_linac(&mut self.state, &self.tuning) {
            return Err(ActionError::RequirementNotMet { required, have });
        }
        Ok(self.prestige_outcome())
    }

    pub fn attempt_shift(&mut self) -> Result<PrestigeOutcome, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        let required = self.shift_requirement() as f64;
        let have = self.state.linac_count as f64;
        if !prestige::attempt_shift(&mut self.state, &self.tuning) {
            return Err(ActionError::RequirementNotMet { required, have });
        }
        Ok(self.prestige_outcome())
    }

    fn prestige_outcome(&self) -> PrestigeOutcome {
        PrestigeOutcome {
            linac_count: self.state.linac_count,
            shift_count: self.state.shift_count,
            multiplier: self.global_multiplier(),
            balance: self.state.particles,
        }
    }

    /// Spend infinity points on a meta upgrade. Returns the remaining
    /// points.
    pub fn buy_meta_upgrade(&mut self, id: u32) -> Result<f64, ActionError> {
        if self.state.is_crunching() {
            return Err(ActionError::CrunchInProgress);
        }
        let upgrade = prestige::meta_upgrade(id).ok_or(ActionError::UnknownUpgrade(id))?;
        if self.state.infinity.upgrades.contains(&id) {
            return Err(ActionError::UpgradeAlreadyOwned(id));
        }
        if self.state.infinity.points < upgrade.cost {
            return Err(ActionError::InsufficientPoints {
                needed: upgrade.cost,
                have: self.state.infinity.points,
            });
        }
        prestige::buy_meta_upgrade(&mut self.state, id);
        Ok(self.state.infinity.points)
    }

    pub fn set_notation(&mut self, notation: Notation) {
        self.state.settings.notation = notation;
    }

    /// Preferred quantity for the bulk-buy button. Zero is meaningless,
    /// so it is bumped to one.
    pub fn set_bulk_buy(&mut self, count: u32) {
        self.state.settings.bulk_buy = count.max(1);
    }

    pub fn set_skip_confirm(&mut self, skip: bool) {
        self.state.settings.skip_confirm = skip;
    }

    /// Serialize and write the save blob.
    pub fn save(&mut self) -> Result<(), SaveError> {
        let json = save::encode(&self.state)?;
        self.store.set(save::STORAGE_KEY, &json)?;
        Ok(())
    }

    /// Re-read the save blob, replay any offline gap against `now_ms`
    /// and re-anchor the clock, exactly like boot. `Ok(false)` means no
    /// blob exists (the in-memory state is untouched); errors leave
    /// state untouched too, so the caller decides whether to fall back.
    pub fn load(&mut self, now_ms: f64) -> Result<bool, LoadError> {
        let json = match self.store.get(save::STORAGE_KEY) {
            Some(json) => json,
            None => return Ok(false),
        };
        let mut state = save::load(&json, &self.tuning)?;
        self.offline_report = catch_up(&mut state, &self.tuning, now_ms);
        self.state = state;
        self.autobuy_acc = 0.0;
        self.autosave_acc = 0.0;
        Ok(true)
    }

    /// The save blob as a transportable token.
    pub fn export_token(&self) -> Result<String, SaveError> {
        save::encode(&self.state)
    }

    /// Validate a token, adopt it as the current state, and commit it
    /// to storage. The clock restarts at `now_ms` with no offline
    /// replay: a stale token is not an absence to reward.
    pub fn import_token(&mut self, token: &str, now_ms: f64) -> Result<(), ImportError> {
        let mut state = save::import_token(token, &self.tuning)?;
        state.last_tick = now_ms;
        state.add_log("セーブデータをインポートしました", true);
        self.state = state;
        self.autobuy_acc = 0.0;
        self.autosave_acc = 0.0;
        let _ = self.save();
        Ok(())
    }

    /// Wipe storage (current and legacy keys) and start over.
    pub fn hard_reset(&mut self, now_ms: f64) {
        self.store.remove(save::STORAGE_KEY);
        self.store.remove(save::LEGACY_STORAGE_KEY);
        self.state = GameState::new(&self.tuning, now_ms);
        self.autobuy_acc = 0.0;
        self.autosave_acc = 0.0;
        self.offline_report = None;
        self.state.add_log("ハードリセット完了。まっさらな宇宙から再出発", true);
    }
}

fn clamp_dt(dt: f64, max_tick_seconds: f64) -> f64 {
    if dt.is_finite() {
        dt.clamp(0.0, max_tick_seconds)
    } else {
        0.0
    }
}

/// Replay the absence gap against `now_ms`, log the gains, and re-anchor
/// the clock. Shared by boot and explicit reloads.
fn catch_up(state: &mut GameState, tuning: &Tuning, now_ms: f64) -> Option<OfflineReport> {
    let mut offline_report = None;
    let gap_seconds = (now_ms - state.last_tick) / 1000.0;
    if gap_seconds > tuning.offline_threshold_seconds {
        let report = offline::simulate(state, tuning, gap_seconds);
        if report.gained > 0.0 {
            state.add_log(
                &format!(
                    "オフライン進行: {} の間に {} 粒子を獲得",
                    format::format_time(report.simulated_seconds),
                    format::format(report.gained, state.settings.notation),
                ),
                true,
            );
        }
        offline_report = Some(report);
    }
    state.last_tick = now_ms;
    offline_report
}
