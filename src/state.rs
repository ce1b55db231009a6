//! Canonical game state: one explicit struct owned by the engine, passed
//! by reference to every operation. No globals.

use std::collections::BTreeSet;

use crate::tuning::{TierSpec, Tuning};

/// Numeric display notation (see `format`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notation {
    /// `1.23e45`, integers floored below 1000.
    Scientific,
    /// Comma-grouped (`1,234,567`), scientific above 1e15.
    Grouped,
    /// Japanese myriad units (`1.23兆`), scientific above the ladder.
    Kanji,
}

/// One generator tier. `purchased` drives the cost curve; `owned` is the
/// fractional quantity grown by the tier above.
#[derive(Clone, Debug, PartialEq)]
pub struct Generator {
    pub base_cost: f64,
    pub cost_growth: f64,
    pub purchased: u32,
    pub owned: f64,
    pub production_multiplier: f64,
    /// Sticky: once true, survives every reset.
    pub auto_unlocked: bool,
    pub auto_enabled: bool,
}

impl Generator {
    pub fn new(spec: &TierSpec) -> Self {
        Self {
            base_cost: spec.base_cost,
            cost_growth: spec.cost_growth,
            purchased: 0,
            owned: 0.0,
            production_multiplier: 1.0,
            auto_unlocked: false,
            auto_enabled: false,
        }
    }

    /// Clear run progress. Autobuyer flags are deliberately kept.
    pub fn reset_run(&mut self) {
        self.purchased = 0;
        self.owned = 0.0;
        self.production_multiplier = 1.0;
    }
}

/// Counters that survive Linac and Shift resets. Cleared by a Big Crunch
/// (only `InfinityState` survives that).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub total_linacs: u32,
    pub total_shifts: u32,
    pub lifetime_particles: f64,
    /// Clock (ms) of the current crunch cycle's start, for best-time tracking.
    pub crunch_started_at: f64,
}

/// Permanent meta progression. Survives a Big Crunch; wiped only by a
/// hard reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfinityState {
    pub points: f64,
    pub crunches: u32,
    pub best_crunch_ms: Option<f64>,
    /// Purchased meta-upgrade ids (see `prestige::META_UPGRADES`).
    pub upgrades: BTreeSet<u32>,
    /// Disables the crunch ceiling once unlocked.
    pub limit_broken: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub notation: Notation,
    /// Preferred quantity for the UI's bulk-buy button.
    pub bulk_buy: u32,
    pub skip_confirm: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notation: Notation::Scientific,
            bulk_buy: 10,
            skip_confirm: false,
        }
    }
}

/// Engine phase. While `Crunching`, ticking is suspended and every
/// mutating operation is refused. Transient, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Crunching { remaining_seconds: f64 },
}

/// Message log entry for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

const MAX_LOG_ENTRIES: usize = 50;

/// Full engine state. Field groups mirror the reset ladder: run fields
/// clear on Linac, `linac_count` on Shift, everything except `infinity`
/// and `settings` on a Big Crunch.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    // Run scope
    pub particles: f64,
    pub total_particles: f64,
    /// Run start clock (ms).
    pub start_time: f64,
    /// Last simulated instant (ms). Advanced by the live loop; the gap
    /// against wall clock at load time drives the offline simulator.
    pub last_tick: f64,
    pub generators: Vec<Generator>,

    // Shift scope
    pub linac_count: u32,

    // Meta scope
    pub shift_count: u32,
    pub stats: Stats,

    // Permanent
    pub infinity: InfinityState,
    pub settings: Settings,

    // Transient
    pub phase: Phase,
    pub log: Vec<LogEntry>,
}

impl GameState {
    pub fn new(tuning: &Tuning, now_ms: f64) -> Self {
        Self {
            particles: tuning.starting_particles,
            total_particles: tuning.starting_particles,
            start_time: now_ms,
            last_tick: now_ms,
            generators: tuning.tiers.iter().map(Generator::new).collect(),
            linac_count: 0,
            shift_count: 0,
            stats: Stats {
                crunch_started_at: now_ms,
                ..Stats::default()
            },
            infinity: InfinityState::default(),
            settings: Settings::default(),
            phase: Phase::Idle,
            log: Vec::new(),
        }
    }

    /// Clear the run layer: currency, generator progress, run clock.
    /// The balance restarts at the starting grant but the run's
    /// production counter restarts at zero, not at the grant.
    pub fn reset_run(&mut self, tuning: &Tuning) {
        self.particles = tuning.starting_particles;
        self.total_particles = 0.0;
        self.start_time = self.last_tick;
        for gen in &mut self.generators {
            gen.reset_run();
        }
    }

    /// Instantaneous particles/sec at the given global multiplier.
    pub fn production_rate(&self, global_multiplier: f64) -> f64 {
        match self.generators.first() {
            Some(g) => g.owned * g.production_multiplier * global_multiplier,
            None => 0.0,
        }
    }

    /// Seconds since the current run started.
    pub fn elapsed_run_seconds(&self) -> f64 {
        ((self.last_tick - self.start_time) / 1000.0).max(0.0)
    }

    pub fn is_crunching(&self) -> bool {
        matches!(self.phase, Phase::Crunching { .. })
    }

    pub fn add_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > MAX_LOG_ENTRIES {
            self.log.remove(0);
        }
    }
}
