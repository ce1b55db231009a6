//! The three-layer reset ladder: Linac, Shift, Big Crunch.
//!
//! Each layer clears a wider slice of state and feeds a permanent
//! multiplier. Crunch is the top: it trades the whole universe for
//! infinity points and is the only way anything survives overflow.

use crate::state::{GameState, Phase, Stats};
use crate::tuning::Tuning;

/// Permanent upgrade bought with infinity points.
pub struct MetaUpgrade {
    pub id: u32,
    pub name: &'static str,
    pub cost: f64,
    pub effect: MetaEffect,
}

pub enum MetaEffect {
    /// Flat factor on the global multiplier.
    GlobalFactor(f64),
    /// Multiplier growing with the current run's age, capped.
    PerRunMinute { per_minute: f64, cap: f64 },
    /// Multiplier per lifetime linac reset.
    PerLifetimeLinac(f64),
    /// Factor on the infinity-point award of each crunch.
    CrunchYield(f64),
    /// Removes the overflow ceiling; crunches become impossible.
    BreakLimit,
}

pub const META_UPGRADES: &[MetaUpgrade] = &[
    MetaUpgrade {
        id: 0,
        name: "Starter Surge",
        cost: 1.0,
        effect: MetaEffect::GlobalFactor(2.0),
    },
    MetaUpgrade {
        id: 1,
        name: "Time Dilation",
        cost: 2.0,
        effect: MetaEffect::PerRunMinute { per_minute: 0.1, cap: 5.0 },
    },
    MetaUpgrade {
        id: 2,
        name: "Linac Resonance",
        cost: 3.0,
        effect: MetaEffect::PerLifetimeLinac(0.05),
    },
    MetaUpgrade {
        id: 3,
        name: "Doubled Yield",
        cost: 5.0,
        effect: MetaEffect::CrunchYield(2.0),
    },
    MetaUpgrade {
        id: 4,
        name: "Dimensional Rupture",
        cost: 10.0,
        effect: MetaEffect::BreakLimit,
    },
];

pub fn meta_upgrade(id: u32) -> Option<&'static MetaUpgrade> {
    META_UPGRADES.iter().find(|u| u.id == id)
}

/// Top-tier amount needed for the next Linac reset.
pub fn linac_requirement(state: &GameState, tuning: &Tuning) -> f64 {
    tuning.linac_req_base + tuning.linac_req_step * state.linac_count as f64
}

/// Linac count needed for the next Shift reset.
pub fn shift_requirement(state: &GameState, tuning: &Tuning) -> u32 {
    tuning.shift_req_base + tuning.shift_req_step * state.shift_count
}

/// Per-linac multiplier base; each Shift raises it permanently.
pub fn linac_base_multiplier(state: &GameState, tuning: &Tuning) -> f64 {
    tuning.mult_base + tuning.mult_step * state.shift_count as f64
}

fn meta_factor(effect: &MetaEffect, state: &GameState) -> f64 {
    match effect {
        MetaEffect::GlobalFactor(f) => *f,
        MetaEffect::PerRunMinute { per_minute, cap } => {
            let minutes = state.elapsed_run_seconds() / 60.0;
            (1.0 + per_minute * minutes).min(*cap)
        }
        MetaEffect::PerLifetimeLinac(per) => 1.0 + per * state.stats.total_linacs as f64,
        MetaEffect::CrunchYield(_) | MetaEffect::BreakLimit => 1.0,
    }
}

/// Production multiplier applied to every tier. Depends on live state
/// (run age, counters), so it is recomputed each tick rather than
/// cached.
pub fn global_multiplier(state: &GameState, tuning: &Tuning) -> f64 {
    let mut mult = linac_base_multiplier(state, tuning).powf(state.linac_count as f64);
    for id in &state.infinity.upgrades {
        if let Some(upgrade) = meta_upgrade(*id) {
            mult *= meta_factor(&upgrade.effect, state);
        }
    }
    mult
}

/// Infinity points the next crunch would award.
pub fn crunch_award(state: &GameState, tuning: &Tuning) -> f64 {
    let mut award = tuning.base_ip_award;
    for id in &state.infinity.upgrades {
        if let Some(MetaUpgrade { effect: MetaEffect::CrunchYield(f), .. }) = meta_upgrade(*id) {
            award *= f;
        }
    }
    award
}

/// True once the primary currency has hit the overflow ceiling,
/// unless the ceiling has been broken.
pub fn crunch_ready(state: &GameState, tuning: &Tuning) -> bool {
    !state.infinity.limit_broken
        && !state.is_crunching()
        && state.particles >= tuning.crunch_threshold
}

/// Linac reset: clears the run, bumps the linac counter. Returns false
/// (touching nothing) when the top tier has not reached its
/// requirement.
pub fn attempt_linac(state: &mut GameState, tuning: &Tuning) -> bool {
    if state.is_crunching() {
        return false;
    }
    let required = linac_requirement(state, tuning);
    let top_owned = match state.generators.last() {
        Some(top) => top.owned,
        None => return false,
    };
    if top_owned < required {
        return false;
    }

    state.reset_run(tuning);
    state.linac_count += 1;
    state.stats.total_linacs += 1;
    let mult = global_multiplier(state, tuning);
    state.add_log(
        &format!("リニアック起動！次元が再編された (全体倍率 x{:.2})", mult),
        true,
    );
    true
}

/// Shift reset: everything a Linac does, plus the linac counter folds
/// into a permanently higher multiplier base.
pub fn attempt_shift(state: &mut GameState, tuning: &Tuning) -> bool {
    if state.is_crunching() {
        return false;
    }
    if state.linac_count < shift_requirement(state, tuning) {
        return false;
    }

    state.reset_run(tuning);
    state.linac_count = 0;
    state.shift_count += 1;
    state.stats.total_shifts += 1;
    state.add_log(
        &format!(
            "シフト完了！基底倍率が x{:.1} に上昇",
            linac_base_multiplier(state, tuning)
        ),
        true,
    );
    true
}

/// The Big Crunch: award infinity points, archive the run record, then
/// collapse run, shift and meta layers back to their initial values.
/// Infinity state, settings and autobuyer flags survive. Leaves the
/// machine in `Phase::Crunching` for the presentation delay; the tick
/// loop counts it down.
pub fn big_crunch(state: &mut GameState, tuning: &Tuning) {
    let award = crunch_award(state, tuning);
    let next = state.infinity.points + award;
    state.infinity.points = if next.is_finite() { next } else { f64::MAX };
    state.infinity.crunches += 1;

    let elapsed_ms = (state.last_tick - state.stats.crunch_started_at).max(0.0);
    state.infinity.best_crunch_ms = Some(match state.infinity.best_crunch_ms {
        Some(best) => best.min(elapsed_ms),
        None => elapsed_ms,
    });

    state.reset_run(tuning);
    state.linac_count = 0;
    state.shift_count = 0;
    state.stats = Stats {
        crunch_started_at: state.last_tick,
        ..Stats::default()
    };
    state.add_log(
        &format!("ビッグクランチ！宇宙は崩壊し、無限の粒子が残った (IP +{})", award),
        true,
    );
    state.phase = Phase::Crunching {
        remaining_seconds: tuning.crunch_delay_seconds,
    };
}

/// Spend infinity points on a permanent upgrade. Refuses duplicates and
/// unaffordable or unknown ids.
pub fn buy_meta_upgrade(state: &mut GameState, id: u32) -> bool {
    if state.is_crunching() {
        return false;
    }
    let upgrade = match meta_upgrade(id) {
        Some(u) => u,
        None => return false,
    };
    if state.infinity.upgrades.contains(&id) {
        return false;
    }
    if state.infinity.points < upgrade.cost {
        return false;
    }

    state.infinity.points -= upgrade.cost;
    state.infinity.upgrades.insert(id);
    if let MetaEffect::BreakLimit = upgrade.effect {
        state.infinity.limit_broken = true;
        state.add_log("限界が破られた。もう天井は存在しない", true);
    }
    state.add_log(&format!("∞アップグレード「{}」を獲得！", upgrade.name), true);
    true
}
