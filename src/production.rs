//! The per-tick production cascade.
//!
//! Tier 0 mints particles; every higher tier grows the tier below it.
//! All tiers read their start-of-tick amounts, so within one tick the
//! chain never compounds into itself.

use crate::state::GameState;

/// Add `delta` to `value`, ignoring non-finite deltas and pinning the
/// sum at `f64::MAX` instead of overflowing to infinity.
fn apply_delta(value: f64, delta: f64) -> f64 {
    if !delta.is_finite() {
        return value;
    }
    let next = value + delta;
    if next.is_finite() {
        next
    } else {
        f64::MAX
    }
}

/// Advance all generators by `dt` seconds under `global_multiplier`.
pub fn advance(state: &mut GameState, global_multiplier: f64, dt: f64) {
    if !(dt > 0.0) || !dt.is_finite() {
        return;
    }

    // 粒子の生産 (最下段 -> 粒子)
    let minted = state.production_rate(global_multiplier) * dt;
    state.particles = apply_delta(state.particles, minted);
    state.total_particles = apply_delta(state.total_particles, minted);
    state.stats.lifetime_particles = apply_delta(state.stats.lifetime_particles, minted);

    // カスケード生産 (上位 -> 下位)
    // Ascending order: a producer is read at index i before index i+1
    // writes into it, so every rate uses the pre-tick amount.
    for i in 1..state.generators.len() {
        let producer = &state.generators[i];
        let delta = producer.owned * producer.production_multiplier * global_multiplier * dt;
        state.generators[i - 1].owned = apply_delta(state.generators[i - 1].owned, delta);
    }
}
