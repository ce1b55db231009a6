//! Autobuyers: per-tier "buy max" automation behind very late unlock
//! thresholds.
//!
//! Unlocks latch permanently the moment the live particle balance
//! crosses a tier's threshold; no reset ever re-locks them. The sweep
//! itself prices purchases through the exact same cost path as a
//! manual buy.

use crate::cost;
use crate::state::GameState;
use crate::tuning::Tuning;

/// Latch `auto_unlocked` for every tier whose threshold the current
/// balance has reached. Called each tick so a spike is never missed
/// between saves.
pub fn refresh_unlocks(state: &mut GameState, tuning: &Tuning) {
    for index in 0..state.generators.len() {
        if state.generators[index].auto_unlocked {
            continue;
        }
        if state.particles >= tuning.auto_unlock_threshold(index) {
            state.generators[index].auto_unlocked = true;
            let name = tuning
                .tiers
                .get(index)
                .map(|t| t.name)
                .unwrap_or("???");
            state.add_log(&format!("オートバイヤー解放！{} が自動化された", name), true);
        }
    }
}

/// Flip a tier's `auto_enabled` flag. Returns the new value, or `None`
/// when the tier is unknown or still locked (a locked toggle is a
/// no-op).
pub fn toggle(state: &mut GameState, index: usize) -> Option<bool> {
    let gen = state.generators.get_mut(index)?;
    if !gen.auto_unlocked {
        return None;
    }
    gen.auto_enabled = !gen.auto_enabled;
    Some(gen.auto_enabled)
}

/// One autobuyer pass: buy max for every unlocked-and-enabled tier,
/// cheapest tier first. Silent; individual purchases are not logged.
pub fn sweep(state: &mut GameState, tuning: &Tuning) {
    for index in 0..state.generators.len() {
        if state.generators[index].auto_unlocked && state.generators[index].auto_enabled {
            cost::buy_max(state, tuning, index);
        }
    }
}
