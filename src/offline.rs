//! オフライン進行シミュレーション。
//!
//! ロード時に一度だけ、最後に保存された時刻と現在の差分を離散ステップで
//! 再生する。全体倍率はギャップ開始時点の値を一度だけ取り、以降のステップ
//! では固定する（ステップごとの再計算より粗いが、再生結果が決定的になる）。
//! カスケードは完全に再生し、クランチ判定とオートバイヤーは再生中は
//! 走らせない。獲得量の提示は呼び出し側に任せる。

use crate::prestige;
use crate::production;
use crate::state::GameState;
use crate::tuning::Tuning;

/// What an offline replay produced, for the UI to present.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineReport {
    /// Seconds actually replayed, after the cap.
    pub simulated_seconds: f64,
    pub steps: u32,
    /// Particles gained over the whole replay.
    pub gained: f64,
}

/// Replay `elapsed_seconds` of production in discrete steps.
/// Does not touch the clocks; the caller re-anchors `last_tick`.
pub fn simulate(state: &mut GameState, tuning: &Tuning, elapsed_seconds: f64) -> OfflineReport {
    let seconds = if elapsed_seconds.is_finite() {
        elapsed_seconds.clamp(0.0, tuning.max_offline_seconds)
    } else {
        0.0
    };
    let steps = tuning.offline_steps.max(1);
    let dt = seconds / steps as f64;

    let initial = state.particles;
    let global_multiplier = prestige::global_multiplier(state, tuning);
    for _ in 0..steps {
        production::advance(state, global_multiplier, dt);
    }

    OfflineReport {
        simulated_seconds: seconds,
        steps,
        gained: state.particles - initial,
    }
}
