//! Balance simulator for the particle progression.
//! Run with: cargo test -p the-particle simulate_progression -- --nocapture

#[cfg(test)]
mod tests {
    use crate::cost;
    use crate::format;
    use crate::prestige;
    use crate::production;
    use crate::state::{GameState, Notation};
    use crate::tuning::Tuning;

    /// Cascade look-ahead used to value higher tiers.
    const HORIZON_SECONDS: f64 = 120.0;

    /// Particles per second one more unit of `index` is worth, over the
    /// look-ahead horizon. Tier 0 pays out directly; a unit of tier i
    /// yields roughly H^i / i-chain-factorial units of direct output,
    /// so deep tiers are discounted accordingly.
    fn unit_value_per_second(state: &GameState, global: f64, index: usize) -> f64 {
        let mut total = 1.0;
        let mut chain = 1.0;
        for (depth, gen) in state.generators[..=index].iter().enumerate() {
            total *= global * gen.production_multiplier;
            chain *= (depth + 1) as f64;
        }
        total * HORIZON_SECONDS.powi(index as i32) / chain
    }

    /// Find the affordable tier with the best ROI (lowest payback time).
    fn find_best_tier(state: &GameState, tuning: &Tuning) -> Option<usize> {
        let global = prestige::global_multiplier(state, tuning);
        let mut best: Option<(f64, usize)> = None; // (payback_seconds, tier)

        for (i, gen) in state.generators.iter().enumerate() {
            let price = cost::unit_cost(gen.base_cost, gen.cost_growth, gen.purchased);
            if state.particles < price {
                continue;
            }
            let gain = unit_value_per_second(state, global, i);
            if gain <= 0.0 {
                continue;
            }
            let payback = price / gain;
            let dominated = best.as_ref().map_or(false, |(bp, _)| *bp <= payback);
            if !dominated {
                best = Some((payback, i));
            }
        }

        best.map(|(_, i)| i)
    }

    /// Report game stats at a given time.
    fn report_stats(state: &GameState, tuning: &Tuning, seconds: u32, purchases_made: u32) {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        let global = prestige::global_multiplier(state, tuning);

        eprintln!("┌─── {}分{}秒 ─────────────────────────", minutes, secs);
        eprintln!(
            "│ 粒子: {}  生産: {}/s  倍率: x{}",
            format::format(state.particles, Notation::Scientific),
            format::format(state.production_rate(global), Notation::Scientific),
            format::format(global, Notation::Scientific),
        );
        eprintln!(
            "│ リニアック: {}  シフト: {}  購入: {}",
            state.linac_count, state.shift_count, purchases_made
        );

        // Tier counts
        let counts: Vec<String> = tuning
            .tiers
            .iter()
            .zip(&state.generators)
            .map(|(spec, gen)| format!("{}:{}", spec.name, gen.owned as u64))
            .collect();
        eprintln!("│ 保有: {}", counts.join("  "));

        // Production multipliers accumulated from purchases
        let mults: Vec<String> = tuning
            .tiers
            .iter()
            .zip(&state.generators)
            .filter(|(_, gen)| gen.purchased > 0)
            .map(|(spec, gen)| format!("{}:x{:.2}", spec.name, gen.production_multiplier))
            .collect();
        if !mults.is_empty() {
            eprintln!("│ 購入倍率: {}", mults.join("  "));
        }

        // Next purchase candidate
        if let Some(i) = find_best_tier(state, tuning) {
            let gen = &state.generators[i];
            let price = cost::unit_cost(gen.base_cost, gen.cost_growth, gen.purchased);
            eprintln!(
                "│ 次の購入候補: {} ({})",
                tuning.tiers[i].name,
                format::format(price, Notation::Scientific)
            );
        }

        // Distance to the next reset
        let requirement = prestige::linac_requirement(state, tuning);
        let top_owned = state.generators.last().map(|g| g.owned).unwrap_or(0.0);
        eprintln!(
            "│ 次のリニアック: {} 台 (保有 {} 台)",
            requirement as u64, top_owned as u64
        );

        eprintln!("└────────────────────────────────────");
    }

    /// Simulate greedy play for `total_seconds`: buy the best-ROI tier
    /// whenever affordable, reset the moment a reset is available.
    fn simulate(total_seconds: u32) {
        let tuning = Tuning::default();
        let mut state = GameState::new(&tuning, 0.0);

        let mut total_purchases: u32 = 0;
        let mut last_purchase_time: u32 = 0;
        let mut max_idle_gap: u32 = 0;
        let mut idle_gaps: Vec<u32> = Vec::new();
        let mut linac_times: Vec<u32> = Vec::new();
        let mut shift_times: Vec<u32> = Vec::new();

        // Report at these times (seconds)
        let report_times: Vec<u32> = vec![30, 60, 120, 300, 600, 900, 1800, 3600, 5400, 7200];
        let mut next_report_idx = 0;

        eprintln!("\n========================================");
        eprintln!("  the Particle バランスシミュレーター");
        eprintln!("  プレイ時間: {}分", total_seconds / 60);
        eprintln!("========================================\n");

        for second in 1..=total_seconds {
            let global = prestige::global_multiplier(&state, &tuning);
            production::advance(&mut state, global, 1.0);
            state.last_tick += 1000.0;

            // Greedy: buy best ROI until nothing is affordable
            let mut bought_this_second = false;
            for _ in 0..50 {
                // Safety limit
                match find_best_tier(&state, &tuning) {
                    Some(i) => {
                        if cost::buy(&mut state, &tuning, i, 1).is_some() {
                            bought_this_second = true;
                            total_purchases += 1;
                        } else {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Reset as soon as the requirement is met; the multiplier
            // compounds faster than any single run can.
            if prestige::attempt_linac(&mut state, &tuning) {
                linac_times.push(second);
            }
            if prestige::attempt_shift(&mut state, &tuning) {
                shift_times.push(second);
            }

            if bought_this_second {
                let gap = second - last_purchase_time;
                if gap > 1 {
                    idle_gaps.push(gap);
                    if gap > max_idle_gap {
                        max_idle_gap = gap;
                    }
                }
                last_purchase_time = second;
            }

            // Report at intervals
            if next_report_idx < report_times.len() && second >= report_times[next_report_idx] {
                report_stats(&state, &tuning, second, total_purchases);
                next_report_idx += 1;
            }
        }

        // Final report
        eprintln!("\n======== 最終サマリー ========");
        report_stats(&state, &tuning, total_seconds, total_purchases);

        // Reset pacing
        eprintln!("\n--- リセット間隔分析 ---");
        let linac_marks: Vec<String> = linac_times
            .iter()
            .map(|t| format!("{}分{}秒", t / 60, t % 60))
            .collect();
        eprintln!("リニアック {} 回: {}", linac_times.len(), linac_marks.join(", "));
        if !shift_times.is_empty() {
            let shift_marks: Vec<String> = shift_times
                .iter()
                .map(|t| format!("{}分{}秒", t / 60, t % 60))
                .collect();
            eprintln!("シフト {} 回: {}", shift_times.len(), shift_marks.join(", "));
        }

        // Idle gap analysis
        eprintln!("\n--- 購入間隔分析 ---");
        eprintln!("総購入回数: {}", total_purchases);
        eprintln!("最大待ち時間: {}秒", max_idle_gap);
        let long_gaps: Vec<&u32> = idle_gaps.iter().filter(|g| **g >= 10).collect();
        eprintln!("10秒以上の待ち: {}回", long_gaps.len());
        let very_long_gaps: Vec<&u32> = idle_gaps.iter().filter(|g| **g >= 30).collect();
        eprintln!("30秒以上の待ち: {}回", very_long_gaps.len());

        if !idle_gaps.is_empty() {
            let avg_gap: f64 =
                idle_gaps.iter().map(|g| *g as f64).sum::<f64>() / idle_gaps.len() as f64;
            eprintln!("平均待ち時間: {:.1}秒", avg_gap);
        }
        eprintln!("==============================\n");
    }

    #[test]
    fn simulate_progression_30min() {
        simulate(1800);
    }

    #[test]
    fn simulate_progression_2hours() {
        simulate(7200);
    }
}
