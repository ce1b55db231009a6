//! Geometric cost curves for generator purchases, and the purchase
//! application itself.
//!
//! Every generator's n-th unit costs `base * growth^n`, so bulk prices
//! and "how many can I afford" both have closed forms. The curve math
//! stays pure over scalars so balance tooling can call it without a
//! full game state; `buy`/`buy_max` apply those prices to a state.
//! Manual purchases and the autobuyer go through the same two entry
//! points, so there is no second pricing path to drift.

use crate::state::GameState;
use crate::tuning::Tuning;

/// Price of the next unit once `purchased` units have been bought.
pub fn unit_cost(base: f64, growth: f64, purchased: u32) -> f64 {
    base * growth.powf(purchased as f64)
}

/// Total price of the next `count` units (geometric series sum).
///
/// Overflow to infinity is deliberate: an infinite price can never be
/// afforded, so oversized requests refuse themselves.
pub fn bulk_cost(base: f64, growth: f64, purchased: u32, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let first = unit_cost(base, growth, purchased);
    if growth == 1.0 {
        return first * count as f64;
    }
    first * (growth.powf(count as f64) - 1.0) / (growth - 1.0)
}

/// Largest `count` with `bulk_cost(..) <= budget`.
///
/// Inverts the series sum in log space, then nudges the estimate until
/// it is exactly maximal under the same arithmetic `bulk_cost` uses.
/// `growth` below 1 is not meaningful here; curves are non-decreasing.
pub fn max_affordable(base: f64, growth: f64, purchased: u32, budget: f64) -> u32 {
    if !budget.is_finite() || budget <= 0.0 {
        return 0;
    }
    let first = unit_cost(base, growth, purchased);
    if !first.is_finite() {
        return 0;
    }
    if first <= 0.0 {
        // Degenerate curve; every count is affordable.
        return u32::MAX;
    }
    if growth == 1.0 {
        return ((budget / first).floor()).min(u32::MAX as f64) as u32;
    }

    let ratio = budget / first * (growth - 1.0) + 1.0;
    let estimate = if ratio.is_finite() && ratio > 0.0 {
        ratio.log(growth).floor()
    } else if growth > 1.0 {
        // The ratio saturates f64 before the budget runs out; inverting
        // in log space keeps every term finite, and the nudge loops
        // below settle the exact boundary.
        ((budget.ln() - first.ln() + (growth - 1.0).ln()) / growth.ln()).floor()
    } else {
        // Decreasing curve whose full series fits the budget.
        return u32::MAX;
    };
    let mut count = estimate.max(0.0).min(u32::MAX as f64) as u32;

    // Log precision can land one step off in either direction.
    while count > 0 && bulk_cost(base, growth, purchased, count) > budget {
        count -= 1;
    }
    while count < u32::MAX && bulk_cost(base, growth, purchased, count + 1) <= budget {
        count += 1;
    }
    count
}

/// Buy `count` units of tier `index`, paying the bulk price. Returns
/// the amount paid, or `None` if the purchase is refused (bad index,
/// zero count, not enough particles, or a crunch in progress).
pub fn buy(state: &mut GameState, tuning: &Tuning, index: usize, count: u32) -> Option<f64> {
    if state.is_crunching() || count == 0 {
        return None;
    }
    let gen = state.generators.get(index)?;
    let price = bulk_cost(gen.base_cost, gen.cost_growth, gen.purchased, count);
    if !price.is_finite() || state.particles < price {
        return None;
    }

    state.particles -= price;
    let gen = &mut state.generators[index];
    gen.owned += count as f64;
    gen.purchased = gen.purchased.saturating_add(count);
    // 購入ボーナス
    gen.production_multiplier *= tuning.purchase_production_factor.powf(count as f64);
    Some(price)
}

/// Buy as many units of tier `index` as the current balance allows.
/// Returns how many were bought (possibly zero).
pub fn buy_max(state: &mut GameState, tuning: &Tuning, index: usize) -> u32 {
    if state.is_crunching() {
        return 0;
    }
    let gen = match state.generators.get(index) {
        Some(g) => g,
        None => return 0,
    };
    let count = max_affordable(gen.base_cost, gen.cost_growth, gen.purchased, state.particles);
    if count == 0 || buy(state, tuning, index, count).is_none() {
        return 0;
    }
    count
}
