//! Balance parameters for the progression engine.
//!
//! Every constant that gets retuned between iterations lives here, so the
//! engine never hard-codes a curve at a use site. Tests override single
//! fields; the browser build uses `Tuning::default()`.

/// Static configuration of one generator tier.
#[derive(Clone, Debug)]
pub struct TierSpec {
    pub name: &'static str,
    pub base_cost: f64,
    /// Cost ratio per unit purchased. Always > 1.
    pub cost_growth: f64,
}

#[derive(Clone, Debug)]
pub struct Tuning {
    /// Generator tiers, ordered tier 0 (produces particles) upward.
    pub tiers: Vec<TierSpec>,
    /// Particles a fresh run starts with.
    pub starting_particles: f64,
    /// Each purchased unit multiplies its tier's production by this.
    pub purchase_production_factor: f64,

    // Prestige ladder
    /// Linac requirement: `linac_req_base + linac_req_step * linac_count`
    /// units of the top tier owned.
    pub linac_req_base: f64,
    pub linac_req_step: f64,
    /// Shift requirement: `shift_req_base + shift_req_step * shift_count`
    /// linac resets performed.
    pub shift_req_base: u32,
    pub shift_req_step: u32,
    /// Global multiplier base: `mult_base + mult_step * shift_count`,
    /// raised to the linac_count power.
    pub mult_base: f64,
    pub mult_step: f64,

    // Big Crunch
    /// Currency ceiling that triggers a crunch. f64::MAX means "on
    /// floating point overflow".
    pub crunch_threshold: f64,
    /// Presentation delay during which the simulation is suspended.
    pub crunch_delay_seconds: f64,
    /// Infinity points awarded per crunch before upgrade scaling.
    pub base_ip_award: f64,

    // Autobuyers
    /// Tier i unlocks at 10^(auto_unlock_base_exp + auto_unlock_step_exp * i).
    pub auto_unlock_base_exp: f64,
    pub auto_unlock_step_exp: f64,
    /// Seconds between autobuyer sweeps.
    pub autobuy_interval_seconds: f64,

    // Clocks
    /// Live tick dt clamp. Larger gaps go through the offline simulator.
    pub max_tick_seconds: f64,
    /// Offline simulation kicks in above this gap.
    pub offline_threshold_seconds: f64,
    /// Offline gap cap (default 7 days).
    pub max_offline_seconds: f64,
    /// Discretization steps for the offline replay.
    pub offline_steps: u32,
    /// Seconds between autosaves in the frame loop.
    pub autosave_interval_seconds: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierSpec { name: "Accelerator Mk.1", base_cost: 10.0, cost_growth: 1.5 },
                TierSpec { name: "Accelerator Mk.2", base_cost: 100.0, cost_growth: 1.8 },
                TierSpec { name: "Accelerator Mk.3", base_cost: 1e3, cost_growth: 2.2 },
                TierSpec { name: "Accelerator Mk.4", base_cost: 1e4, cost_growth: 3.0 },
                TierSpec { name: "Accelerator Mk.5", base_cost: 1e6, cost_growth: 4.0 },
                TierSpec { name: "Accelerator Mk.6", base_cost: 1e8, cost_growth: 6.0 },
                TierSpec { name: "Accelerator Mk.7", base_cost: 1e10, cost_growth: 10.0 },
                TierSpec { name: "Accelerator Mk.8", base_cost: 1e12, cost_growth: 15.0 },
            ],
            starting_particles: 10.0,
            purchase_production_factor: 1.1,

            linac_req_base: 1.0,
            linac_req_step: 10.0,
            shift_req_base: 5,
            shift_req_step: 5,
            mult_base: 1.2,
            mult_step: 0.2,

            crunch_threshold: f64::MAX,
            crunch_delay_seconds: 3.0,
            base_ip_award: 1.0,

            auto_unlock_base_exp: 50.0,
            auto_unlock_step_exp: 10.0,
            autobuy_interval_seconds: 0.5,

            max_tick_seconds: 1.0,
            offline_threshold_seconds: 1.0,
            max_offline_seconds: 86_400.0 * 7.0,
            offline_steps: 1000,
            autosave_interval_seconds: 10.0,
        }
    }
}

impl Tuning {
    /// Number of generator tiers.
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Index of the top tier (linac requirement is measured there).
    /// Returns 0 when `tiers` is empty.
    pub fn top_tier(&self) -> usize {
        self.tiers.len().saturating_sub(1)
    }

    /// Particles needed before tier `index` unlocks its autobuyer.
    pub fn auto_unlock_threshold(&self, index: usize) -> f64 {
        10f64.powf(self.auto_unlock_base_exp + self.auto_unlock_step_exp * index as f64)
    }
}
