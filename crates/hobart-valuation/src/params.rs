//! Tunable valuation parameters.

use serde::{Deserialize, Serialize};

/// Parameters of a valuation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParams {
    /// Growth to project with, replacing the historical assumption
    pub growth_override: Option<f64>,
    /// Growth used when neither an override nor history is available (default: 0.10)
    pub default_growth: f64,
    /// Ceiling on the terminal PE (default: 20)
    pub pe_cap: f64,
    /// Annual rate the future price is discounted at (default: 0.15)
    pub discount_rate: f64,
    /// Fraction taken off the sticker price (default: 0.50)
    pub safety_margin_pct: f64,
    /// Projection horizon in years (default: 10)
    pub horizon_years: u32,
    /// Longest payback reported (default: 10)
    pub payback_max_years: u32,
    /// Owner-earnings yield of the ten-cap price (default: 0.10)
    pub ten_cap_yield: f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self {
            growth_override: None,
            default_growth: 0.10,
            pe_cap: 20.0,
            discount_rate: 0.15,
            safety_margin_pct: 0.50,
            horizon_years: 10,
            payback_max_years: 10,
            ten_cap_yield: 0.10,
        }
    }
}

impl ValuationParams {
    /// Growth limits applied before projecting.
    pub const GROWTH_BOUNDS: (f64, f64) = (0.0, 0.5);

    /// Set the growth override.
    pub const fn with_growth(mut self, growth: f64) -> Self {
        self.growth_override = Some(growth);
        self
    }

    /// Set the PE cap.
    pub const fn with_pe_cap(mut self, pe_cap: f64) -> Self {
        self.pe_cap = pe_cap;
        self
    }

    /// Set the discount rate.
    pub const fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    /// Set the margin of safety.
    pub const fn with_safety_margin(mut self, safety_margin_pct: f64) -> Self {
        self.safety_margin_pct = safety_margin_pct;
        self
    }

    /// Clamp a growth rate into [`Self::GROWTH_BOUNDS`].
    pub fn clamp_growth(growth: f64) -> f64 {
        let (low, high) = Self::GROWTH_BOUNDS;
        growth.clamp(low, high)
    }
}
