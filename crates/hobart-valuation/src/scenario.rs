//! Valuation scenarios.
//!
//! A scenario records the inputs actually used, after resolving overrides
//! and fallbacks, next to every output, so the same record can be
//! reproduced from its own contents.

use crate::params::ValuationParams;
use crate::payback::{payback_years, ten_cap_price};
use crate::sticker::{StickerPrice, sticker_price, terminal_pe};
use chrono::{DateTime, Utc};
use derive_more::Display;
use hobart_data::StatementSet;
use hobart_metrics::{MetricsSeries, latest_eps};
use serde::{Deserialize, Serialize};

/// Company data a valuation is computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// CIK of the company
    pub cik: Option<String>,
    /// Latest diluted EPS
    pub eps0: Option<f64>,
    /// Latest owner earnings per share
    pub owner_earnings_per_share: Option<f64>,
    /// Historical growth rate
    pub historical_growth: Option<f64>,
    /// Historical average PE
    pub historical_pe: Option<f64>,
    /// Current share price
    pub current_price: Option<f64>,
}

impl ValuationInputs {
    /// Inputs from a company's statements and metrics.
    pub fn from_history(statements: &StatementSet, metrics: &MetricsSeries) -> Self {
        Self {
            cik: statements.cik.clone(),
            eps0: latest_eps(statements),
            owner_earnings_per_share: metrics.latest_owner_earnings_per_share(),
            historical_growth: metrics.growth_assumption(),
            historical_pe: None,
            current_price: None,
        }
    }

    /// Set the current price.
    pub const fn with_price(mut self, price: Option<f64>) -> Self {
        self.current_price = price;
        self
    }

    /// Set the historical PE.
    pub const fn with_historical_pe(mut self, pe: Option<f64>) -> Self {
        self.historical_pe = pe;
        self
    }
}

/// Where the projected growth came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum GrowthSource {
    /// Supplied by the caller
    #[display("override")]
    Override,
    /// Historical CAGR
    #[display("historical")]
    Historical,
    /// Default growth parameter
    #[display("default")]
    Default,
}

/// Where the owner earnings per share came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum OwnerEarningsSource {
    /// Reported cash flows
    #[display("reported")]
    Reported,
    /// Diluted EPS standing in for missing cash flows
    #[display("eps")]
    Eps,
}

/// What payback was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PaybackBasis {
    /// Current share price
    #[display("price")]
    Price,
    /// Safety price
    #[display("safety_price")]
    SafetyPrice,
}

/// Inputs as resolved for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputs {
    /// Latest diluted EPS
    pub eps0: Option<f64>,
    /// Growth before clamping
    pub growth_raw: f64,
    /// Growth after clamping
    pub growth: f64,
    /// Where growth came from
    pub growth_source: GrowthSource,
    /// PE cap
    pub pe_cap: f64,
    /// Historical PE, if any
    pub historical_pe: Option<f64>,
    /// Discount rate
    pub discount_rate: f64,
    /// Margin of safety
    pub safety_margin_pct: f64,
    /// Owner earnings per share used for payback and ten cap
    pub owner_earnings_per_share: Option<f64>,
    /// Where owner earnings came from
    pub owner_earnings_source: Option<OwnerEarningsSource>,
    /// Current share price
    pub current_price: Option<f64>,
    /// Amount payback was measured against
    pub payback_basis: Option<f64>,
    /// Which amount payback was measured against
    pub payback_basis_source: Option<PaybackBasis>,
}

/// Results of one run. Each field is independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutputs {
    /// EPS at the end of the horizon
    pub future_eps: Option<f64>,
    /// Terminal PE used
    pub terminal_pe: f64,
    /// Projected price at the end of the horizon
    pub future_price: Option<f64>,
    /// Discounted intrinsic price
    pub sticker_price: Option<f64>,
    /// Sticker price less the margin of safety
    pub safety_price: Option<f64>,
    /// Years until owner earnings repay the basis
    pub payback_years: Option<u32>,
    /// Owner earnings capitalized at the ten-cap yield
    pub ten_cap_price: Option<f64>,
}

/// One valuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationScenario {
    /// CIK of the company
    pub cik: Option<String>,
    /// When the run happened
    pub as_of: DateTime<Utc>,
    /// Resolved inputs
    pub inputs: ScenarioInputs,
    /// Outputs
    pub outputs: ScenarioOutputs,
}

impl ValuationScenario {
    /// Returns true if the price is at or below the safety price.
    pub fn is_buy(&self, price: f64) -> bool {
        self.outputs.safety_price.is_some_and(|safety| price <= safety)
    }
}

/// Produces [`ValuationScenario`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationCalculator {
    params: ValuationParams,
}

impl ValuationCalculator {
    /// Create a calculator.
    pub const fn new(params: ValuationParams) -> Self {
        Self { params }
    }

    /// The parameters in use.
    pub const fn params(&self) -> &ValuationParams {
        &self.params
    }

    /// Value a company. Never fails; outputs that cannot be computed are `None`.
    pub fn value(&self, inputs: &ValuationInputs, as_of: DateTime<Utc>) -> ValuationScenario {
        let params = &self.params;

        let (growth_raw, growth_source) = match (params.growth_override, inputs.historical_growth) {
            (Some(g), _) => (g, GrowthSource::Override),
            (None, Some(g)) => (g, GrowthSource::Historical),
            (None, None) => (params.default_growth, GrowthSource::Default),
        };
        let growth = ValuationParams::clamp_growth(growth_raw);

        let pe = terminal_pe(growth, params.pe_cap, inputs.historical_pe);
        let sticker: Option<StickerPrice> = inputs.eps0.and_then(|eps0| {
            sticker_price(
                eps0,
                growth,
                pe,
                params.discount_rate,
                params.safety_margin_pct,
                params.horizon_years,
            )
        });

        let (owner_earnings, owner_earnings_source) =
            match (inputs.owner_earnings_per_share, inputs.eps0) {
                (Some(oe), _) => (Some(oe), Some(OwnerEarningsSource::Reported)),
                (None, Some(eps)) => (Some(eps), Some(OwnerEarningsSource::Eps)),
                (None, None) => (None, None),
            };

        let safety_price = sticker.and_then(|s| s.safety_price);
        let (payback_basis, payback_basis_source) = match (inputs.current_price, safety_price) {
            (Some(price), _) if price > 0.0 => (Some(price), Some(PaybackBasis::Price)),
            (_, Some(safety)) => (Some(safety), Some(PaybackBasis::SafetyPrice)),
            _ => (None, None),
        };

        let payback = match (payback_basis, owner_earnings) {
            (Some(basis), Some(oe)) => payback_years(basis, oe, growth, params.payback_max_years),
            _ => None,
        };
        let ten_cap = owner_earnings.and_then(|oe| ten_cap_price(oe, params.ten_cap_yield));

        tracing::debug!(
            cik = inputs.cik.as_deref().unwrap_or("-"),
            growth,
            %growth_source,
            terminal_pe = pe,
            sticker = ?sticker.and_then(|s| s.sticker),
            "valued company"
        );

        ValuationScenario {
            cik: inputs.cik.clone(),
            as_of,
            inputs: ScenarioInputs {
                eps0: inputs.eps0,
                growth_raw,
                growth,
                growth_source,
                pe_cap: params.pe_cap,
                historical_pe: inputs.historical_pe,
                discount_rate: params.discount_rate,
                safety_margin_pct: params.safety_margin_pct,
                owner_earnings_per_share: owner_earnings,
                owner_earnings_source,
                current_price: inputs.current_price,
                payback_basis,
                payback_basis_source,
            },
            outputs: ScenarioOutputs {
                future_eps: sticker.map(|s| s.future_eps),
                terminal_pe: pe,
                future_price: sticker.map(|s| s.future_price),
                sticker_price: sticker.and_then(|s| s.sticker),
                safety_price,
                payback_years: payback,
                ten_cap_price: ten_cap,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn inputs() -> ValuationInputs {
        ValuationInputs {
            cik: Some("0000000001".to_string()),
            eps0: Some(2.0),
            owner_earnings_per_share: Some(5.5),
            historical_growth: Some(0.10),
            historical_pe: None,
            current_price: None,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let scenario = ValuationCalculator::default().value(&inputs(), as_of());
        let out = &scenario.outputs;

        assert_eq!(scenario.inputs.growth_source, GrowthSource::Historical);
        assert_relative_eq!(out.terminal_pe, 20.0);
        assert_relative_eq!(out.future_eps.unwrap(), 5.19, max_relative = 0.01);
        assert_relative_eq!(out.future_price.unwrap(), 103.8, max_relative = 0.01);
        assert_relative_eq!(out.sticker_price.unwrap(), 25.66, max_relative = 0.01);
        assert_relative_eq!(out.safety_price.unwrap(), 12.83, max_relative = 0.01);
        assert_relative_eq!(out.ten_cap_price.unwrap(), 55.0, epsilon = 1e-9);
        // Against the safety price: two years (11.55) fall short of 12.8
        assert_eq!(scenario.inputs.payback_basis_source, Some(PaybackBasis::SafetyPrice));
        assert_eq!(out.payback_years, Some(3));
    }

    #[test]
    fn test_override_and_clamp() {
        let calculator = ValuationCalculator::new(ValuationParams::default().with_growth(0.8));
        let scenario = calculator.value(&inputs(), as_of());
        assert_eq!(scenario.inputs.growth_source, GrowthSource::Override);
        assert_eq!(scenario.inputs.growth_raw, 0.8);
        assert_eq!(scenario.inputs.growth, 0.5);

        let negative = ValuationInputs {
            historical_growth: Some(-0.3),
            ..inputs()
        };
        let scenario = ValuationCalculator::default().value(&negative, as_of());
        assert_eq!(scenario.inputs.growth, 0.0);
        assert_relative_eq!(scenario.outputs.terminal_pe, 5.0);
    }

    #[test]
    fn test_default_growth_when_no_history() {
        let no_history = ValuationInputs {
            historical_growth: None,
            ..inputs()
        };
        let scenario = ValuationCalculator::default().value(&no_history, as_of());
        assert_eq!(scenario.inputs.growth_source, GrowthSource::Default);
        assert_eq!(scenario.inputs.growth, 0.10);
    }

    #[test]
    fn test_missing_eps_is_partial() {
        let no_eps = ValuationInputs {
            eps0: None,
            current_price: Some(30.0),
            ..inputs()
        };
        let scenario = ValuationCalculator::default().value(&no_eps, as_of());
        let out = &scenario.outputs;
        assert!(out.future_eps.is_none());
        assert!(out.sticker_price.is_none());
        assert!(out.safety_price.is_none());
        assert_relative_eq!(out.ten_cap_price.unwrap(), 55.0, epsilon = 1e-9);
        assert_eq!(scenario.inputs.payback_basis_source, Some(PaybackBasis::Price));
        assert!(out.payback_years.is_some());
    }

    #[test]
    fn test_degenerate_params_null_prices() {
        let params = ValuationParams::default()
            .with_discount_rate(-1.0)
            .with_pe_cap(0.0);
        let scenario = ValuationCalculator::new(params).value(&inputs(), as_of());
        let out = &scenario.outputs;

        assert_relative_eq!(out.terminal_pe, 5.0);
        assert!(out.future_price.unwrap() > 0.0);
        assert!(out.sticker_price.is_none());
        assert!(out.safety_price.is_none());
        assert!(scenario.inputs.payback_basis_source.is_none());
        assert_relative_eq!(out.ten_cap_price.unwrap(), 55.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_eps_is_partial() {
        let losses = ValuationInputs {
            eps0: Some(-1.0),
            owner_earnings_per_share: None,
            ..inputs()
        };
        let scenario = ValuationCalculator::default().value(&losses, as_of());
        assert!(scenario.outputs.sticker_price.is_none());
        assert_eq!(scenario.inputs.owner_earnings_source, Some(OwnerEarningsSource::Eps));
        assert!(scenario.outputs.ten_cap_price.is_none());
        assert!(scenario.outputs.payback_years.is_none());
    }

    #[test]
    fn test_historical_pe_lowers_terminal_pe() {
        let scenario = ValuationCalculator::default()
            .value(&inputs().with_historical_pe(Some(12.0)), as_of());
        assert_relative_eq!(scenario.outputs.terminal_pe, 12.0);
    }

    #[test]
    fn test_reproducible() {
        let calculator = ValuationCalculator::default();
        let a = calculator.value(&inputs().with_price(Some(40.0)), as_of());
        let b = calculator.value(&inputs().with_price(Some(40.0)), as_of());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_is_buy() {
        let scenario = ValuationCalculator::default().value(&inputs(), as_of());
        assert!(scenario.is_buy(10.0));
        assert!(!scenario.is_buy(20.0));
    }
}
