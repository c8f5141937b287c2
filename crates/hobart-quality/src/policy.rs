//! Scoring policy tables.
//!
//! Every threshold used by the scorer is data in a [`QualityPolicy`], so it
//! can be inspected, serialized and tuned without touching control flow.

use serde::{Deserialize, Serialize};

/// Piecewise-linear mapping from a raw value to a score.
///
/// Points are `(value, score)` sorted by value. Values outside the range
/// take the score of the nearest end point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<(f64, f64)>,
}

impl Curve {
    /// Build a curve; points are sorted by value.
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// `0` at zero rising linearly to `1` at `target`.
    pub fn linear_to(target: f64) -> Self {
        Self::new(vec![(0.0, 0.0), (target, 1.0)])
    }

    /// The curve's points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Score for a value, clamped to the curve's end points.
    pub fn score(&self, value: f64) -> Option<f64> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if value <= first.0 {
            return Some(first.1);
        }
        if value >= last.0 {
            return Some(last.1);
        }
        self.points.windows(2).find_map(|w| {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            (value >= x0 && value <= x1).then(|| {
                if x1 == x0 {
                    y1
                } else {
                    y0 + (y1 - y0) * (value - x0) / (x1 - x0)
                }
            })
        })
    }
}

/// Band of healthy values.
///
/// Inside the band scores 1. Below it scores `value / low * 0.7`; above it
/// decays linearly, reaching 0 at three times the upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBand {
    /// Lower bound of the band
    pub low: f64,
    /// Upper bound of the band
    pub high: f64,
}

impl TargetBand {
    /// Score credited at the bottom edge when approaching from below.
    pub const BELOW_BAND_CEILING: f64 = 0.7;

    /// Create a band.
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Score a value against the band, in `[0, 1]`.
    pub fn score(&self, value: f64) -> f64 {
        let score = if value < self.low {
            if self.low > 0.0 {
                value / self.low * Self::BELOW_BAND_CEILING
            } else {
                0.0
            }
        } else if value > self.high {
            if self.high > 0.0 {
                1.0 - (value - self.high) / (2.0 * self.high)
            } else {
                0.0
            }
        } else {
            1.0
        };
        score.clamp(0.0, 1.0)
    }
}

/// Weights of the moat composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoatWeights {
    /// Average ROIC
    pub roic_avg: f64,
    /// Operating-margin stability
    pub margin_stability: f64,
    /// Gross-margin level and trend
    pub pricing_power: f64,
    /// ROIC persistence
    pub roic_persistence: f64,
}

impl Default for MoatWeights {
    fn default() -> Self {
        Self {
            roic_avg: 0.35,
            margin_stability: 0.20,
            pricing_power: 0.20,
            roic_persistence: 0.25,
        }
    }
}

/// One row of the safety-margin step table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyMarginStep {
    /// Minimum combined quality for this row
    pub min_quality: f64,
    /// Recommended margin of safety
    pub margin: f64,
}

/// Versioned step table from combined quality to margin of safety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMarginPolicy {
    /// Policy version recorded with every score
    pub version: String,
    /// Steps, checked from the highest threshold down
    pub steps: Vec<SafetyMarginStep>,
    /// Margin below every threshold
    pub floor_margin: f64,
    /// Margin when no composite could be computed
    pub unscored_margin: f64,
}

impl Default for SafetyMarginPolicy {
    fn default() -> Self {
        Self::v1()
    }
}

impl SafetyMarginPolicy {
    /// The first published table.
    pub fn v1() -> Self {
        let step = |min_quality, margin| SafetyMarginStep {
            min_quality,
            margin,
        };
        Self {
            version: "v1".to_string(),
            steps: vec![
                step(0.80, 0.30),
                step(0.65, 0.35),
                step(0.50, 0.40),
                step(0.35, 0.50),
            ],
            floor_margin: 0.55,
            unscored_margin: 0.50,
        }
    }

    /// Recommended margin for a combined quality in `[0, 1]`.
    pub fn margin_for(&self, quality: Option<f64>) -> f64 {
        let Some(quality) = quality else {
            return self.unscored_margin;
        };
        let mut steps = self.steps.clone();
        steps.sort_by(|a, b| b.min_quality.total_cmp(&a.min_quality));
        steps
            .iter()
            .find(|s| quality >= s.min_quality)
            .map_or(self.floor_margin, |s| s.margin)
    }
}

/// All scoring thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    /// Average ROIC to score
    pub roic_avg: Curve,
    /// ROIC counted as a good year
    pub roic_target: f64,
    /// Latest gross margin to score
    pub gross_margin_level: Curve,
    /// Gross-margin slope per year to score
    pub gross_margin_trend: Curve,
    /// Years looked back for trends and persistence
    pub window: usize,
    /// Fewest values for stability, trend and persistence
    pub min_history: usize,
    /// ROIC variation above which persistence loses a point
    pub persistence_max_cv: f64,
    /// Healthy capex share of owner earnings
    pub reinvestment: TargetBand,
    /// Healthy dividends plus buybacks share of net income
    pub payout: TargetBand,
    /// Moat composite weights
    pub moat_weights: MoatWeights,
    /// Safety-margin step table
    pub safety_margin: SafetyMarginPolicy,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            roic_avg: Curve::linear_to(0.15),
            roic_target: 0.15,
            gross_margin_level: Curve::new(vec![(0.0, 0.0), (0.30, 0.8), (0.40, 1.0)]),
            gross_margin_trend: Curve::new(vec![(-0.02, 0.0), (0.0, 0.5), (0.01, 1.0)]),
            window: 5,
            min_history: 3,
            persistence_max_cv: 0.3,
            reinvestment: TargetBand::new(0.3, 0.7),
            payout: TargetBand::new(0.0, 0.6),
            moat_weights: MoatWeights::default(),
            safety_margin: SafetyMarginPolicy::v1(),
        }
    }
}
