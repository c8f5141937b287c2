//! Moat subscores.
//!
//! Durable advantages show up as returns on capital that stay high and
//! margins that stay steady or widen.

use crate::policy::QualityPolicy;
use crate::stats::{coefficient_of_variation, mean, slope, tail};
use hobart_metrics::MetricsSeries;
use serde::{Deserialize, Serialize};

/// Moat subscores, their raw inputs, and the weighted composite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoatScore {
    /// Average ROIC over all years with one
    pub roic_avg: Option<f64>,
    /// Score of the average ROIC
    pub roic_avg_score: Option<f64>,
    /// `1 - CV` of operating margin, in `[0, 1]`
    pub margin_stability: Option<f64>,
    /// Latest gross margin
    pub gross_margin_latest: Option<f64>,
    /// Score of the latest gross margin
    pub gross_margin_level: Option<f64>,
    /// Least-squares gross-margin slope per year over the window
    pub gross_margin_slope: Option<f64>,
    /// Score of the slope
    pub gross_margin_trend: Option<f64>,
    /// Mean of the gross-margin level and trend scores
    pub pricing_power: Option<f64>,
    /// Years in the window with ROIC at or above target, less one if volatile (0 to 5)
    pub roic_persistence: Option<u8>,
    /// Persistence count scaled to `[0, 1]`
    pub roic_persistence_score: Option<f64>,
    /// Weighted mean of the present subscores
    pub composite: Option<f64>,
}

/// Operating-margin stability: `1 - pstdev / |mean|`, clamped to `[0, 1]`.
pub fn margin_stability(margins: &[f64], min_history: usize) -> Option<f64> {
    if margins.len() < min_history.max(1) {
        return None;
    }
    let cv = coefficient_of_variation(margins)?;
    Some((1.0 - cv).clamp(0.0, 1.0))
}

/// Count of years at or above `target` among the last `window` ROIC values,
/// minus one if their coefficient of variation exceeds `max_cv`.
pub fn roic_persistence(
    roics: &[f64],
    target: f64,
    window: usize,
    min_history: usize,
    max_cv: f64,
) -> Option<u8> {
    let recent = tail(roics, window);
    if recent.len() < min_history.max(1) {
        return None;
    }
    let hits = recent.iter().filter(|r| **r >= target).count();
    let volatile = coefficient_of_variation(recent).is_some_and(|cv| cv > max_cv);
    let count = if volatile { hits.saturating_sub(1) } else { hits };
    u8::try_from(count).ok()
}

/// Weighted mean over present `(score, weight)` pairs.
pub(crate) fn weighted_mean(parts: &[(Option<f64>, f64)]) -> Option<f64> {
    let (sum, weight) = parts
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |(sum, total), (s, w)| (sum + s, total + w));
    (weight > 0.0).then(|| (sum / weight).clamp(0.0, 1.0))
}

/// Score the moat from a metrics series.
pub fn score_moat(metrics: &MetricsSeries, policy: &QualityPolicy) -> MoatScore {
    let roics = metrics.roic_values();
    let operating_margins: Vec<f64> = metrics
        .records()
        .filter_map(|m| m.operating_margin)
        .collect();
    let gross_margins: Vec<f64> = metrics.records().filter_map(|m| m.gross_margin).collect();

    let roic_avg = mean(&roics);
    let roic_avg_score = roic_avg.and_then(|r| policy.roic_avg.score(r));

    let stability = margin_stability(&operating_margins, policy.min_history);

    let gross_margin_latest = gross_margins.last().copied();
    let gross_margin_level = gross_margin_latest.and_then(|g| policy.gross_margin_level.score(g));
    let recent_gross = tail(&gross_margins, policy.window);
    let gross_margin_slope = if recent_gross.len() >= policy.min_history.max(2) {
        slope(recent_gross)
    } else {
        None
    };
    let gross_margin_trend = gross_margin_slope.and_then(|s| policy.gross_margin_trend.score(s));
    let pricing_power = mean(
        &[gross_margin_level, gross_margin_trend]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>(),
    );

    let persistence = roic_persistence(
        &roics,
        policy.roic_target,
        policy.window,
        policy.min_history,
        policy.persistence_max_cv,
    );
    let persistence_score =
        persistence.map(|count| f64::from(count) / policy.window.max(1) as f64);

    let weights = &policy.moat_weights;
    let composite = weighted_mean(&[
        (roic_avg_score, weights.roic_avg),
        (stability, weights.margin_stability),
        (pricing_power, weights.pricing_power),
        (persistence_score, weights.roic_persistence),
    ]);

    MoatScore {
        roic_avg,
        roic_avg_score,
        margin_stability: stability,
        gross_margin_latest,
        gross_margin_level,
        gross_margin_slope,
        gross_margin_trend,
        pricing_power,
        roic_persistence: persistence,
        roic_persistence_score: persistence_score,
        composite,
    }
}
