//! Quality scores.

use crate::management::{ManagementScore, score_management};
use crate::moat::{MoatScore, score_moat};
use crate::policy::QualityPolicy;
use crate::stats::mean;
use chrono::{DateTime, Utc};
use hobart_data::StatementSet;
use hobart_metrics::MetricsSeries;
use serde::{Deserialize, Serialize};

/// Moat and management assessment of a company at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// CIK of the company
    pub cik: Option<String>,
    /// When the score was computed
    pub as_of: DateTime<Utc>,
    /// Moat subscores and composite
    pub moat: MoatScore,
    /// Management subscores and composite
    pub management: ManagementScore,
    /// Mean of the present composites
    pub combined: Option<f64>,
    /// Recommended margin of safety
    pub recommended_safety_margin: f64,
    /// Version of the safety-margin table used
    pub policy_version: String,
}

/// Computes [`QualityScore`]s under a [`QualityPolicy`].
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    policy: QualityPolicy,
}

impl QualityScorer {
    /// Create a scorer.
    pub const fn new(policy: QualityPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub const fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    /// Score a company. Recomputed from scratch on every call.
    pub fn score(
        &self,
        statements: &StatementSet,
        metrics: &MetricsSeries,
        as_of: DateTime<Utc>,
    ) -> QualityScore {
        let moat = score_moat(metrics, &self.policy);
        let management = score_management(statements, metrics, &self.policy);

        let combined = mean(
            &[moat.composite, management.composite]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>(),
        );
        let recommended_safety_margin = self.policy.safety_margin.margin_for(combined);

        tracing::info!(
            cik = statements.cik.as_deref().unwrap_or("-"),
            moat = ?moat.composite,
            management = ?management.composite,
            margin = recommended_safety_margin,
            "scored quality"
        );

        QualityScore {
            cik: statements.cik.clone().or_else(|| metrics.cik.clone()),
            as_of,
            moat,
            management,
            combined,
            recommended_safety_margin,
            policy_version: self.policy.safety_margin.version.clone(),
        }
    }
}
