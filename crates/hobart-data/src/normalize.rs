//! Statement normalization.
//!
//! Reduces the extractor's candidate observations to exactly one value per
//! (fiscal year, field) and assembles canonical statements from them.
//!
//! Years are discovered from primary annual forms (10-K, 20-F, 40-F). For
//! each field the candidates are that year's primary-form observations; if
//! there are none, amendments and other full-year observations are used
//! instead. Each filing's earlier periods are comparatives and drop out
//! before ranking, so a prior year reported under a better alias never
//! stands in for the current one. Among the remaining candidates the
//! winner is decided by a total order so the result never depends on input
//! order:
//!
//! 1. lowest alias rank
//! 2. primary form before fallback
//! 3. most recently filed
//! 4. latest period end (current period over prior-year comparatives)
//! 5. accession number, then value

use crate::edgar::facts::FactFeed;
use crate::extract::{FactExtractor, FormType, RawObservation};
use crate::fields::{FieldName, StatementKind};
use crate::statements::StatementSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Normalizer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Duration facts shorter than this are quarterly slices and ignored
    pub min_annual_days: i64,
    /// Allow amended and non-primary full-year observations to fill gaps
    pub allow_fallback: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_annual_days: 300,
            allow_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Primary,
    Fallback,
}

/// Builds canonical statements from raw observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementNormalizer {
    config: NormalizerConfig,
}

impl StatementNormalizer {
    /// Create a normalizer.
    pub const fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// The options in use.
    pub const fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Extract and normalize a feed in one step.
    pub fn normalize_feed(&self, extractor: &FactExtractor, feed: &FactFeed) -> StatementSet {
        let observations = extractor.extract(feed);
        self.normalize(feed.cik.clone(), feed.entity_name.clone(), &observations)
    }

    /// Normalize one company's observations.
    pub fn normalize(
        &self,
        cik: Option<String>,
        entity_name: Option<String>,
        observations: &[RawObservation],
    ) -> StatementSet {
        let mut candidates: BTreeMap<(i32, FieldName), Vec<(Tier, &RawObservation)>> =
            BTreeMap::new();
        let mut years = BTreeSet::new();

        for obs in observations {
            let Some(tier) = self.classify(obs) else {
                continue;
            };
            if tier == Tier::Primary {
                years.insert(obs.fiscal_year);
            }
            candidates
                .entry((obs.fiscal_year, obs.field))
                .or_default()
                .push((tier, obs));
        }

        let mut set = StatementSet::new(cik, entity_name);
        for &year in &years {
            let mut values = BTreeMap::new();
            for field in FieldName::ALL {
                let Some(found) = candidates.get(&(year, field)) else {
                    continue;
                };
                let has_primary = found.iter().any(|(tier, _)| *tier == Tier::Primary);
                let pool: Vec<&(Tier, &RawObservation)> = found
                    .iter()
                    .filter(|(tier, _)| !has_primary || *tier == Tier::Primary)
                    .collect();
                let current = current_periods(&pool);
                let winner = pool
                    .into_iter()
                    .filter(|(_, obs)| {
                        current.get(&obs.accession.as_deref()) == Some(&obs.period_end)
                    })
                    .min_by(|a, b| compare_candidates(a, b));

                if let Some((tier, obs)) = winner {
                    tracing::debug!(
                        year,
                        field = %field,
                        tag = %obs.tag,
                        rank = obs.alias_rank,
                        fallback = *tier == Tier::Fallback,
                        value = obs.value,
                        "selected observation"
                    );
                    values.insert(field, obs.value);
                }
            }
            set.insert_year(year, &values);
        }

        tracing::info!(
            cik = set.cik.as_deref().unwrap_or("-"),
            years = years.len(),
            statements = set.statement_count(),
            "normalized statements"
        );
        set
    }

    /// Whether an observation may supply a value, and at which tier.
    fn classify(&self, obs: &RawObservation) -> Option<Tier> {
        if !obs.field.unit().accepts(&obs.unit) || obs.form.is_interim() {
            return None;
        }
        if obs.field.statement() != StatementKind::BalanceSheet
            && let Some(days) = obs.duration_days()
            && days < self.config.min_annual_days
        {
            return None;
        }

        if obs.form.is_primary_annual() {
            return Some(Tier::Primary);
        }
        if !self.config.allow_fallback {
            return None;
        }
        let full_year = obs.fiscal_period.as_deref() == Some("FY");
        match obs.form {
            FormType::AnnualAmendment => Some(Tier::Fallback),
            FormType::Other(_) if full_year => Some(Tier::Fallback),
            _ => None,
        }
    }
}

/// Latest period end each filing reports; its earlier periods are
/// comparatives.
fn current_periods<'a>(
    candidates: &[&(Tier, &'a RawObservation)],
) -> BTreeMap<Option<&'a str>, NaiveDate> {
    let mut periods: BTreeMap<Option<&'a str>, NaiveDate> = BTreeMap::new();
    for &&(_, obs) in candidates {
        periods
            .entry(obs.accession.as_deref())
            .and_modify(|end| *end = (*end).max(obs.period_end))
            .or_insert(obs.period_end);
    }
    periods
}

/// Total order over candidates; the minimum wins.
fn compare_candidates(a: &(Tier, &RawObservation), b: &(Tier, &RawObservation)) -> Ordering {
    let (tier_a, a) = a;
    let (tier_b, b) = b;
    a.alias_rank
        .cmp(&b.alias_rank)
        .then_with(|| tier_a.cmp(tier_b))
        // Later filed first; a missing date sorts last.
        .then_with(|| b.filed.cmp(&a.filed))
        .then_with(|| b.period_end.cmp(&a.period_end))
        .then_with(|| a.accession.cmp(&b.accession))
        .then_with(|| a.value.total_cmp(&b.value))
}
