//! Management subscores.
//!
//! Capital allocation is judged from how much of owner earnings goes back
//! into the business and how much of net income is returned to holders.

use crate::policy::QualityPolicy;
use crate::stats::{mean, tail};
use hobart_data::StatementSet;
use hobart_metrics::MetricsSeries;
use serde::{Deserialize, Serialize};

/// Management subscores and composite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagementScore {
    /// Average capex share of owner earnings over the window
    pub reinvestment_ratio_avg: Option<f64>,
    /// Band score of the reinvestment ratio
    pub reinvestment_score: Option<f64>,
    /// Average dividends plus buybacks share of net income over the window
    pub payout_ratio_avg: Option<f64>,
    /// Band score of the payout ratio
    pub payout_score: Option<f64>,
    /// Mean of the present subscores
    pub composite: Option<f64>,
}

/// Capex over owner earnings, for years with positive owner earnings.
pub fn reinvestment_ratios(statements: &StatementSet, metrics: &MetricsSeries) -> Vec<f64> {
    metrics
        .records()
        .filter_map(|m| {
            let owner_earnings = m.owner_earnings.filter(|oe| *oe > 0.0)?;
            let capex = statements.cash_flow.get(&m.fiscal_year)?.capex?;
            Some(capex.abs() / owner_earnings)
        })
        .collect()
}

/// Dividends plus buybacks over net income, for years with positive net
/// income and a cash flow statement. An unreported payout counts as none.
pub fn payout_ratios(statements: &StatementSet) -> Vec<f64> {
    statements
        .income
        .iter()
        .filter_map(|(year, income)| {
            let net_income = income.net_income.filter(|ni| *ni > 0.0)?;
            let cash_flow = statements.cash_flow.get(year)?;
            let returned = cash_flow.dividends.map_or(0.0, f64::abs)
                + cash_flow.buybacks.map_or(0.0, f64::abs);
            Some(returned / net_income)
        })
        .collect()
}

/// Score management from statements and metrics.
pub fn score_management(
    statements: &StatementSet,
    metrics: &MetricsSeries,
    policy: &QualityPolicy,
) -> ManagementScore {
    let reinvestment = reinvestment_ratios(statements, metrics);
    let reinvestment_ratio_avg = mean(tail(&reinvestment, policy.window));
    let payout_ratio_avg = mean(tail(&payout_ratios(statements), policy.window));

    let reinvestment_score = reinvestment_ratio_avg.map(|r| policy.reinvestment.score(r));
    let payout_score = payout_ratio_avg.map(|r| policy.payout.score(r));
    let composite = mean(
        &[reinvestment_score, payout_score]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>(),
    );

    ManagementScore {
        reinvestment_ratio_avg,
        reinvestment_score,
        payout_ratio_avg,
        payout_score,
        composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hobart_data::FieldName;
    use hobart_metrics::MetricsCalculator;
    use std::collections::BTreeMap;

    fn statements(capex: f64, dividends: Option<f64>, net_income: f64) -> StatementSet {
        let mut set = StatementSet::default();
        for year in 2019..=2021 {
            let mut values = BTreeMap::from([
                (FieldName::NetIncome, net_income),
                (FieldName::Cfo, 1000.0),
                (FieldName::Capex, capex),
                (FieldName::Buybacks, 100.0),
            ]);
            if let Some(d) = dividends {
                values.insert(FieldName::Dividends, d);
            }
            set.insert_year(year, &values);
        }
        set
    }

    fn score(set: &StatementSet) -> ManagementScore {
        let metrics = MetricsCalculator::default().compute(set);
        score_management(set, &metrics, &QualityPolicy::default())
    }

    #[test]
    fn test_balanced_allocator() {
        // capex 333.3 of owner earnings 666.7 = 0.5; payout 300 / 1000 = 0.3
        let s = score(&statements(1000.0 / 3.0, Some(200.0), 1000.0));
        assert_relative_eq!(s.reinvestment_ratio_avg.unwrap(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(s.payout_ratio_avg.unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(s.composite.unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_dividends_count_as_zero() {
        let s = score(&statements(100.0, None, 1000.0));
        assert_relative_eq!(s.payout_ratio_avg.unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_losses_have_no_payout_ratio() {
        let s = score(&statements(100.0, Some(50.0), -20.0));
        assert!(s.payout_ratio_avg.is_none());
        assert!(s.payout_score.is_none());
        // Composite falls back to the reinvestment score alone.
        assert_relative_eq!(s.composite.unwrap(), s.reinvestment_score.unwrap());
    }

    #[test]
    fn test_no_cash_flows_no_composite() {
        let mut set = StatementSet::default();
        set.insert_year(2021, &BTreeMap::from([(FieldName::NetIncome, 10.0)]));
        let s = score(&set);
        assert_eq!(s, ManagementScore::default());
    }

    #[test]
    fn test_composite_in_bounds() {
        for capex in [0.0, 100.0, 500.0, 900.0, 990.0] {
            for ni in [1.0, 100.0, 10_000.0] {
                let s = score(&statements(capex, Some(5000.0), ni));
                let composite = s.composite.unwrap();
                assert!((0.0..=1.0).contains(&composite), "{composite}");
            }
        }
    }
}
