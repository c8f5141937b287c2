//! Integration tests for metrics over normalized statements

use approx::assert_relative_eq;
use hobart_data::{FactExtractor, StatementNormalizer, edgar::FactFeed};
use hobart_metrics::{MetricsCalculator, latest_eps};

fn annual(year: i32, value: f64) -> String {
    format!(
        r#"{{"start": "{y}-01-01", "end": "{y}-12-31", "val": {v}, "fy": {y}, "fp": "FY", "form": "10-K", "filed": "{n}-02-15"}}"#,
        y = year,
        v = value,
        n = year + 1
    )
}

fn instant(year: i32, value: f64) -> String {
    format!(
        r#"{{"end": "{y}-12-31", "val": {v}, "fy": {y}, "fp": "FY", "form": "10-K", "filed": "{n}-02-15"}}"#,
        y = year,
        v = value,
        n = year + 1
    )
}

fn tag(name: &str, unit: &str, facts: Vec<String>) -> String {
    format!(r#""{}": {{"units": {{"{}": [{}]}}}}"#, name, unit, facts.join(","))
}

fn feed() -> FactFeed {
    let years = 2010..=2020;
    let revenue = years.clone().map(|y| annual(y, 1000.0 * 1.08f64.powi(y - 2010))).collect();
    let eps = years.clone().map(|y| annual(y, 1.0 * 1.12f64.powi(y - 2010))).collect();
    let ebit = years.clone().map(|y| annual(y, 200.0)).collect();
    let taxes = years.clone().map(|y| annual(y, 50.0)).collect();
    let cash = years.clone().map(|y| instant(y, 100.0)).collect();
    let equity = years.clone().map(|y| instant(y, 1100.0)).collect();
    let cfo = years.clone().map(|y| annual(y, 180.0)).collect();

    let json = format!(
        r#"{{"cik": 99, "entityName": "Compounder Co", "facts": {{"us-gaap": {{{}}}}}}}"#,
        [
            tag("Revenues", "USD", revenue),
            tag("EarningsPerShareDiluted", "USD/shares", eps),
            tag("OperatingIncomeLoss", "USD", ebit),
            tag("IncomeTaxExpenseBenefit", "USD", taxes),
            tag("CashAndCashEquivalentsAtCarryingValue", "USD", cash),
            tag("StockholdersEquity", "USD", equity),
            tag("NetCashProvidedByUsedInOperatingActivities", "USD", cfo),
        ]
        .join(",")
    );
    FactFeed::parse_json(&json).unwrap()
}

#[test]
fn test_metrics_from_feed() {
    let statements =
        StatementNormalizer::default().normalize_feed(&FactExtractor::default(), &feed());
    let series = MetricsCalculator::default().compute(&statements);

    assert_eq!(series.cik.as_deref(), Some("0000000099"));
    assert_eq!(series.years.len(), 11);

    let latest = series.latest().unwrap();
    assert_eq!(latest.fiscal_year, 2020);
    assert_relative_eq!(latest.rev_cagr_5y.unwrap(), 0.08, epsilon = 1e-9);
    assert_relative_eq!(latest.rev_cagr_10y.unwrap(), 0.08, epsilon = 1e-9);
    assert_relative_eq!(latest.eps_cagr_10y.unwrap(), 0.12, epsilon = 1e-9);

    // No debt tagged: treated as zero for invested capital and net debt.
    assert_relative_eq!(latest.invested_capital.unwrap(), 1000.0);
    assert_relative_eq!(latest.roic.unwrap(), 0.15, epsilon = 1e-12);
    assert_relative_eq!(latest.net_debt.unwrap(), -100.0);

    // No capex tagged: owner earnings equal cash from operations.
    assert_relative_eq!(latest.owner_earnings.unwrap(), 180.0);
    // No share count: per-share owner earnings unknown, not zero.
    assert!(latest.owner_earnings_per_share.is_none());
    assert!(latest.interest_coverage.is_none());

    assert_relative_eq!(series.growth_assumption().unwrap(), 0.12, epsilon = 1e-9);
    assert_relative_eq!(latest_eps(&statements).unwrap(), 1.12f64.powi(10), epsilon = 1e-9);
}

#[test]
fn test_recompute_is_identical() {
    let statements =
        StatementNormalizer::default().normalize_feed(&FactExtractor::default(), &feed());
    let calculator = MetricsCalculator::default();
    let first = serde_json::to_string(&calculator.compute(&statements)).unwrap();
    let second = serde_json::to_string(&calculator.compute(&statements)).unwrap();
    assert_eq!(first, second);
}
