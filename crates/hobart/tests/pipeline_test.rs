//! End-to-end runs over an EDGAR-shaped feed, through the store and back.

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use hobart::data::edgar::FactFeed;
use hobart::valuation::GrowthSource;
use hobart::{MarketContext, Pipeline, PipelineConfig, SqliteStore};
use serde_json::{Value, json};
use std::collections::BTreeMap;

type Tags = BTreeMap<&'static str, (&'static str, Vec<Value>)>;

fn add(tags: &mut Tags, tag: &'static str, unit: &'static str, fact: Value) {
    tags.entry(tag).or_insert_with(|| (unit, Vec::new())).1.push(fact);
}

/// An annual fact for calendar year `period` from the 10-K for fiscal year `fy`.
fn annual(period: i32, fy: i32, form: &str, val: f64) -> Value {
    json!({
        "start": format!("{period}-01-01"),
        "end": format!("{period}-12-31"),
        "val": val,
        "accn": format!("0000000099-{}-000001", fy + 1),
        "fy": fy,
        "fp": "FY",
        "form": form,
        "filed": format!("{}-02-15", fy + 1),
    })
}

fn instant(fy: i32, val: f64) -> Value {
    json!({
        "end": format!("{fy}-12-31"),
        "val": val,
        "accn": format!("0000000099-{}-000001", fy + 1),
        "fy": fy,
        "fp": "FY",
        "form": "10-K",
        "filed": format!("{}-02-15", fy + 1),
    })
}

fn growth(year: i32) -> f64 {
    1.1f64.powi(year - 2015)
}

fn feed() -> FactFeed {
    let mut tags = Tags::new();
    for fy in 2015..=2023 {
        let g = growth(fy);
        add(&mut tags, "Revenues", "USD", annual(fy, fy, "10-K", 1000.0 * g));
        if fy > 2015 {
            // Prior-year comparative carried in the same filing
            let prior = 1000.0 * growth(fy - 1);
            add(&mut tags, "Revenues", "USD", annual(fy - 1, fy, "10-K", prior));
        }
        add(&mut tags, "CostOfRevenue", "USD", annual(fy, fy, "10-K", 550.0 * g));
        add(&mut tags, "OperatingIncomeLoss", "USD", annual(fy, fy, "10-K", 250.0 * g));
        add(&mut tags, "IncomeTaxExpenseBenefit", "USD", annual(fy, fy, "10-K", 50.0 * g));
        add(&mut tags, "InterestExpense", "USD", annual(fy, fy, "10-K", 10.0));
        add(&mut tags, "NetIncomeLoss", "USD", annual(fy, fy, "10-K", 180.0 * g));
        add(&mut tags, "EarningsPerShareDiluted", "USD/shares", annual(fy, fy, "10-K", 1.8 * g));
        add(
            &mut tags,
            "WeightedAverageNumberOfDilutedSharesOutstanding",
            "shares",
            annual(fy, fy, "10-K", 100.0),
        );
        add(&mut tags, "CashAndCashEquivalentsAtCarryingValue", "USD", instant(fy, 100.0));
        add(&mut tags, "LongTermDebtNoncurrent", "USD", instant(fy, 200.0));
        add(&mut tags, "StockholdersEquity", "USD", instant(fy, 900.0 * g));
        add(
            &mut tags,
            "NetCashProvidedByUsedInOperatingActivities",
            "USD",
            annual(fy, fy, "10-K", 260.0 * g),
        );
        add(
            &mut tags,
            "PaymentsToAcquirePropertyPlantAndEquipment",
            "USD",
            annual(fy, fy, "10-K", 60.0 * g),
        );
    }

    // Interim revenue never becomes an annual value
    add(
        &mut tags,
        "Revenues",
        "USD",
        json!({
            "start": "2023-01-01", "end": "2023-03-31", "val": 300.0,
            "accn": "0000000099-23-000002", "fy": 2023, "fp": "Q1",
            "form": "10-Q", "filed": "2023-05-01",
        }),
    );
    // Dividends only ever reported in an amendment
    add(&mut tags, "PaymentsOfDividends", "USD", annual(2021, 2021, "10-K/A", 40.0));

    let us_gaap: serde_json::Map<String, Value> = tags
        .into_iter()
        .map(|(tag, (unit, facts))| (tag.to_string(), json!({ "units": { unit: facts } })))
        .collect();
    let document = json!({
        "cik": 99,
        "entityName": "Harbour Tools Inc.",
        "facts": { "us-gaap": us_gaap },
    });
    FactFeed::parse_json(&document.to_string()).unwrap()
}

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
}

#[test]
fn test_statements_from_feed() {
    let statements = Pipeline::default().normalize(&feed());

    assert_eq!(statements.cik.as_deref(), Some("0000000099"));
    assert_eq!(statements.fiscal_years(), (2015..=2023).collect::<Vec<_>>());
    assert_relative_eq!(
        statements.income[&2023].revenue.unwrap(),
        1000.0 * growth(2023),
        max_relative = 1e-12
    );
    assert_relative_eq!(statements.cash_flow[&2021].dividends.unwrap(), 40.0);
    assert!(statements.cash_flow[&2022].dividends.is_none());
}

#[test]
fn test_full_run() {
    let output = Pipeline::default().run(&feed(), MarketContext::with_price(40.0), as_of());
    let latest = output.metrics.latest().unwrap();

    assert_eq!(latest.fiscal_year, 2023);
    assert_relative_eq!(latest.rev_cagr_5y.unwrap(), 0.10, epsilon = 1e-9);
    assert!(latest.rev_cagr_10y.is_none());
    assert_relative_eq!(latest.gross_margin.unwrap(), 0.45, epsilon = 1e-9);
    assert_relative_eq!(latest.cash_tax_rate.unwrap(), 0.2, epsilon = 1e-9);
    assert!(latest.roic.unwrap() > 0.15);

    assert_eq!(output.scenario.inputs.growth_source, GrowthSource::Historical);
    assert_relative_eq!(output.scenario.inputs.growth, 0.10, epsilon = 1e-9);
    assert!(output.scenario.outputs.sticker_price.is_some());

    let quality = &output.quality;
    assert_eq!(quality.moat.roic_persistence, Some(5));
    assert!(quality.combined.unwrap() > 0.5);
    assert!(quality.recommended_safety_margin <= 0.40);
}

#[test]
fn test_store_roundtrip_reproduces_metrics() {
    let path = std::env::temp_dir().join(format!("hobart_pipeline_{}.db", std::process::id()));
    let pipeline = Pipeline::default();
    let output = pipeline.run(&feed(), MarketContext::default(), as_of());

    {
        let store = SqliteStore::new(&path).unwrap();
        store.save_output(Some("hbr"), &output).unwrap();
        store.save_output(Some("hbr"), &output).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let cik = store.resolve_cik("HBR").unwrap();
    let statements = store.load_statements(&cik).unwrap();
    let stored_metrics = store.load_metrics(&cik).unwrap();

    assert_eq!(statements, output.statements);
    assert_eq!(stored_metrics.years, output.metrics.years);
    assert_eq!(pipeline.metrics(&statements), output.metrics);
    assert_eq!(store.latest_scenarios(&cik, 10).unwrap().len(), 2);
    assert_eq!(store.latest_quality_score(&cik).unwrap().unwrap(), output.quality);

    drop(store);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_strict_normalizer_ignores_amendments() {
    let config = PipelineConfig::from_json(r#"{"normalizer": {"allow_fallback": false}}"#).unwrap();
    let statements = Pipeline::new(config).normalize(&feed());
    assert!(statements.cash_flow[&2021].dividends.is_none());
}
