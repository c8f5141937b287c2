//! Integration tests for extraction and normalization of company facts

use hobart_data::{
    AliasTable, FactExtractor, FieldName, NormalizerConfig, StatementNormalizer,
    edgar::FactFeed,
};

const FACTS: &str = r#"{
    "cik": 1234567,
    "entityName": "Widget Holdings Inc.",
    "facts": {
        "dei": {
            "EntityCommonStockSharesOutstanding": {"units": {"shares": [
                {"end": "2024-01-31", "val": 1000000, "fy": 2023, "fp": "FY", "form": "10-K"}
            ]}}
        },
        "us-gaap": {
            "RevenueFromContractWithCustomerExcludingAssessedTax": {"units": {"USD": [
                {"start": "2021-01-01", "end": "2021-12-31", "val": 900, "accn": "0001-22-000001", "fy": 2021, "fp": "FY", "form": "10-K", "filed": "2022-02-20"},
                {"start": "2021-01-01", "end": "2021-12-31", "val": 900, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"},
                {"start": "2022-01-01", "end": "2022-12-31", "val": 1000, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"},
                {"start": "2022-10-01", "end": "2022-12-31", "val": 280, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"},
                {"start": "2023-01-01", "end": "2023-03-31", "val": 260, "accn": "0001-23-000010", "fy": 2023, "fp": "Q1", "form": "10-Q", "filed": "2023-05-01"}
            ]}},
            "SalesRevenueNet": {"units": {"USD": [
                {"start": "2020-01-01", "end": "2020-12-31", "val": 800, "accn": "0001-21-000001", "fy": 2020, "fp": "FY", "form": "10-K", "filed": "2021-02-20"},
                {"start": "2022-01-01", "end": "2022-12-31", "val": 999, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"}
            ]}},
            "OperatingIncomeLoss": {"units": {"USD": [
                {"start": "2022-01-01", "end": "2022-12-31", "val": 200, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"},
                {"start": "2022-01-01", "end": "2022-12-31", "val": 210, "accn": "0001-23-000002", "fy": 2022, "fp": "FY", "form": "10-K/A", "filed": "2023-06-01"}
            ]}},
            "EarningsPerShareDiluted": {"units": {"USD/shares": [
                {"start": "2022-01-01", "end": "2022-12-31", "val": 1.5, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"}
            ]}},
            "CashAndCashEquivalentsAtCarryingValue": {"units": {"USD": [
                {"end": "2021-12-31", "val": 40, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"},
                {"end": "2022-12-31", "val": 50, "accn": "0001-23-000001", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-20"}
            ]}},
            "PaymentsToAcquirePropertyPlantAndEquipment": {"units": {"USD": [
                {"start": "2021-01-01", "end": "2021-12-31", "val": 30, "accn": "0001-22-000002", "fy": 2021, "fp": "FY", "form": "10-K/A", "filed": "2022-05-01"}
            ]}}
        }
    }
}"#;

fn normalize() -> hobart_data::StatementSet {
    let feed = FactFeed::parse_json(FACTS).unwrap();
    StatementNormalizer::default().normalize_feed(&FactExtractor::default(), &feed)
}

#[test]
fn test_years_discovered_from_annual_forms() {
    let set = normalize();
    assert_eq!(set.cik.as_deref(), Some("0001234567"));
    assert_eq!(set.entity_name.as_deref(), Some("Widget Holdings Inc."));
    // 2023 only has a 10-Q and a dei tag outside the alias table.
    assert_eq!(set.fiscal_years(), vec![2020, 2021, 2022]);
}

#[test]
fn test_field_selection() {
    let set = normalize();

    // Preferred alias over the older tag, current period over the quarter slice.
    assert_eq!(set.value(2022, FieldName::Revenue), Some(1000.0));
    // Only the lower-priority tag reported 2020.
    assert_eq!(set.value(2020, FieldName::Revenue), Some(800.0));
    // The 10-K value stands; the amendment only fills gaps.
    assert_eq!(set.value(2022, FieldName::Ebit), Some(200.0));
    // Current balance over the prior-year comparative.
    assert_eq!(set.value(2022, FieldName::Cash), Some(50.0));
    assert_eq!(set.value(2022, FieldName::EpsDiluted), Some(1.5));
    // Capex exists only in an amendment.
    assert_eq!(set.value(2021, FieldName::Capex), Some(30.0));
}

#[test]
fn test_missing_fields_are_null() {
    let set = normalize();
    let income = &set.income[&2021];
    assert_eq!(income.revenue, Some(900.0));
    assert_eq!(income.net_income, None);
    assert!(!set.balance_sheet.contains_key(&2020));
}

#[test]
fn test_renormalization_is_byte_identical() {
    let first = serde_json::to_string(&normalize()).unwrap();
    let second = serde_json::to_string(&normalize()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_alias_table_is_swappable() {
    let feed = FactFeed::parse_json(FACTS).unwrap();
    let table = AliasTable::empty().with_aliases(FieldName::Revenue, &["SalesRevenueNet"]);
    let set = StatementNormalizer::new(NormalizerConfig::default())
        .normalize_feed(&FactExtractor::new(table), &feed);

    assert_eq!(set.value(2022, FieldName::Revenue), Some(999.0));
    assert_eq!(set.value(2022, FieldName::Ebit), None);
    assert_eq!(set.fiscal_years(), vec![2020, 2022]);
}
