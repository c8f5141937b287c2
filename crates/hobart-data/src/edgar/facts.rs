//! SEC company-facts documents.
//!
//! The SEC publishes every XBRL fact a company has ever filed at
//! `https://data.sec.gov/api/xbrl/companyfacts/CIK{cik_padded}.json`, nested
//! as taxonomy → tag → unit → observations. [`FactFeed`] keeps that shape,
//! with ordered maps so iteration order never depends on the document.
//!
//! # Example
//!
//! ```no_run
//! use hobart_data::edgar::FactFeed;
//!
//! let json = std::fs::read_to_string("CIK0000320193.json")?;
//! let feed = FactFeed::parse_json(&json)?;
//! if let Some(tag) = feed.tag("us-gaap", "Revenues") {
//!     println!("{} revenue facts", tag.fact_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// A single reported value as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedFact {
    /// End date of the reporting period
    pub period_end: NaiveDate,

    /// Start date of the reporting period (None for instant facts like balance sheet items)
    pub period_start: Option<NaiveDate>,

    /// The numeric value of the fact
    pub value: f64,

    /// Accession number of the filing that reported this fact
    pub accession: Option<String>,

    /// Fiscal year of the filing
    pub fiscal_year: Option<i32>,

    /// Fiscal period (e.g., "FY", "Q1")
    pub fiscal_period: Option<String>,

    /// Form type (e.g., "10-K", "20-F", "10-K/A")
    pub form: Option<String>,

    /// Date the filing was accepted
    pub filed: Option<NaiveDate>,
}

impl ReportedFact {
    /// Returns true if this is an instant fact (point-in-time, like balance sheet items)
    pub const fn is_instant(&self) -> bool {
        self.period_start.is_none()
    }

    /// Returns the duration in days if this is a duration fact
    pub fn duration_days(&self) -> Option<i64> {
        self.period_start
            .map(|start| self.period_end.signed_duration_since(start).num_days())
    }
}

/// All facts reported under one tag, grouped by unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagFacts {
    /// Human-readable label
    pub label: Option<String>,
    /// Unit key (e.g. "USD", "shares") to observations
    pub units: BTreeMap<String, Vec<ReportedFact>>,
}

impl TagFacts {
    /// Number of observations across all units.
    pub fn fact_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }
}

/// A company's full company-facts document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactFeed {
    /// CIK, zero-padded to 10 digits
    pub cik: Option<String>,
    /// Company name
    pub entity_name: Option<String>,
    /// Taxonomy (e.g. "us-gaap") to tag to facts
    pub taxonomies: BTreeMap<String, BTreeMap<String, TagFacts>>,
}

impl FactFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the SEC company-facts JSON format.
    ///
    /// Individual facts with unparseable dates are skipped with a warning;
    /// only a structurally invalid document is an error.
    pub fn parse_json(json: &str) -> Result<Self> {
        let response: CompanyFactsResponse = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse company facts: {}", e)))?;
        Ok(Self::from_response(response))
    }

    /// Parses the SEC company-facts JSON format from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let response: CompanyFactsResponse = serde_json::from_reader(reader)
            .map_err(|e| DataError::Parse(format!("Failed to parse company facts: {}", e)))?;
        Ok(Self::from_response(response))
    }

    fn from_response(response: CompanyFactsResponse) -> Self {
        let mut taxonomies = BTreeMap::new();
        let mut skipped = 0usize;

        for (taxonomy, tags) in response.facts {
            let mut parsed_tags = BTreeMap::new();
            for (tag, concept) in tags {
                let mut units = BTreeMap::new();
                for (unit, values) in concept.units.unwrap_or_default() {
                    let facts: Vec<ReportedFact> = values
                        .into_iter()
                        .filter_map(|v| {
                            let fact = v.into_reported();
                            if fact.is_none() {
                                skipped += 1;
                            }
                            fact
                        })
                        .collect();
                    units.insert(unit, facts);
                }
                parsed_tags.insert(
                    tag,
                    TagFacts {
                        label: concept.label,
                        units,
                    },
                );
            }
            taxonomies.insert(taxonomy, parsed_tags);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped facts with unparseable dates");
        }

        Self {
            cik: response.cik.map(|c| c.padded()),
            entity_name: response.entity_name,
            taxonomies,
        }
    }

    /// Facts for a tag in a taxonomy.
    pub fn tag(&self, taxonomy: &str, tag: &str) -> Option<&TagFacts> {
        self.taxonomies.get(taxonomy)?.get(tag)
    }

    /// Total number of observations in the feed.
    pub fn fact_count(&self) -> usize {
        self.taxonomies
            .values()
            .flat_map(BTreeMap::values)
            .map(TagFacts::fact_count)
            .sum()
    }

    /// All `taxonomy:tag` concepts present in the feed, sorted.
    pub fn concepts(&self) -> Vec<String> {
        self.taxonomies
            .iter()
            .flat_map(|(taxonomy, tags)| tags.keys().map(move |t| format!("{}:{}", taxonomy, t)))
            .collect()
    }
}

// SEC API JSON structure
// Based on: https://www.sec.gov/edgar/sec-api-documentation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyFactsResponse {
    #[serde(default)]
    cik: Option<CikValue>,
    #[serde(default)]
    entity_name: Option<String>,
    #[serde(default)]
    facts: BTreeMap<String, BTreeMap<String, ConceptData>>,
}

/// The SEC returns the CIK as a number; older mirrors return a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CikValue {
    Number(u64),
    Text(String),
}

impl CikValue {
    fn padded(self) -> String {
        match self {
            Self::Number(n) => format!("{:0>10}", n),
            Self::Text(s) => format!("{:0>10}", s.trim()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConceptData {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    units: Option<BTreeMap<String, Vec<FactData>>>,
}

#[derive(Debug, Deserialize)]
struct FactData {
    end: String,
    val: f64,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    accn: Option<String>,
    #[serde(default)]
    fy: Option<i32>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    filed: Option<String>,
}

impl FactData {
    fn into_reported(self) -> Option<ReportedFact> {
        let period_end = parse_date(&self.end)?;
        let period_start = match self.start.as_deref() {
            Some(start) => Some(parse_date(start)?),
            None => None,
        };
        // A bad filed date only loses the tie-break input, not the fact.
        let filed = self.filed.as_deref().and_then(parse_date);

        Some(ReportedFact {
            period_end,
            period_start,
            value: self.val,
            accession: self.accn,
            fiscal_year: self.fy,
            fiscal_period: self.fp,
            form: self.form,
            filed,
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cik": 320193,
        "entityName": "Apple Inc.",
        "facts": {
            "us-gaap": {
                "Revenues": {
                    "label": "Revenues",
                    "description": "Amount of revenue.",
                    "units": {
                        "USD": [
                            {"start": "2022-09-25", "end": "2023-09-30", "val": 383285000000,
                             "accn": "0000320193-23-000106", "fy": 2023, "fp": "FY",
                             "form": "10-K", "filed": "2023-11-03"},
                            {"start": "2023-07-02", "end": "2023-09-30", "val": 89498000000,
                             "accn": "0000320193-23-000106", "fy": 2023, "fp": "FY",
                             "form": "10-K", "filed": "2023-11-03"}
                        ]
                    }
                },
                "Assets": {
                    "label": "Assets",
                    "units": {
                        "USD": [
                            {"end": "2023-09-30", "val": 352583000000, "fy": 2023,
                             "fp": "FY", "form": "10-K", "filed": "2023-11-03"},
                            {"end": "not-a-date", "val": 1.0, "fy": 2023, "form": "10-K"}
                        ]
                    }
                }
            },
            "dei": {
                "EntityCommonStockSharesOutstanding": {
                    "label": "Shares",
                    "units": {"shares": [{"end": "2023-10-20", "val": 15552752000}]}
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_company_facts() {
        let feed = FactFeed::parse_json(SAMPLE).unwrap();
        assert_eq!(feed.cik.as_deref(), Some("0000320193"));
        assert_eq!(feed.entity_name.as_deref(), Some("Apple Inc."));
        assert_eq!(feed.taxonomies.len(), 2);

        let revenues = feed.tag("us-gaap", "Revenues").unwrap();
        assert_eq!(revenues.fact_count(), 2);
        let annual = &revenues.units["USD"][0];
        assert_eq!(annual.fiscal_year, Some(2023));
        assert_eq!(annual.form.as_deref(), Some("10-K"));
        assert_eq!(annual.duration_days(), Some(370));
        assert!(!annual.is_instant());
    }

    #[test]
    fn test_bad_dates_are_skipped() {
        let feed = FactFeed::parse_json(SAMPLE).unwrap();
        let assets = feed.tag("us-gaap", "Assets").unwrap();
        assert_eq!(assets.fact_count(), 1);
        assert!(assets.units["USD"][0].is_instant());
        assert_eq!(feed.fact_count(), 4);
    }

    #[test]
    fn test_concepts_sorted() {
        let feed = FactFeed::parse_json(SAMPLE).unwrap();
        assert_eq!(
            feed.concepts(),
            vec![
                "dei:EntityCommonStockSharesOutstanding".to_string(),
                "us-gaap:Assets".to_string(),
                "us-gaap:Revenues".to_string(),
            ]
        );
    }

    #[test]
    fn test_string_cik() {
        let feed = FactFeed::parse_json(r#"{"cik": "789019", "facts": {}}"#).unwrap();
        assert_eq!(feed.cik.as_deref(), Some("0000789019"));
        assert!(feed.entity_name.is_none());
    }

    #[test]
    fn test_parse_json_invalid() {
        let result = FactFeed::parse_json("invalid json");
        assert!(matches!(result, Err(DataError::Parse(_))));
    }
}
