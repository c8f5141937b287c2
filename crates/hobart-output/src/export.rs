//! CSV and JSON export of pipeline results.
//!
//! Metrics export one row per fiscal year. Statements export in long form,
//! one row per `(fiscal_year, statement, field)` of every statement that
//! exists, so unreported fields appear as empty cells rather than zeros.
//! Scenarios flatten their resolved inputs and outputs into one row each.

use chrono::{DateTime, Utc};
use hobart_data::{FieldName, StatementKind, StatementSet};
use hobart_metrics::MetricsSeries;
use hobart_valuation::{GrowthSource, PaybackBasis, ValuationScenario};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty" | "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One statement field of one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// CIK of the company
    pub cik: Option<String>,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Statement the field belongs to
    pub statement: StatementKind,
    /// Field name
    pub field: FieldName,
    /// Reported value, empty when not reported
    pub value: Option<f64>,
}

/// Flatten a statement set into long-form rows.
pub fn statement_rows(statements: &StatementSet) -> Vec<StatementRow> {
    let mut rows = Vec::new();
    for year in statements.fiscal_years() {
        for field in FieldName::ALL {
            let exists = match field.statement() {
                StatementKind::Income => statements.income.contains_key(&year),
                StatementKind::BalanceSheet => statements.balance_sheet.contains_key(&year),
                StatementKind::CashFlow => statements.cash_flow.contains_key(&year),
            };
            if exists {
                rows.push(StatementRow {
                    cik: statements.cik.clone(),
                    fiscal_year: year,
                    statement: field.statement(),
                    field,
                    value: statements.value(year, field),
                });
            }
        }
    }
    rows
}

/// A valuation scenario flattened for CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    /// CIK of the company
    pub cik: Option<String>,
    /// When the scenario was computed
    pub as_of: DateTime<Utc>,
    /// Growth after clamping
    pub growth: f64,
    /// Where the growth came from
    pub growth_source: GrowthSource,
    /// PE cap
    pub pe_cap: f64,
    /// Discount rate
    pub discount_rate: f64,
    /// Margin of safety
    pub safety_margin_pct: f64,
    /// Owner earnings per share used for payback and ten cap
    pub owner_earnings_per_share: Option<f64>,
    /// Amount payback was measured against
    pub payback_basis: Option<f64>,
    /// What the payback basis was
    pub payback_basis_source: Option<PaybackBasis>,
    /// Projected EPS
    pub future_eps: Option<f64>,
    /// Terminal PE
    pub terminal_pe: f64,
    /// Projected price
    pub future_price: Option<f64>,
    /// Sticker price
    pub sticker_price: Option<f64>,
    /// Safety price
    pub safety_price: Option<f64>,
    /// Payback time in years
    pub payback_years: Option<u32>,
    /// Ten cap price
    pub ten_cap_price: Option<f64>,
}

impl From<&ValuationScenario> for ScenarioRow {
    fn from(scenario: &ValuationScenario) -> Self {
        let (inputs, outputs) = (&scenario.inputs, &scenario.outputs);
        Self {
            cik: scenario.cik.clone(),
            as_of: scenario.as_of,
            growth: inputs.growth,
            growth_source: inputs.growth_source,
            pe_cap: inputs.pe_cap,
            discount_rate: inputs.discount_rate,
            safety_margin_pct: inputs.safety_margin_pct,
            owner_earnings_per_share: inputs.owner_earnings_per_share,
            payback_basis: inputs.payback_basis,
            payback_basis_source: inputs.payback_basis_source,
            future_eps: outputs.future_eps,
            terminal_pe: outputs.terminal_pe,
            future_price: outputs.future_price,
            sticker_price: outputs.sticker_price,
            safety_price: outputs.safety_price,
            payback_years: outputs.payback_years,
            ten_cap_price: outputs.ten_cap_price,
        }
    }
}

/// Serialize rows to a CSV string with a header.
fn write_csv<S: Serialize>(rows: impl IntoIterator<Item = S>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn write_json<T: Serialize + ?Sized>(
    value: &T,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for MetricsSeries {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(self.records()),
            _ => write_json(self, format),
        }
    }
}

impl Exporter for StatementSet {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(statement_rows(self)),
            _ => write_json(self, format),
        }
    }
}

impl Exporter for ValuationScenario {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv([ScenarioRow::from(self)]),
            _ => write_json(self, format),
        }
    }
}

impl Exporter for Vec<ValuationScenario> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(self.iter().map(ScenarioRow::from)),
            _ => write_json(self, format),
        }
    }
}
