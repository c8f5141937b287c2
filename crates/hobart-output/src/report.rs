//! Company reports.

use chrono::{DateTime, Utc};
use hobart_data::StatementSet;
use hobart_metrics::{MetricsSeries, MetricsYearly};
use hobart_quality::QualityScore;
use hobart_valuation::ValuationScenario;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required section was not supplied.
    #[error("Report is missing {0}")]
    Incomplete(&'static str),
}

/// Everything known about one company after a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    /// Ticker the report was requested for
    pub ticker: Option<String>,
    /// CIK of the company
    pub cik: Option<String>,
    /// Registrant name
    pub entity_name: Option<String>,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Fiscal years with at least one statement
    pub fiscal_years: Vec<i32>,
    /// Yearly metrics
    pub metrics: MetricsSeries,
    /// Latest valuation scenario
    pub scenario: Option<ValuationScenario>,
    /// Quality score
    pub quality: Option<QualityScore>,
}

impl CompanyReport {
    /// Most recent metrics record.
    pub fn latest_metrics(&self) -> Option<&MetricsYearly> {
        self.metrics.latest()
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to a file.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

impl fmt::Display for CompanyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .entity_name
            .as_deref()
            .or(self.ticker.as_deref())
            .unwrap_or("Unknown company");
        writeln!(f, "{name} (CIK {})", self.cik.as_deref().unwrap_or("n/a"))?;
        match (self.fiscal_years.first(), self.fiscal_years.last()) {
            (Some(first), Some(last)) => writeln!(f, "Fiscal years: {first}-{last}")?,
            _ => writeln!(f, "Fiscal years: none")?,
        }

        if let Some(m) = self.latest_metrics() {
            writeln!(f)?;
            writeln!(f, "Metrics (FY{})", m.fiscal_year)?;
            writeln!(f, "  ROIC                 {:>10}", pct(m.roic))?;
            writeln!(f, "  Revenue CAGR 5y      {:>10}", pct(m.rev_cagr_5y))?;
            writeln!(f, "  Revenue CAGR 10y     {:>10}", pct(m.rev_cagr_10y))?;
            writeln!(f, "  EPS CAGR 5y          {:>10}", pct(m.eps_cagr_5y))?;
            writeln!(f, "  EPS CAGR 10y         {:>10}", pct(m.eps_cagr_10y))?;
            writeln!(f, "  Gross margin         {:>10}", pct(m.gross_margin))?;
            writeln!(f, "  Operating margin     {:>10}", pct(m.operating_margin))?;
            writeln!(f, "  Owner earnings/share {:>10}", num(m.owner_earnings_per_share))?;
            writeln!(f, "  Interest coverage    {:>10}", num(m.interest_coverage))?;
            writeln!(f, "  Debt/equity          {:>10}", num(m.debt_to_equity))?;
        }

        if let Some(s) = &self.scenario {
            writeln!(f)?;
            writeln!(f, "Valuation ({})", s.as_of.format("%Y-%m-%d"))?;
            writeln!(
                f,
                "  Growth               {:>10} ({})",
                pct(Some(s.inputs.growth)),
                s.inputs.growth_source
            )?;
            writeln!(f, "  Terminal PE          {:>10.1}", s.outputs.terminal_pe)?;
            writeln!(f, "  Sticker price        {:>10}", num(s.outputs.sticker_price))?;
            writeln!(f, "  Safety price         {:>10}", num(s.outputs.safety_price))?;
            let payback = s
                .outputs
                .payback_years
                .map_or_else(|| "none".to_string(), |y| format!("{y} years"));
            writeln!(f, "  Payback              {payback:>10}")?;
            writeln!(f, "  Ten cap price        {:>10}", num(s.outputs.ten_cap_price))?;
        }

        if let Some(q) = &self.quality {
            writeln!(f)?;
            writeln!(f, "Quality (policy {})", q.policy_version)?;
            writeln!(f, "  Moat                 {:>10}", num(q.moat.composite))?;
            writeln!(f, "  Management           {:>10}", num(q.management.composite))?;
            let persistence = q
                .moat
                .roic_persistence
                .map_or_else(|| "n/a".to_string(), |p| format!("{p}/5"));
            writeln!(f, "  ROIC persistence     {persistence:>10}")?;
            writeln!(
                f,
                "  Margin of safety     {:>10}",
                pct(Some(q.recommended_safety_margin))
            )?;
        }
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    ticker: Option<String>,
    cik: Option<String>,
    entity_name: Option<String>,
    fiscal_years: Vec<i32>,
    generated_at: Option<DateTime<Utc>>,
    metrics: Option<MetricsSeries>,
    scenario: Option<ValuationScenario>,
    quality: Option<QualityScore>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticker.
    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Take company identity and fiscal years from a statement set.
    pub fn statements(mut self, statements: &StatementSet) -> Self {
        self.cik = statements.cik.clone();
        self.entity_name = statements.entity_name.clone();
        self.fiscal_years = statements.fiscal_years();
        self
    }

    /// Set the generation timestamp. Defaults to now.
    pub const fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Set the metrics.
    pub fn metrics(mut self, metrics: MetricsSeries) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the valuation scenario.
    pub fn scenario(mut self, scenario: Option<ValuationScenario>) -> Self {
        self.scenario = scenario;
        self
    }

    /// Set the quality score.
    pub fn quality(mut self, quality: Option<QualityScore>) -> Self {
        self.quality = quality;
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<CompanyReport, ReportError> {
        let metrics = self.metrics.ok_or(ReportError::Incomplete("metrics"))?;
        Ok(CompanyReport {
            ticker: self.ticker,
            cik: self.cik.or_else(|| metrics.cik.clone()),
            entity_name: self.entity_name,
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            fiscal_years: self.fiscal_years,
            metrics,
            scenario: self.scenario,
            quality: self.quality,
        })
    }
}
