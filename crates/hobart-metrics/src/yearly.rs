//! Yearly metrics for a company's statement series.

use crate::cash::{owner_earnings, owner_earnings_per_share};
use crate::growth::windowed_cagr;
use crate::leverage::{debt_to_equity, gross_margin, interest_coverage, net_debt, operating_margin};
use crate::returns::{cash_tax_rate, invested_capital, nopat, roic};
use hobart_data::{FieldName, StatementSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the metrics calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Upper bound of the cash tax rate (default: 0.35)
    pub tax_rate_cap: f64,
    /// Short growth window in years (default: 5)
    pub short_window: u32,
    /// Long growth window in years (default: 10)
    pub long_window: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            tax_rate_cap: 0.35,
            short_window: 5,
            long_window: 10,
        }
    }
}

/// Derived metrics for one fiscal year.
///
/// Each field is computed independently; a missing input nulls only the
/// metrics that depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsYearly {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Return on invested capital
    pub roic: Option<f64>,
    /// Revenue CAGR over the short window
    pub rev_cagr_5y: Option<f64>,
    /// Revenue CAGR over the long window
    pub rev_cagr_10y: Option<f64>,
    /// Diluted EPS CAGR over the short window
    pub eps_cagr_5y: Option<f64>,
    /// Diluted EPS CAGR over the long window
    pub eps_cagr_10y: Option<f64>,
    /// Cash from operations less capex
    pub owner_earnings: Option<f64>,
    /// Owner earnings per diluted share
    pub owner_earnings_per_share: Option<f64>,
    /// EBIT over interest expense
    pub interest_coverage: Option<f64>,
    /// Debt less cash
    pub net_debt: Option<f64>,
    /// Debt over equity
    pub debt_to_equity: Option<f64>,
    /// Gross profit over revenue
    pub gross_margin: Option<f64>,
    /// EBIT over revenue
    pub operating_margin: Option<f64>,
    /// Clamped cash tax rate used for NOPAT
    pub cash_tax_rate: Option<f64>,
    /// Net operating profit after tax
    pub nopat: Option<f64>,
    /// Debt plus equity less cash
    pub invested_capital: Option<f64>,
}

/// Metrics for every year of a company, keyed by fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSeries {
    /// CIK of the company
    pub cik: Option<String>,
    /// Yearly records
    pub years: BTreeMap<i32, MetricsYearly>,
}

impl MetricsSeries {
    /// Records in ascending year order.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &MetricsYearly> {
        self.years.values()
    }

    /// Most recent year's record.
    pub fn latest(&self) -> Option<&MetricsYearly> {
        self.years.values().next_back()
    }

    /// Most recent non-null owner earnings per share.
    pub fn latest_owner_earnings_per_share(&self) -> Option<f64> {
        self.records().rev().find_map(|m| m.owner_earnings_per_share)
    }

    /// Historical growth to project with.
    ///
    /// From the latest record: the first present of 5-year EPS CAGR, 5-year
    /// revenue CAGR, 10-year EPS CAGR, 10-year revenue CAGR.
    pub fn growth_assumption(&self) -> Option<f64> {
        let latest = self.latest()?;
        latest
            .eps_cagr_5y
            .or(latest.rev_cagr_5y)
            .or(latest.eps_cagr_10y)
            .or(latest.rev_cagr_10y)
    }

    /// ROIC values in ascending year order, skipping nulls.
    pub fn roic_values(&self) -> Vec<f64> {
        self.records().filter_map(|m| m.roic).collect()
    }
}

/// Most recent non-null diluted EPS.
pub fn latest_eps(statements: &StatementSet) -> Option<f64> {
    statements
        .income
        .values()
        .rev()
        .find_map(|income| income.eps_diluted)
}

/// Computes [`MetricsYearly`] for every year with an income statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    /// Create a calculator.
    pub const fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute the full series. Recomputes every year from scratch.
    pub fn compute(&self, statements: &StatementSet) -> MetricsSeries {
        let revenue = field_series(statements, FieldName::Revenue);
        let eps = field_series(statements, FieldName::EpsDiluted);
        let short = self.config.short_window;
        let long = self.config.long_window;

        let mut years = BTreeMap::new();
        for (&year, income) in &statements.income {
            let balance = statements.balance_sheet.get(&year);
            let cash_flow = statements.cash_flow.get(&year);

            let cash = balance.and_then(|b| b.cash);
            let total_debt = balance.and_then(|b| b.total_debt);
            let equity = balance.and_then(|b| b.shareholder_equity);

            let tax_rate = cash_tax_rate(income.taxes, income.ebit, self.config.tax_rate_cap);
            let nopat = nopat(income.ebit, tax_rate);
            let invested = invested_capital(total_debt, equity, cash);
            let oe = owner_earnings(cash_flow.and_then(|c| c.cfo), cash_flow.and_then(|c| c.capex));

            years.insert(
                year,
                MetricsYearly {
                    fiscal_year: year,
                    roic: roic(nopat, invested),
                    rev_cagr_5y: windowed_cagr(&revenue, year, short),
                    rev_cagr_10y: windowed_cagr(&revenue, year, long),
                    eps_cagr_5y: windowed_cagr(&eps, year, short),
                    eps_cagr_10y: windowed_cagr(&eps, year, long),
                    owner_earnings: oe,
                    owner_earnings_per_share: owner_earnings_per_share(oe, income.shares_diluted),
                    interest_coverage: interest_coverage(income.ebit, income.interest_expense),
                    net_debt: net_debt(total_debt, cash),
                    debt_to_equity: debt_to_equity(total_debt, equity),
                    gross_margin: gross_margin(income.revenue, income.gross_profit, income.cogs),
                    operating_margin: operating_margin(income.ebit, income.revenue),
                    cash_tax_rate: income.ebit.map(|_| tax_rate),
                    nopat,
                    invested_capital: invested,
                },
            );
        }

        tracing::info!(
            cik = statements.cik.as_deref().unwrap_or("-"),
            years = years.len(),
            "computed yearly metrics"
        );

        MetricsSeries {
            cik: statements.cik.clone(),
            years,
        }
    }
}

fn field_series(statements: &StatementSet, field: FieldName) -> BTreeMap<i32, f64> {
    statements
        .fiscal_years()
        .into_iter()
        .filter_map(|year| Some((year, statements.value(year, field)?)))
        .collect()
}
