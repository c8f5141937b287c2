//! SQLite store for pipeline results.
//!
//! Statements and metrics are replaced wholesale per company inside one
//! transaction, so a rerun converges on the same rows instead of patching
//! them. Valuation scenarios are appended; quality scores are upserted by
//! `(cik, as_of)`.

use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineOutput;
use chrono::{DateTime, SecondsFormat, Utc};
use hobart_data::{FieldName, StatementKind, StatementSet};
use hobart_metrics::{MetricsSeries, MetricsYearly};
use hobart_quality::QualityScore;
use hobart_valuation::ValuationScenario;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::BTreeMap;
use std::path::Path;

const STATEMENT_KINDS: [StatementKind; 3] = [
    StatementKind::Income,
    StatementKind::BalanceSheet,
    StatementKind::CashFlow,
];

const METRIC_COLUMNS: [&str; 15] = [
    "roic",
    "rev_cagr_5y",
    "rev_cagr_10y",
    "eps_cagr_5y",
    "eps_cagr_10y",
    "owner_earnings",
    "owner_earnings_per_share",
    "interest_coverage",
    "net_debt",
    "debt_to_equity",
    "gross_margin",
    "operating_margin",
    "cash_tax_rate",
    "nopat",
    "invested_capital",
];

const fn statement_table(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Income => "income_statement",
        StatementKind::BalanceSheet => "balance_sheet",
        StatementKind::CashFlow => "cash_flow_statement",
    }
}

fn statement_fields(kind: StatementKind) -> Vec<FieldName> {
    FieldName::ALL
        .into_iter()
        .filter(|f| f.statement() == kind)
        .collect()
}

fn statement_years(statements: &StatementSet, kind: StatementKind) -> Vec<i32> {
    match kind {
        StatementKind::Income => statements.income.keys().copied().collect(),
        StatementKind::BalanceSheet => statements.balance_sheet.keys().copied().collect(),
        StatementKind::CashFlow => statements.cash_flow.keys().copied().collect(),
    }
}

fn column_list(columns: impl IntoIterator<Item = String>) -> String {
    columns.into_iter().collect::<Vec<_>>().join(", ")
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

const fn metric_values(m: &MetricsYearly) -> [Option<f64>; 15] {
    [
        m.roic,
        m.rev_cagr_5y,
        m.rev_cagr_10y,
        m.eps_cagr_5y,
        m.eps_cagr_10y,
        m.owner_earnings,
        m.owner_earnings_per_share,
        m.interest_coverage,
        m.net_debt,
        m.debt_to_equity,
        m.gross_margin,
        m.operating_margin,
        m.cash_tax_rate,
        m.nopat,
        m.invested_capital,
    ]
}

const fn metrics_from_values(fiscal_year: i32, values: [Option<f64>; 15]) -> MetricsYearly {
    let [
        roic,
        rev_cagr_5y,
        rev_cagr_10y,
        eps_cagr_5y,
        eps_cagr_10y,
        owner_earnings,
        owner_earnings_per_share,
        interest_coverage,
        net_debt,
        debt_to_equity,
        gross_margin,
        operating_margin,
        cash_tax_rate,
        nopat,
        invested_capital,
    ] = values;
    MetricsYearly {
        fiscal_year,
        roic,
        rev_cagr_5y,
        rev_cagr_10y,
        eps_cagr_5y,
        eps_cagr_10y,
        owner_earnings,
        owner_earnings_per_share,
        interest_coverage,
        net_debt,
        debt_to_equity,
        gross_margin,
        operating_margin,
        cash_tax_rate,
        nopat,
        invested_capital,
    }
}

/// SQLite store keyed by CIK.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS company (
                cik TEXT PRIMARY KEY,
                ticker TEXT,
                name TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_company_ticker ON company(ticker);

            CREATE TABLE IF NOT EXISTS valuation_scenario (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cik TEXT NOT NULL,
                as_of TEXT NOT NULL,
                sticker_price REAL,
                safety_price REAL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_scenario_cik ON valuation_scenario(cik, as_of);

            CREATE TABLE IF NOT EXISTS quality_score (
                cik TEXT NOT NULL,
                as_of TEXT NOT NULL,
                combined REAL,
                recommended_safety_margin REAL NOT NULL,
                policy_version TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (cik, as_of)
            );

            CREATE TABLE IF NOT EXISTS price_snapshot (
                cik TEXT NOT NULL,
                as_of TEXT NOT NULL,
                price REAL NOT NULL,
                PRIMARY KEY (cik, as_of)
            );",
        )?;

        for kind in STATEMENT_KINDS {
            let columns = column_list(
                statement_fields(kind)
                    .into_iter()
                    .map(|f| format!("{f} REAL")),
            );
            self.conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        cik TEXT NOT NULL,
                        fiscal_year INTEGER NOT NULL,
                        {columns},
                        PRIMARY KEY (cik, fiscal_year)
                    )",
                    statement_table(kind)
                ),
                [],
            )?;
        }

        let metric_columns = column_list(METRIC_COLUMNS.iter().map(|c| format!("{c} REAL")));
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS metrics_yearly (
                    cik TEXT NOT NULL,
                    fiscal_year INTEGER NOT NULL,
                    {metric_columns},
                    PRIMARY KEY (cik, fiscal_year)
                )"
            ),
            [],
        )?;

        Ok(())
    }

    /// Record a company's ticker and name. Absent values keep what is stored.
    pub fn put_company(&self, cik: &str, ticker: Option<&str>, name: Option<&str>) -> Result<()> {
        write_company(&self.conn, cik, ticker, name)
    }

    /// Replace every stored statement of the set's company.
    pub fn replace_statements(&self, statements: &StatementSet) -> Result<()> {
        let cik = statements.cik.as_deref().ok_or(PipelineError::MissingCik)?;
        let tx = self.conn.unchecked_transaction()?;
        write_statements(&tx, cik, statements)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace every stored metrics record of a company.
    pub fn replace_metrics(&self, cik: &str, metrics: &MetricsSeries) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_metrics(&tx, cik, metrics)?;
        tx.commit()?;
        Ok(())
    }

    /// Append a valuation scenario. Returns its row id.
    pub fn insert_scenario(&self, scenario: &ValuationScenario) -> Result<i64> {
        let cik = scenario.cik.as_deref().ok_or(PipelineError::MissingCik)?;
        write_scenario(&self.conn, cik, scenario)
    }

    /// Insert or replace a quality score keyed by `(cik, as_of)`.
    pub fn put_quality_score(&self, score: &QualityScore) -> Result<()> {
        let cik = score.cik.as_deref().ok_or(PipelineError::MissingCik)?;
        write_quality(&self.conn, cik, score)
    }

    /// Persist a whole pipeline run in one transaction. Returns the CIK.
    pub fn save_output(&self, ticker: Option<&str>, output: &PipelineOutput) -> Result<String> {
        let cik = output
            .cik()
            .ok_or(PipelineError::MissingCik)?
            .to_string();

        let tx = self.conn.unchecked_transaction()?;
        write_company(&tx, &cik, ticker, output.statements.entity_name.as_deref())?;
        write_statements(&tx, &cik, &output.statements)?;
        write_metrics(&tx, &cik, &output.metrics)?;
        write_scenario(&tx, &cik, &output.scenario)?;
        write_quality(&tx, &cik, &output.quality)?;
        tx.commit()?;

        tracing::info!(
            cik = %cik,
            statements = output.statements.statement_count(),
            metrics = output.metrics.years.len(),
            "saved pipeline output"
        );
        Ok(cik)
    }

    /// Load a company's statements.
    ///
    /// Returns `PipelineError::UnknownCompany` if nothing is stored.
    pub fn load_statements(&self, cik: &str) -> Result<StatementSet> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM company WHERE cik = ?1",
                params![cik],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let mut by_year: BTreeMap<i32, BTreeMap<FieldName, f64>> = BTreeMap::new();
        for kind in STATEMENT_KINDS {
            let fields = statement_fields(kind);
            let columns = column_list(fields.iter().map(ToString::to_string));
            let mut stmt = self.conn.prepare(&format!(
                "SELECT fiscal_year, {columns} FROM {} WHERE cik = ?1 ORDER BY fiscal_year",
                statement_table(kind)
            ))?;
            let rows = stmt.query_map(params![cik], |row| {
                let year: i32 = row.get(0)?;
                let mut values = Vec::with_capacity(fields.len());
                for (i, field) in fields.iter().enumerate() {
                    if let Some(value) = row.get::<_, Option<f64>>(i + 1)? {
                        values.push((*field, value));
                    }
                }
                Ok((year, values))
            })?;
            for row in rows {
                let (year, values) = row?;
                by_year.entry(year).or_default().extend(values);
            }
        }

        let mut statements = StatementSet::new(Some(cik.to_string()), name);
        for (year, values) in &by_year {
            statements.insert_year(*year, values);
        }
        if statements.is_empty() {
            return Err(PipelineError::UnknownCompany(cik.to_string()));
        }
        Ok(statements)
    }

    /// Load a company's metrics. Empty if none are stored.
    pub fn load_metrics(&self, cik: &str) -> Result<MetricsSeries> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT fiscal_year, {} FROM metrics_yearly WHERE cik = ?1 ORDER BY fiscal_year",
            METRIC_COLUMNS.join(", ")
        ))?;
        let rows = stmt.query_map(params![cik], |row| {
            let year: i32 = row.get(0)?;
            let mut values = [None; 15];
            for (i, value) in values.iter_mut().enumerate() {
                *value = row.get(i + 1)?;
            }
            Ok(metrics_from_values(year, values))
        })?;

        let mut series = MetricsSeries {
            cik: Some(cik.to_string()),
            ..Default::default()
        };
        for row in rows {
            let record = row?;
            series.years.insert(record.fiscal_year, record);
        }
        Ok(series)
    }

    /// Most recent scenarios first, at most `limit` of them.
    pub fn latest_scenarios(&self, cik: &str, limit: usize) -> Result<Vec<ValuationScenario>> {
        let mut stmt = self.conn.prepare(
            "SELECT data FROM valuation_scenario
             WHERE cik = ?1
             ORDER BY as_of DESC, id DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![cik, limit], |row| row.get::<_, String>(0))?;

        let mut scenarios = Vec::new();
        for row in rows {
            scenarios.push(serde_json::from_str(&row?)?);
        }
        Ok(scenarios)
    }

    /// Most recent quality score.
    pub fn latest_quality_score(&self, cik: &str) -> Result<Option<QualityScore>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM quality_score WHERE cik = ?1 ORDER BY as_of DESC LIMIT 1",
                params![cik],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    /// Record a share price observed at `as_of`.
    pub fn record_price(&self, cik: &str, price: f64, as_of: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO price_snapshot (cik, as_of, price) VALUES (?1, ?2, ?3)",
            params![cik, timestamp(as_of), price],
        )?;
        Ok(())
    }

    /// Most recently recorded share price.
    pub fn latest_price(&self, cik: &str) -> Result<Option<f64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT price FROM price_snapshot WHERE cik = ?1 ORDER BY as_of DESC LIMIT 1",
                params![cik],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Resolve a ticker or CIK to a stored CIK.
    ///
    /// All-digit input is treated as a CIK and zero-padded; anything else is
    /// looked up as a ticker, case-insensitively.
    pub fn resolve_cik(&self, ticker_or_cik: &str) -> Result<String> {
        let key = ticker_or_cik.trim();
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
            return Ok(format!("{key:0>10}"));
        }
        self.conn
            .query_row(
                "SELECT cik FROM company WHERE ticker = ?1",
                params![key.to_ascii_uppercase()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| PipelineError::UnknownCompany(key.to_string()))
    }
}

fn write_company(
    conn: &Connection,
    cik: &str,
    ticker: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO company (cik, ticker, name, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(cik) DO UPDATE SET
            ticker = COALESCE(excluded.ticker, company.ticker),
            name = COALESCE(excluded.name, company.name),
            updated_at = excluded.updated_at",
        params![
            cik,
            ticker.map(str::to_ascii_uppercase),
            name,
            timestamp(Utc::now())
        ],
    )?;
    Ok(())
}

fn write_statements(conn: &Connection, cik: &str, statements: &StatementSet) -> Result<()> {
    write_company(conn, cik, None, statements.entity_name.as_deref())?;

    for kind in STATEMENT_KINDS {
        let table = statement_table(kind);
        let fields = statement_fields(kind);
        conn.execute(&format!("DELETE FROM {table} WHERE cik = ?1"), params![cik])?;

        let sql = format!(
            "INSERT INTO {table} (cik, fiscal_year, {}) VALUES ({})",
            column_list(fields.iter().map(ToString::to_string)),
            placeholders(fields.len() + 2)
        );
        let mut stmt = conn.prepare(&sql)?;
        for year in statement_years(statements, kind) {
            let values = [Value::Text(cik.to_string()), Value::Integer(i64::from(year))]
                .into_iter()
                .chain(fields.iter().map(|f| real(statements.value(year, *f))));
            stmt.execute(params_from_iter(values))?;
        }
    }

    tracing::debug!(cik, statements = statements.statement_count(), "replaced statements");
    Ok(())
}

fn write_metrics(conn: &Connection, cik: &str, metrics: &MetricsSeries) -> Result<()> {
    conn.execute("DELETE FROM metrics_yearly WHERE cik = ?1", params![cik])?;

    let sql = format!(
        "INSERT INTO metrics_yearly (cik, fiscal_year, {}) VALUES ({})",
        METRIC_COLUMNS.join(", "),
        placeholders(METRIC_COLUMNS.len() + 2)
    );
    let mut stmt = conn.prepare(&sql)?;
    for record in metrics.records() {
        let values = [
            Value::Text(cik.to_string()),
            Value::Integer(i64::from(record.fiscal_year)),
        ]
        .into_iter()
        .chain(metric_values(record).into_iter().map(real));
        stmt.execute(params_from_iter(values))?;
    }

    tracing::debug!(cik, years = metrics.years.len(), "replaced metrics");
    Ok(())
}

fn write_scenario(conn: &Connection, cik: &str, scenario: &ValuationScenario) -> Result<i64> {
    conn.execute(
        "INSERT INTO valuation_scenario (cik, as_of, sticker_price, safety_price, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            cik,
            timestamp(scenario.as_of),
            scenario.outputs.sticker_price,
            scenario.outputs.safety_price,
            serde_json::to_string(scenario)?
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn write_quality(conn: &Connection, cik: &str, score: &QualityScore) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO quality_score
         (cik, as_of, combined, recommended_safety_margin, policy_version, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            cik,
            timestamp(score.as_of),
            score.combined,
            score.recommended_safety_margin,
            score.policy_version,
            serde_json::to_string(score)?
        ],
    )?;
    Ok(())
}
