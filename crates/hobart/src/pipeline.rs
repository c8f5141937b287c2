//! The ingestion pipeline.
//!
//! One company at a time: extract facts from the feed, normalize them into
//! statements, derive metrics, then value and score from the metrics. Every
//! stage is a pure function of its inputs and the configuration, so a rerun
//! on the same feed reproduces the same output.

use crate::config::PipelineConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use hobart_data::edgar::{EdgarClient, FactFeed};
use hobart_data::{FactExtractor, StatementNormalizer, StatementSet};
use hobart_metrics::{MetricsCalculator, MetricsSeries};
use hobart_output::{CompanyReport, ReportBuilder, ReportError};
use hobart_quality::{QualityScore, QualityScorer};
use hobart_valuation::{ValuationCalculator, ValuationInputs, ValuationParams, ValuationScenario};
use serde::{Deserialize, Serialize};

/// Market context a valuation is run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Current share price, the payback basis when present
    pub price: Option<f64>,
    /// Historical average PE, lowers the terminal PE cap when present
    pub historical_pe: Option<f64>,
}

impl MarketContext {
    /// Context with a current price.
    pub const fn with_price(price: f64) -> Self {
        Self {
            price: Some(price),
            historical_pe: None,
        }
    }
}

/// Everything one pipeline run produces for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Canonical statements
    pub statements: StatementSet,
    /// Yearly metrics
    pub metrics: MetricsSeries,
    /// Valuation scenario
    pub scenario: ValuationScenario,
    /// Quality score
    pub quality: QualityScore,
}

impl PipelineOutput {
    /// CIK of the company, if the feed carried one.
    pub fn cik(&self) -> Option<&str> {
        self.statements.cik.as_deref()
    }

    /// Bundle the output into a report.
    pub fn report(&self, ticker: Option<&str>) -> std::result::Result<CompanyReport, ReportError> {
        let mut builder = ReportBuilder::new()
            .statements(&self.statements)
            .generated_at(self.scenario.as_of)
            .metrics(self.metrics.clone())
            .scenario(Some(self.scenario.clone()))
            .quality(Some(self.quality.clone()));
        if let Some(ticker) = ticker {
            builder = builder.ticker(ticker);
        }
        builder.build()
    }
}

/// Runs the stages in order with one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    extractor: FactExtractor,
    normalizer: StatementNormalizer,
    metrics: MetricsCalculator,
    quality: QualityScorer,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: FactExtractor::new(config.aliases.clone()),
            normalizer: StatementNormalizer::new(config.normalizer),
            metrics: MetricsCalculator::new(config.metrics),
            quality: QualityScorer::new(config.quality.clone()),
            config,
        }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract and normalize a feed into statements.
    pub fn normalize(&self, feed: &FactFeed) -> StatementSet {
        self.normalizer.normalize_feed(&self.extractor, feed)
    }

    /// Derive metrics from statements.
    pub fn metrics(&self, statements: &StatementSet) -> MetricsSeries {
        self.metrics.compute(statements)
    }

    /// Value a company with the configured parameters.
    pub fn value(
        &self,
        statements: &StatementSet,
        metrics: &MetricsSeries,
        market: MarketContext,
        as_of: DateTime<Utc>,
    ) -> ValuationScenario {
        self.value_with(&self.config.valuation, statements, metrics, market, as_of)
    }

    /// Value a company with explicit parameters.
    pub fn value_with(
        &self,
        params: &ValuationParams,
        statements: &StatementSet,
        metrics: &MetricsSeries,
        market: MarketContext,
        as_of: DateTime<Utc>,
    ) -> ValuationScenario {
        let inputs = ValuationInputs::from_history(statements, metrics)
            .with_price(market.price)
            .with_historical_pe(market.historical_pe);
        ValuationCalculator::new(*params).value(&inputs, as_of)
    }

    /// Score a company's quality.
    pub fn score(
        &self,
        statements: &StatementSet,
        metrics: &MetricsSeries,
        as_of: DateTime<Utc>,
    ) -> QualityScore {
        self.quality.score(statements, metrics, as_of)
    }

    /// Run every stage after normalization.
    pub fn analyze(
        &self,
        statements: StatementSet,
        market: MarketContext,
        as_of: DateTime<Utc>,
    ) -> PipelineOutput {
        let metrics = self.metrics(&statements);
        let scenario = self.value(&statements, &metrics, market, as_of);
        let quality = self.score(&statements, &metrics, as_of);

        tracing::info!(
            cik = statements.cik.as_deref().unwrap_or("-"),
            years = metrics.years.len(),
            sticker = ?scenario.outputs.sticker_price,
            margin = quality.recommended_safety_margin,
            "pipeline complete"
        );

        PipelineOutput {
            statements,
            metrics,
            scenario,
            quality,
        }
    }

    /// Run every stage over a raw feed.
    pub fn run(
        &self,
        feed: &FactFeed,
        market: MarketContext,
        as_of: DateTime<Utc>,
    ) -> PipelineOutput {
        let statements = self.normalize(feed);
        self.analyze(statements, market, as_of)
    }

    /// Fetch a company's feed from EDGAR and run the pipeline over it.
    ///
    /// A failed fetch is the only error; the run itself cannot fail.
    pub async fn ingest(
        &self,
        client: &EdgarClient,
        ticker: &str,
        market: MarketContext,
        as_of: DateTime<Utc>,
    ) -> Result<PipelineOutput> {
        let cik = client.get_company_cik(ticker).await?;
        let feed = client.fetch_company_facts(&cik).await?;

        let mut statements = self.normalize(&feed);
        if statements.cik.is_none() {
            statements.cik = Some(cik);
        }
        Ok(self.analyze(statements, market, as_of))
    }
}
