//! Hobart CLI binary.
//!
//! Fetches SEC company facts, runs the fundamentals pipeline and keeps the
//! results in a local SQLite store.

mod store_manager;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use hobart::{MarketContext, Pipeline, PipelineConfig, PipelineOutput, SqliteStore};
use hobart_data::edgar::{EdgarClient, FactFeed};
use hobart_output::{ExportFormat, Exporter, ReportBuilder};
use hobart_valuation::ValuationParams;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Concurrent EDGAR fetches during ingest
const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: fundamentals, valuation and quality from SEC filings", long_about = None)]
#[command(version)]
struct Cli {
    /// Store database path
    #[arg(long, global = true, env = "HOBART_DB")]
    db: Option<PathBuf>,

    /// Pipeline configuration file (JSON)
    #[arg(long, global = true, env = "HOBART_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, analyze and store one or more companies
    Ingest {
        /// Ticker symbols
        #[arg(required = true)]
        tickers: Vec<String>,

        /// User-Agent sent to the SEC, e.g. "Name email@example.com"
        #[arg(long, env = "HOBART_USER_AGENT")]
        user_agent: Option<String>,

        /// Maximum concurrent fetches
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Print a stored company's yearly metrics
    Metrics {
        /// Ticker symbol or CIK
        ticker: String,

        /// Output format (csv, json or pretty)
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Value a stored company, optionally overriding parameters
    Value {
        /// Ticker symbol or CIK
        ticker: String,

        /// Growth rate to project with
        #[arg(long)]
        growth: Option<f64>,

        /// Ceiling on the terminal PE
        #[arg(long)]
        pe_cap: Option<f64>,

        /// Discount rate
        #[arg(long)]
        discount: Option<f64>,

        /// Margin of safety as a fraction
        #[arg(long)]
        mos: Option<f64>,

        /// Current share price (defaults to the latest recorded price)
        #[arg(long)]
        price: Option<f64>,

        /// Historical average PE
        #[arg(long)]
        hist_pe: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Score a stored company's quality
    Quality {
        /// Ticker symbol or CIK
        ticker: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Record a share price for a stored company
    Price {
        /// Ticker symbol or CIK
        ticker: String,

        /// Share price
        price: f64,
    },

    /// Run the pipeline over a saved company-facts JSON document
    Run {
        /// Path to the company-facts document
        #[arg(long)]
        facts: PathBuf,

        /// Ticker to label the report with
        #[arg(long)]
        ticker: Option<String>,

        /// Current share price
        #[arg(long)]
        price: Option<f64>,

        /// Historical average PE
        #[arg(long)]
        hist_pe: Option<f64>,

        /// Also persist the output in the store
        #[arg(long)]
        save: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the subscriber: `RUST_LOG` filter (default `info`), JSON lines
/// when `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("Warning: logging not initialized: {}", e);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::new(config);
    let db = cli.db.as_deref();

    match cli.command {
        Commands::Ingest {
            tickers,
            user_agent,
            concurrency,
        } => {
            let user_agent = user_agent
                .ok_or("a User-Agent is required: pass --user-agent or set HOBART_USER_AGENT")?;
            let store = store_manager::open_store(db)?;
            ingest(&pipeline, &store, &user_agent, tickers, concurrency).await?;
        }
        Commands::Metrics { ticker, format } => {
            let format: ExportFormat = format.parse()?;
            let store = store_manager::open_store(db)?;
            let cik = store.resolve_cik(&ticker)?;
            let metrics = store.load_metrics(&cik)?;
            println!("{}", metrics.export_to_string(format)?);
        }
        Commands::Value {
            ticker,
            growth,
            pe_cap,
            discount,
            mos,
            price,
            hist_pe,
            format,
        } => {
            let params = override_params(
                pipeline.config().valuation,
                growth,
                pe_cap,
                discount,
                mos,
            );
            value(&pipeline, db, &ticker, &params, price, hist_pe, format)?;
        }
        Commands::Quality { ticker, format } => {
            quality(&pipeline, db, &ticker, format)?;
        }
        Commands::Price { ticker, price } => {
            let store = store_manager::open_store(db)?;
            let cik = store.resolve_cik(&ticker)?;
            store.record_price(&cik, price, Utc::now())?;
            println!("Recorded {} at {:.2}", ticker.to_uppercase(), price);
        }
        Commands::Run {
            facts,
            ticker,
            price,
            hist_pe,
            save,
            format,
        } => {
            let market = MarketContext {
                price,
                historical_pe: hist_pe,
            };
            let output = run_offline(&pipeline, &facts, market)?;
            if save {
                let store = store_manager::open_store(db)?;
                store.save_output(ticker.as_deref(), &output)?;
            }
            let report = output.report(ticker.as_deref())?;
            match format {
                OutputFormat::Text => print!("{}", report),
                OutputFormat::Json => println!("{}", report.to_json()?),
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    Ok(path.map_or_else(|| Ok(PipelineConfig::default()), PipelineConfig::load)?)
}

const fn override_params(
    mut params: ValuationParams,
    growth: Option<f64>,
    pe_cap: Option<f64>,
    discount: Option<f64>,
    mos: Option<f64>,
) -> ValuationParams {
    if let Some(growth) = growth {
        params = params.with_growth(growth);
    }
    if let Some(pe_cap) = pe_cap {
        params = params.with_pe_cap(pe_cap);
    }
    if let Some(discount) = discount {
        params = params.with_discount_rate(discount);
    }
    if let Some(mos) = mos {
        params = params.with_safety_margin(mos);
    }
    params
}

/// Fetch and analyze every ticker, saving each result as it arrives.
async fn ingest(
    pipeline: &Pipeline,
    store: &SqliteStore,
    user_agent: &str,
    tickers: Vec<String>,
    concurrency: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = EdgarClient::new(user_agent)?;
    let as_of = Utc::now();

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching company facts...");

    let client = &client;
    let mut results = stream::iter(tickers)
        .map(|ticker| async move {
            let ticker = ticker.trim().to_uppercase();
            let output = pipeline
                .ingest(client, &ticker, MarketContext::default(), as_of)
                .await;
            (ticker, output)
        })
        .buffer_unordered(concurrency.max(1));

    let mut saved = 0usize;
    let mut failed = 0usize;
    while let Some((ticker, output)) = results.next().await {
        let outcome = match output {
            Ok(output) => save_ingested(pipeline, store, &ticker, output, as_of),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(cik) => {
                saved += 1;
                pb.set_message(format!("{} (CIK {})", ticker, cik));
            }
            Err(e) => {
                failed += 1;
                pb.suspend(|| eprintln!("Warning: Failed to ingest {}: {}", ticker, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("Ingested {} companies ({} failed)", saved, failed));
    Ok(())
}

/// Save one ingested company, revaluing against its last recorded price.
fn save_ingested(
    pipeline: &Pipeline,
    store: &SqliteStore,
    ticker: &str,
    mut output: PipelineOutput,
    as_of: DateTime<Utc>,
) -> hobart::Result<String> {
    if let Some(cik) = output.cik()
        && let Some(price) = store.latest_price(cik)?
    {
        output.scenario = pipeline.value(
            &output.statements,
            &output.metrics,
            MarketContext::with_price(price),
            as_of,
        );
    }
    store.save_output(Some(ticker), &output)
}

fn value(
    pipeline: &Pipeline,
    db: Option<&Path>,
    ticker: &str,
    params: &ValuationParams,
    price: Option<f64>,
    hist_pe: Option<f64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db)?;
    let cik = store.resolve_cik(ticker)?;
    let statements = store.load_statements(&cik)?;
    let metrics = store.load_metrics(&cik)?;
    let price = match price {
        Some(price) => Some(price),
        None => store.latest_price(&cik)?,
    };

    let market = MarketContext {
        price,
        historical_pe: hist_pe,
    };
    let scenario = pipeline.value_with(params, &statements, &metrics, market, Utc::now());
    store.insert_scenario(&scenario)?;

    match format {
        OutputFormat::Json => println!("{}", scenario.export_to_string(ExportFormat::PrettyJson)?),
        OutputFormat::Text => {
            let report = ReportBuilder::new()
                .ticker(ticker.to_uppercase())
                .statements(&statements)
                .generated_at(scenario.as_of)
                .metrics(metrics)
                .scenario(Some(scenario))
                .build()?;
            print!("{}", report);
        }
    }
    Ok(())
}

fn quality(
    pipeline: &Pipeline,
    db: Option<&Path>,
    ticker: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db)?;
    let cik = store.resolve_cik(ticker)?;
    let statements = store.load_statements(&cik)?;
    let metrics = store.load_metrics(&cik)?;

    let score = pipeline.score(&statements, &metrics, Utc::now());
    store.put_quality_score(&score)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&score)?),
        OutputFormat::Text => {
            let report = ReportBuilder::new()
                .ticker(ticker.to_uppercase())
                .statements(&statements)
                .generated_at(score.as_of)
                .metrics(metrics)
                .quality(Some(score))
                .build()?;
            print!("{}", report);
        }
    }
    Ok(())
}

fn run_offline(
    pipeline: &Pipeline,
    facts: &Path,
    market: MarketContext,
) -> Result<PipelineOutput, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(facts)?;
    let feed = FactFeed::from_reader(std::io::BufReader::new(file))?;
    tracing::info!(path = %facts.display(), facts = feed.fact_count(), "loaded company facts");
    Ok(pipeline.run(&feed, market, Utc::now()))
}
