//! SEC EDGAR data fetching.
//!
//! This module provides access to the raw fact feed:
//! - Company CIK lookup from ticker symbols
//! - Company-facts retrieval with rate limiting and exponential backoff
//! - Parsing of the company-facts JSON document
//!
//! # Example
//!
//! ```no_run
//! use hobart_data::edgar::EdgarClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new("Acme Research ops@acme.test")?;
//!     let cik = client.get_company_cik("AAPL").await?;
//!     let feed = client.fetch_company_facts(&cik).await?;
//!     println!("{} facts for {:?}", feed.fact_count(), feed.entity_name);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod facts;

pub use client::{EdgarClient, RetryPolicy};
pub use facts::{FactFeed, ReportedFact, TagFacts};
