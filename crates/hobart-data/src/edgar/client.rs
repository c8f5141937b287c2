//! SEC EDGAR API client with rate limiting and retry.

use super::facts::FactFeed;
use crate::error::{DataError, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// Ticker to CIK mapping (hosted at www.sec.gov, not data.sec.gov)
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Company information from tickers endpoint
/// The SEC returns: {"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}
#[derive(Debug, Deserialize)]
struct CompanyInfo {
    /// CIK as a number (SEC returns this as an integer despite the name)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Exponential backoff for throttled or failing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Rate limiter to ensure we don't exceed SEC's rate limits
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR API client.
///
/// The SEC requires every request to carry a User-Agent identifying the
/// requester ("Company Name contact@email.com"); the client refuses to be
/// built without one.
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    retry: RetryPolicy,
    base_url: String,
}

impl EdgarClient {
    /// Create a new EDGAR client with default settings (10 req/sec)
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_rate_limit(user_agent, DEFAULT_RATE_LIMIT)
    }

    /// Create a new EDGAR client with custom rate limit
    ///
    /// # Example
    /// ```no_run
    /// use hobart_data::edgar::EdgarClient;
    /// use std::time::Duration;
    ///
    /// # fn example() -> hobart_data::Result<()> {
    /// // 5 requests per second
    /// let client = EdgarClient::with_rate_limit("Acme Research ops@acme.test", Duration::from_millis(200))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_rate_limit(user_agent: &str, min_interval: Duration) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(DataError::EdgarApi(
                "a User-Agent identifying the requester is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            retry: RetryPolicy::default(),
            base_url: EDGAR_BASE_URL.to_string(),
        })
    }

    /// Replace the retry policy.
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Look up a company's CIK number from its ticker symbol
    ///
    /// Returns the CIK as a zero-padded 10-digit string, or
    /// `DataError::CikNotFound` if the ticker is unknown.
    pub async fn get_company_cik(&self, ticker: &str) -> Result<String> {
        if ticker.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty ticker".to_string()));
        }

        let response = self.get(COMPANY_TICKERS_URL).await?;
        let data: HashMap<String, CompanyInfo> = response
            .json()
            .await
            .map_err(|e| DataError::EdgarApi(format!("Failed to parse company tickers: {}", e)))?;

        find_cik(&data, ticker).ok_or_else(|| DataError::CikNotFound(ticker.to_string()))
    }

    /// Fetch every XBRL fact the company has filed.
    ///
    /// `cik` may be padded or unpadded.
    pub async fn fetch_company_facts(&self, cik: &str) -> Result<FactFeed> {
        if cik.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty CIK".to_string()));
        }

        let cik_padded = format!("{:0>10}", cik.trim());
        let url = format!(
            "{}/api/xbrl/companyfacts/CIK{}.json",
            self.base_url, cik_padded
        );

        let body = self.get(&url).await?.text().await?;
        let feed = FactFeed::parse_json(&body)?;
        tracing::info!(
            cik = %cik_padded,
            facts = feed.fact_count(),
            "fetched company facts"
        );
        Ok(feed)
    }

    /// GET with rate limiting and exponential backoff on 429/5xx and
    /// transient network failures.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 1;
        loop {
            self.rate_limiter.lock().await.wait().await;

            let outcome = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => status_error(response.status()),
                Err(e) => DataError::Network(e),
            };

            if !outcome.is_transient() || attempt >= self.retry.max_attempts {
                return Err(outcome);
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %outcome,
                "EDGAR request failed, backing off"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

fn status_error(status: StatusCode) -> DataError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DataError::RateLimit {
            retry_after_ms: DEFAULT_RATE_LIMIT.as_millis() as u64,
        }
    } else {
        DataError::Http(format!("SEC API returned status {}", status))
    }
}

fn find_cik(data: &HashMap<String, CompanyInfo>, ticker: &str) -> Option<String> {
    data.values()
        .find(|company| company.ticker.eq_ignore_ascii_case(ticker.trim()))
        .map(|company| format!("{:0>10}", company.cik_str))
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
