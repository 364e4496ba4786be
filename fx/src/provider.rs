//! Rate source traits and implementations.

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use xrate_common::{Currency, RateTable, UnixSeconds};

use crate::error::{FxError, FxResult};

/// What the upstream had for one currency.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRates {
    /// A rate table whose base is the requested currency.
    Found(RateTable),
    /// The upstream has no data for the currency right now.
    NotFound,
}

impl SourceRates {
    pub fn into_table(self) -> Option<RateTable> {
        match self {
            SourceRates::Found(table) => Some(table),
            SourceRates::NotFound => None,
        }
    }
}

/// Trait for upstream rate sources.
///
/// Implementations never cache. A non-success answer from the upstream is
/// [`SourceRates::NotFound`]; anything that stops an answer from arriving
/// or being read is an `Err`.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Currencies covered by [`fetch_all`](Self::fetch_all).
    fn currencies(&self) -> &[Currency];

    /// Fetch the rate table whose base is `currency`.
    async fn fetch_one(&self, currency: &Currency) -> FxResult<SourceRates>;

    /// Fetch one table per configured currency, concurrently.
    ///
    /// Currencies the upstream has no data for are left out. The first
    /// transport failure aborts the whole call.
    async fn fetch_all(&self) -> FxResult<HashMap<Currency, RateTable>> {
        let currencies = self.currencies();
        let results = try_join_all(currencies.iter().map(|c| self.fetch_one(c))).await?;

        let tables = currencies
            .iter()
            .zip(results)
            .filter_map(|(currency, rates)| match rates {
                SourceRates::Found(table) => Some((currency.clone(), table)),
                SourceRates::NotFound => {
                    debug!(source = self.name(), currency = %currency, "No rates from source");
                    None
                }
            })
            .collect();

        Ok(tables)
    }
}

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpRateSource`].
#[derive(Debug, Clone)]
pub struct HttpRateSourceConfig {
    /// Base URL; tables are fetched from `{base_url}/{CODE}.json`.
    pub base_url: String,
    /// Currencies to fetch and to keep from each payload.
    pub currencies: Vec<Currency>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpRateSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trainlinerecruitment.github.io/exchangerates/api/latest".to_string(),
            currencies: vec![Currency::eur(), Currency::gbp(), Currency::usd()],
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Upstream payload, one per base currency.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    time_last_updated: UnixSeconds,
    rates: HashMap<String, Decimal>,
}

/// Rate source backed by a static JSON rates API.
pub struct HttpRateSource {
    client: Client,
    config: HttpRateSourceConfig,
}

impl HttpRateSource {
    /// Create a new HTTP rate source.
    pub fn new(config: HttpRateSourceConfig) -> FxResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, config })
    }

    fn url_for(&self, currency: &Currency) -> String {
        format!(
            "{}/{}.json",
            self.config.base_url.trim_end_matches('/'),
            currency.code()
        )
    }

    /// Build a table from a payload body, keeping only configured currencies.
    fn parse_table(&self, base: &Currency, body: &str) -> FxResult<RateTable> {
        let payload: RatesPayload =
            serde_json::from_str(body).map_err(|e| FxError::MalformedPayload {
                currency: base.clone(),
                reason: e.to_string(),
            })?;

        let rates = payload
            .rates
            .into_iter()
            .map(|(code, rate)| (Currency::new(code), rate))
            .filter(|(currency, _)| self.config.currencies.contains(currency))
            .collect();

        RateTable::new(base.clone(), rates, payload.time_last_updated).map_err(|e| {
            FxError::MalformedPayload {
                currency: base.clone(),
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    fn currencies(&self) -> &[Currency] {
        &self.config.currencies
    }

    #[instrument(skip(self), fields(currency = %currency))]
    async fn fetch_one(&self, currency: &Currency) -> FxResult<SourceRates> {
        let url = self.url_for(currency);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Rate request failed");
            FxError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Rate source has no table");
            return Ok(SourceRates::NotFound);
        }

        let body = response.text().await?;
        let table = self.parse_table(currency, &body)?;

        debug!(
            rates = table.len(),
            updated_at = table.updated_at(),
            "Fetched rate table"
        );

        Ok(SourceRates::Found(table))
    }
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    currencies: Vec<Currency>,
    tables: dashmap::DashMap<Currency, RateTable>,
    failures: dashmap::DashMap<Currency, String>,
    latency: Option<Duration>,
    fetch_one_calls: std::sync::atomic::AtomicUsize,
    fetch_all_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source covering `currencies`.
    pub fn new(name: impl Into<String>, currencies: Vec<Currency>) -> Self {
        Self {
            name: name.into(),
            currencies,
            tables: dashmap::DashMap::new(),
            failures: dashmap::DashMap::new(),
            latency: None,
            fetch_one_calls: Default::default(),
            fetch_all_calls: Default::default(),
        }
    }

    /// Delay every fetch, to widen race windows in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `table` for its base currency.
    pub fn set_table(&self, table: RateTable) {
        self.tables.insert(table.base().clone(), table);
    }

    /// Answer NotFound for `currency` from now on.
    pub fn remove_table(&self, currency: &Currency) {
        self.tables.remove(currency);
    }

    /// Fail fetches of `currency` with a transport error.
    pub fn fail_with(&self, currency: Currency, reason: impl Into<String>) {
        self.failures.insert(currency, reason.into());
    }

    pub fn clear_failure(&self, currency: &Currency) {
        self.failures.remove(currency);
    }

    pub fn fetch_one_calls(&self) -> usize {
        self.fetch_one_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn scripted(&self, currency: &Currency) -> FxResult<SourceRates> {
        if let Some(reason) = self.failures.get(currency) {
            return Err(FxError::Transport(reason.clone()));
        }

        Ok(self
            .tables
            .get(currency)
            .map(|t| SourceRates::Found(t.clone()))
            .unwrap_or(SourceRates::NotFound))
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    async fn fetch_one(&self, currency: &Currency) -> FxResult<SourceRates> {
        self.fetch_one_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.pause().await;
        self.scripted(currency)
    }

    async fn fetch_all(&self) -> FxResult<HashMap<Currency, RateTable>> {
        self.fetch_all_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.pause().await;

        let mut tables = HashMap::new();
        for currency in &self.currencies {
            if let SourceRates::Found(table) = self.scripted(currency)? {
                tables.insert(currency.clone(), table);
            }
        }
        Ok(tables)
    }
}
