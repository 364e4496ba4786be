//! Rate table caching with TTL refresh.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use xrate_common::{time, Currency, RateTable, UnixSeconds};

use crate::error::FxResult;
use crate::provider::{RateSource, SourceRates};

/// Process-wide cache of one rate table per base currency.
///
/// The cache starts empty. A lookup against an empty cache bulk-loads every
/// configured currency; after that, entries are refreshed one at a time when
/// they go stale, and evicted when the source no longer has data for them.
/// An evicted currency stays absent until the cache is empty again.
///
/// Locking: bulk loads are serialised by `cold_load`, and the
/// check/refresh/replace sequence for a currency runs under that currency's
/// own lock, so lookups of different currencies never wait on each other.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    tables: DashMap<Currency, RateTable>,
    entry_locks: DashMap<Currency, Arc<Mutex<()>>>,
    cold_load: Mutex<()>,
}

impl RateCache {
    /// Create an empty cache over `source`.
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            tables: DashMap::new(),
            entry_locks: DashMap::new(),
            cold_load: Mutex::new(()),
        }
    }

    /// Get the table for `currency`, loading or refreshing it as needed.
    ///
    /// Returns `None` when there is no data for the currency. Source
    /// failures are returned unchanged.
    pub async fn lookup(
        &self,
        currency: &Currency,
        refresh_ttl_days: u32,
    ) -> FxResult<Option<RateTable>> {
        self.lookup_at(currency, refresh_ttl_days, time::now()).await
    }

    /// [`lookup`](Self::lookup) with an explicit clock reading.
    #[instrument(skip(self), fields(currency = %currency))]
    pub async fn lookup_at(
        &self,
        currency: &Currency,
        refresh_ttl_days: u32,
        now: UnixSeconds,
    ) -> FxResult<Option<RateTable>> {
        self.load_if_empty().await?;

        let lock = self.entry_lock(currency);
        let _guard = lock.lock().await;

        // The last entry may have been evicted while we waited for the lock.
        if self.tables.is_empty() {
            self.load_if_empty().await?;
        }

        let cached = self.tables.get(currency).map(|entry| entry.value().clone());
        let Some(table) = cached else {
            debug!("Currency not cached");
            return Ok(None);
        };

        if !table.is_stale_at(now, refresh_ttl_days) {
            debug!("Cache hit");
            return Ok(Some(table));
        }

        debug!(
            updated_at = ?time::to_datetime(table.updated_at()),
            "Cache entry stale, refreshing"
        );

        match self.source.fetch_one(currency).await? {
            SourceRates::Found(fresh) => {
                self.tables.insert(currency.clone(), fresh.clone());
                debug!(updated_at = fresh.updated_at(), "Cache entry refreshed");
                Ok(Some(fresh))
            }
            SourceRates::NotFound => {
                self.tables.remove(currency);
                info!("No fresher rates available, evicted cache entry");
                Ok(None)
            }
        }
    }

    /// Bulk-load every configured currency if the cache is empty.
    async fn load_if_empty(&self) -> FxResult<()> {
        if !self.tables.is_empty() {
            return Ok(());
        }

        let _guard = self.cold_load.lock().await;

        // A concurrent lookup may have loaded while we waited.
        if !self.tables.is_empty() {
            return Ok(());
        }

        let tables = self.source.fetch_all().await?;
        info!(
            source = self.source.name(),
            loaded = tables.len(),
            configured = self.source.currencies().len(),
            "Loaded rate cache"
        );

        for table in tables.into_values() {
            self.tables.insert(table.base().clone(), table);
        }

        Ok(())
    }

    fn entry_lock(&self, currency: &Currency) -> Arc<Mutex<()>> {
        self.entry_locks
            .entry(currency.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Check whether a table for `currency` is cached.
    pub fn contains(&self, currency: &Currency) -> bool {
        self.tables.contains_key(currency)
    }

    /// Get the number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Get cache statistics for a TTL and clock reading.
    pub fn stats(&self, refresh_ttl_days: u32, now: UnixSeconds) -> CacheStats {
        let entries = self.tables.len();
        let stale_entries = self
            .tables
            .iter()
            .filter(|entry| entry.is_stale_at(now, refresh_ttl_days))
            .count();

        CacheStats {
            entries,
            stale_entries,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub stale_entries: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
