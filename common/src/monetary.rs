//! Currency and rate table types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::RateTableError;
use crate::time::{self, UnixSeconds};

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The rates of one base currency against the other configured currencies.
///
/// `rates[c]` is how many units of `c` one unit of `base` buys. The base
/// entry, when present, is exactly 1. A table may hold fewer currencies than
/// configured when the upstream source left some out.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: Currency,
    rates: HashMap<Currency, Decimal>,
    updated_at: UnixSeconds,
}

impl RateTable {
    /// Create a rate table, checking its invariants.
    pub fn new(
        base: Currency,
        rates: HashMap<Currency, Decimal>,
        updated_at: UnixSeconds,
    ) -> Result<Self, RateTableError> {
        if let Some((currency, rate)) = rates.iter().find(|(_, rate)| **rate < Decimal::ZERO) {
            return Err(RateTableError::NegativeRate {
                base,
                currency: currency.clone(),
                rate: *rate,
            });
        }

        if let Some(rate) = rates.get(&base) {
            if *rate != Decimal::ONE {
                return Err(RateTableError::BaseRateNotOne { base, rate: *rate });
            }
        }

        Ok(Self {
            base,
            rates,
            updated_at,
        })
    }

    /// The currency this table is expressed in.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Source-supplied update time, in seconds since the epoch.
    pub fn updated_at(&self) -> UnixSeconds {
        self.updated_at
    }

    pub fn rates(&self) -> &HashMap<Currency, Decimal> {
        &self.rates
    }

    /// Rate for `currency`, failing if the table has no entry for it.
    pub fn rate(&self, currency: &Currency) -> Result<Decimal, RateTableError> {
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| RateTableError::MissingRate {
                base: self.base.clone(),
                currency: currency.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Whether every currency in `currencies` has an entry.
    pub fn covers(&self, currencies: &[Currency]) -> bool {
        currencies.iter().all(|c| self.rates.contains_key(c))
    }

    /// Stale iff strictly older than the freshness boundary.
    pub fn is_stale(&self, freshness_boundary: UnixSeconds) -> bool {
        self.updated_at < freshness_boundary
    }

    /// Stale check against a TTL in days and an explicit clock reading.
    pub fn is_stale_at(&self, now: UnixSeconds, ttl_days: u32) -> bool {
        self.is_stale(time::freshness_boundary(now, ttl_days))
    }
}

impl fmt::Display for RateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} rates, updated {})",
            self.base,
            self.rates.len(),
            self.updated_at
        )
    }
}
