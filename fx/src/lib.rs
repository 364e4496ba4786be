//! xrate FX Engine
//!
//! Rate caching and cross-rate calculation for currency exchange.
//!
//! # Features
//!
//! - Rate sources behind one trait, with an HTTP implementation
//! - A process-wide rate table cache with TTL refresh, bulk cold load and
//!   per-currency locking
//! - Cross-rate exchange with half-to-even rounding
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xrate_fx::{ExchangeCalculator, ExchangeCalculatorConfig, HttpRateSource, RateCache};
//! use xrate_common::{Currency, ExchangeRequest};
//!
//! let source = Arc::new(HttpRateSource::new(Default::default())?);
//! let cache = Arc::new(RateCache::new(source));
//! let calculator = ExchangeCalculator::new(cache, ExchangeCalculatorConfig::default());
//!
//! let request = ExchangeRequest::new(dec!(23.32), Currency::eur(), Currency::gbp());
//! let response = calculator.exchange(&request).await?;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod error;

pub use engine::{ExchangeCalculator, ExchangeCalculatorConfig};
pub use provider::{HttpRateSource, HttpRateSourceConfig, RateSource, SourceRates};
pub use cache::{CacheStats, RateCache, SharedRateCache};
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
