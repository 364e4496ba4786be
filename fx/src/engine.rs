//! Exchange calculator.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, instrument};
use xrate_common::{ExchangeQuote, ExchangeRequest, ExchangeResponse, RateTable};

use crate::cache::RateCache;
use crate::error::{FxError, FxResult};

/// Decimal places of an exchanged amount.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Configuration for the exchange calculator.
#[derive(Debug, Clone)]
pub struct ExchangeCalculatorConfig {
    /// Days before a cached rate table is refreshed.
    pub refresh_ttl_days: u32,
}

impl Default for ExchangeCalculatorConfig {
    fn default() -> Self {
        Self {
            refresh_ttl_days: 60,
        }
    }
}

/// Converts amounts between currencies using cached rate tables.
pub struct ExchangeCalculator {
    cache: Arc<RateCache>,
    config: ExchangeCalculatorConfig,
}

impl ExchangeCalculator {
    /// Create a calculator over a shared cache.
    pub fn new(cache: Arc<RateCache>, config: ExchangeCalculatorConfig) -> Self {
        Self { cache, config }
    }

    /// Exchange `request.price` into the target currency.
    ///
    /// Returns [`ExchangeResponse::NotFound`] when there are no rates for the
    /// source currency. Rate source failures, and tables missing one of the
    /// two currencies, are errors.
    #[instrument(skip(self), fields(
        source_currency = %request.source_currency,
        target_currency = %request.target_currency,
        price = %request.price
    ))]
    pub async fn exchange(&self, request: &ExchangeRequest) -> FxResult<ExchangeResponse> {
        let Some(table) = self
            .cache
            .lookup(&request.source_currency, self.config.refresh_ttl_days)
            .await?
        else {
            debug!("No rates for source currency");
            return Ok(ExchangeResponse::NotFound {
                source_currency: request.source_currency.clone(),
            });
        };

        let quote = quote(request, &table)?;

        info!(amount = %quote.amount, rate = %quote.rate, "Exchange completed");

        Ok(ExchangeResponse::Exchanged(quote))
    }

    /// Get the shared cache.
    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    pub fn config(&self) -> &ExchangeCalculatorConfig {
        &self.config
    }
}

/// Cross-rate conversion of one request against the source currency's table.
///
/// Both rates are read from the table; the source's own rate is 1 for a
/// well-formed table, but a table without it fails rather than assuming so.
pub fn quote(request: &ExchangeRequest, table: &RateTable) -> FxResult<ExchangeQuote> {
    let reference_rate = table.rate(&request.source_currency)?;
    let target_rate = table.rate(&request.target_currency)?;

    if reference_rate.is_zero() {
        return Err(FxError::ZeroReferenceRate(request.source_currency.clone()));
    }

    let amount = request
        .price
        .checked_mul(target_rate)
        .and_then(|scaled| scaled.checked_div(reference_rate))
        .map(round_amount)
        .ok_or_else(|| FxError::AmountOverflow {
            price: request.price,
            source_currency: request.source_currency.clone(),
            target_currency: request.target_currency.clone(),
        })?;

    Ok(ExchangeQuote {
        amount,
        target_currency: request.target_currency.clone(),
        rate: target_rate,
    })
}

/// Round to [`AMOUNT_DECIMAL_PLACES`], half to even.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}
