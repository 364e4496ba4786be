//! Exchange request and response types.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::Currency;

/// A validated request to exchange `price` from one currency to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    /// Amount to exchange, always positive.
    pub price: Decimal,
    /// Currency the price is expressed in.
    pub source_currency: Currency,
    /// Currency to exchange into.
    pub target_currency: Currency,
}

impl ExchangeRequest {
    pub fn new(price: Decimal, source_currency: Currency, target_currency: Currency) -> Self {
        Self {
            price,
            source_currency,
            target_currency,
        }
    }
}

impl fmt::Display for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.price, self.source_currency, self.target_currency
        )
    }
}

/// A computed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeQuote {
    /// Exchanged amount, rounded to 2 decimal places.
    #[serde(rename = "exchange", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency of `amount`.
    #[serde(rename = "exchangeIn")]
    pub target_currency: Currency,
    /// Target rate taken from the source currency's table.
    #[serde(rename = "exchangeRate", with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

/// Result of an exchange that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeResponse {
    /// Rates were available and the amount was computed.
    Exchanged(ExchangeQuote),
    /// No rate data is available for the source currency.
    NotFound { source_currency: Currency },
}

impl ExchangeResponse {
    /// Get the quote, if the exchange happened.
    pub fn quote(&self) -> Option<&ExchangeQuote> {
        match self {
            ExchangeResponse::Exchanged(quote) => Some(quote),
            ExchangeResponse::NotFound { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExchangeResponse::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_wire_shape() {
        let quote = ExchangeQuote {
            amount: dec!(19.95),
            target_currency: Currency::gbp(),
            rate: dec!(0.855552),
        };

        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "exchange": 19.95,
                "exchangeIn": "GBP",
                "exchangeRate": 0.855552
            })
        );
    }

    #[test]
    fn test_not_found_has_no_quote() {
        let response = ExchangeResponse::NotFound {
            source_currency: Currency::usd(),
        };

        assert!(response.is_not_found());
        assert!(response.quote().is_none());
    }
}
