//! Inbound exchange request validation.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use xrate_common::{Currency, ExchangeRequest};

/// An exchange request as received, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawExchangeRequest {
    pub price: Option<Decimal>,
    pub source: Option<String>,
    pub target: Option<String>,
}

/// Rejections of a raw exchange request. Each maps to a client error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("The price is missing or its not a value greater than 0")]
    InvalidPrice,

    #[error("The following currencies are missing from the input: '{}'.", .0.join(","))]
    MissingCurrencies(Vec<&'static str>),

    #[error(
        "The following currencies are invalid: '{}'. Please remember that the source or target currency has to be one of: {}",
        .fields.join(","),
        .allowed
    )]
    InvalidCurrencies {
        fields: Vec<&'static str>,
        allowed: String,
    },

    #[error("The request body could not be read: {0}")]
    Malformed(String),
}

impl RequestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidPrice => "INVALID_PRICE",
            RequestError::MissingCurrencies(_) => "MISSING_CURRENCIES",
            RequestError::InvalidCurrencies { .. } => "INVALID_CURRENCIES",
            RequestError::Malformed(_) => "MALFORMED_REQUEST",
        }
    }
}

/// Turns raw requests into [`ExchangeRequest`]s over a fixed currency set.
#[derive(Debug, Clone)]
pub struct ExchangeRequestBuilder {
    currencies: Vec<Currency>,
}

impl ExchangeRequestBuilder {
    pub fn new(currencies: Vec<Currency>) -> Self {
        Self { currencies }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Validate a raw request.
    ///
    /// The price is checked first, then presence of both currencies, then
    /// membership in the configured set. Only the first failing check is
    /// reported.
    pub fn build(&self, raw: &RawExchangeRequest) -> Result<ExchangeRequest, RequestError> {
        let price = match raw.price {
            Some(price) if price > Decimal::ZERO => price,
            _ => return Err(RequestError::InvalidPrice),
        };

        let (source, target) = match (non_blank(&raw.source), non_blank(&raw.target)) {
            (Some(source), Some(target)) => (Currency::new(source), Currency::new(target)),
            (source, target) => {
                let mut missing = Vec::new();
                if source.is_none() {
                    missing.push("Source");
                }
                if target.is_none() {
                    missing.push("Target");
                }
                return Err(RequestError::MissingCurrencies(missing));
            }
        };

        let mut invalid = Vec::new();
        if !self.currencies.contains(&source) {
            invalid.push("Source");
        }
        if !self.currencies.contains(&target) {
            invalid.push("Target");
        }
        if !invalid.is_empty() {
            return Err(RequestError::InvalidCurrencies {
                fields: invalid,
                allowed: self.allowed_list(),
            });
        }

        Ok(ExchangeRequest::new(price, source, target))
    }

    /// Decode a JSON body and validate it.
    pub fn parse(&self, body: &str) -> Result<ExchangeRequest, RequestError> {
        let raw: RawExchangeRequest =
            serde_json::from_str(body).map_err(|e| RequestError::Malformed(e.to_string()))?;
        self.build(&raw)
    }

    fn allowed_list(&self) -> String {
        self.currencies
            .iter()
            .map(|c| c.code().to_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn builder() -> ExchangeRequestBuilder {
        ExchangeRequestBuilder::new(vec![Currency::eur(), Currency::gbp(), Currency::usd()])
    }

    fn raw(price: Option<Decimal>, source: Option<&str>, target: Option<&str>) -> RawExchangeRequest {
        RawExchangeRequest {
            price,
            source: source.map(String::from),
            target: target.map(String::from),
        }
    }

    #[test]
    fn test_valid_request_is_normalised() {
        let request = builder()
            .build(&raw(Some(dec!(23.32)), Some(" eur"), Some("Gbp")))
            .unwrap();

        assert_eq!(request.price, dec!(23.32));
        assert_eq!(request.source_currency, Currency::eur());
        assert_eq!(request.target_currency, Currency::gbp());
    }

    #[test]
    fn test_price_must_be_positive() {
        for price in [None, Some(dec!(0)), Some(dec!(-1.5))] {
            let err = builder().build(&raw(price, Some("EUR"), Some("GBP"))).unwrap_err();
            assert_eq!(err, RequestError::InvalidPrice);
            assert_eq!(
                err.to_string(),
                "The price is missing or its not a value greater than 0"
            );
        }
    }

    #[test]
    fn test_price_checked_before_currencies() {
        let err = builder().build(&raw(None, None, Some("JPY"))).unwrap_err();
        assert_eq!(err, RequestError::InvalidPrice);
    }

    #[test]
    fn test_missing_currencies() {
        let err = builder().build(&raw(Some(dec!(1)), None, Some("GBP"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following currencies are missing from the input: 'Source'."
        );

        let err = builder().build(&raw(Some(dec!(1)), Some("  "), None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following currencies are missing from the input: 'Source,Target'."
        );
    }

    #[test]
    fn test_invalid_currencies() {
        let err = builder()
            .build(&raw(Some(dec!(1)), Some("EUR"), Some("JPY")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following currencies are invalid: 'Target'. Please remember that the source or target currency has to be one of: eur, gbp, usd"
        );

        let err = builder()
            .build(&raw(Some(dec!(1)), Some("CHF"), Some("JPY")))
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidCurrencies { ref fields, .. } if fields == &["Source", "Target"]
        ));
    }

    #[test]
    fn test_parse_json_body() {
        let request = builder()
            .parse(r#"{"price": 23.32, "source": "EUR", "target": "USD"}"#)
            .unwrap();
        assert_eq!(request.price, dec!(23.32));
        assert_eq!(request.target_currency, Currency::usd());

        let err = builder().parse(r#"{"price": "#).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_REQUEST");

        let err = builder().parse(r#"{"source": "EUR", "target": "USD"}"#).unwrap_err();
        assert_eq!(err, RequestError::InvalidPrice);
    }
}
