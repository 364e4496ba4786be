//! Exchange request handling and outcome mapping.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use xrate_common::{ExchangeQuote, ExchangeRequest, ExchangeResponse};
use xrate_fx::ExchangeCalculator;

use crate::request::{ExchangeRequestBuilder, RawExchangeRequest, RequestError};

/// What a caller gets back for one exchange request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// 200 with the quote.
    Exchanged(ExchangeQuote),
    /// 400, the request failed validation.
    BadRequest(String),
    /// 404, no rates for the source currency.
    NotFound(String),
    /// 503, the rate source failed or returned unusable data.
    Unavailable(String),
}

impl ExchangeOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            ExchangeOutcome::Exchanged(_) => 200,
            ExchangeOutcome::BadRequest(_) => 400,
            ExchangeOutcome::NotFound(_) => 404,
            ExchangeOutcome::Unavailable(_) => 503,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExchangeOutcome::Exchanged(_))
    }

    /// Response body as JSON.
    pub fn body(&self) -> Value {
        match self {
            ExchangeOutcome::Exchanged(quote) => {
                serde_json::to_value(quote).unwrap_or_else(|e| json!({ "errorMessage": e.to_string() }))
            }
            ExchangeOutcome::BadRequest(message)
            | ExchangeOutcome::NotFound(message)
            | ExchangeOutcome::Unavailable(message) => json!({ "errorMessage": message }),
        }
    }
}

impl From<RequestError> for ExchangeOutcome {
    fn from(err: RequestError) -> Self {
        ExchangeOutcome::BadRequest(err.to_string())
    }
}

/// Validates requests and runs them through the calculator.
pub struct ExchangeHandler {
    builder: ExchangeRequestBuilder,
    calculator: Arc<ExchangeCalculator>,
}

impl ExchangeHandler {
    pub fn new(builder: ExchangeRequestBuilder, calculator: Arc<ExchangeCalculator>) -> Self {
        Self {
            builder,
            calculator,
        }
    }

    /// Handle an already decoded request.
    pub async fn handle(&self, raw: &RawExchangeRequest) -> ExchangeOutcome {
        match self.builder.build(raw) {
            Ok(request) => self.exchange(&request).await,
            Err(e) => rejected(e),
        }
    }

    /// Handle a JSON request body.
    pub async fn handle_json(&self, body: &str) -> ExchangeOutcome {
        match self.builder.parse(body) {
            Ok(request) => self.exchange(&request).await,
            Err(e) => rejected(e),
        }
    }

    #[instrument(skip(self), fields(request = %request))]
    async fn exchange(&self, request: &ExchangeRequest) -> ExchangeOutcome {
        match self.calculator.exchange(request).await {
            Ok(ExchangeResponse::Exchanged(quote)) => ExchangeOutcome::Exchanged(quote),
            Ok(ExchangeResponse::NotFound { source_currency }) => ExchangeOutcome::NotFound(format!(
                "The exchange information for the currency {} was not found or its out of date",
                source_currency
            )),
            Err(e) => {
                warn!(error = %e, error_code = e.error_code(), "Exchange failed");
                ExchangeOutcome::Unavailable(e.to_string())
            }
        }
    }

    pub fn calculator(&self) -> &Arc<ExchangeCalculator> {
        &self.calculator
    }
}

fn rejected(err: RequestError) -> ExchangeOutcome {
    debug!(error = %err, error_code = err.error_code(), "Request rejected");
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use xrate_common::{Currency, RateTable};
    use xrate_fx::{ExchangeCalculatorConfig, MockRateSource, RateCache};

    fn currencies() -> Vec<Currency> {
        vec![Currency::eur(), Currency::gbp(), Currency::usd()]
    }

    fn eur_table() -> RateTable {
        RateTable::new(
            Currency::eur(),
            HashMap::from([
                (Currency::eur(), dec!(1)),
                (Currency::gbp(), dec!(0.855552)),
                (Currency::usd(), dec!(1.183894)),
            ]),
            xrate_common::time::now(),
        )
        .unwrap()
    }

    fn setup_handler() -> (Arc<MockRateSource>, ExchangeHandler) {
        let source = Arc::new(MockRateSource::new("test", currencies()));
        source.set_table(eur_table());
        let cache = Arc::new(RateCache::new(source.clone()));
        let calculator = Arc::new(ExchangeCalculator::new(
            cache,
            ExchangeCalculatorConfig::default(),
        ));
        let handler = ExchangeHandler::new(ExchangeRequestBuilder::new(currencies()), calculator);
        (source, handler)
    }

    fn raw(price: Decimal, source: &str, target: &str) -> RawExchangeRequest {
        RawExchangeRequest {
            price: Some(price),
            source: Some(source.to_string()),
            target: Some(target.to_string()),
        }
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let (_, handler) = setup_handler();

        let outcome = handler.handle(&raw(dec!(23.32), "EUR", "GBP")).await;

        assert_eq!(outcome.status_code(), 200);
        assert!(outcome.is_success());
        assert_eq!(
            outcome.body(),
            json!({ "exchange": 19.95, "exchangeIn": "GBP", "exchangeRate": 0.855552 })
        );
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let (source, handler) = setup_handler();

        let outcome = handler.handle(&raw(dec!(0), "EUR", "GBP")).await;

        assert_eq!(outcome.status_code(), 400);
        assert_eq!(
            outcome.body(),
            json!({ "errorMessage": "The price is missing or its not a value greater than 0" })
        );
        assert_eq!(source.fetch_all_calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let (_, handler) = setup_handler();

        let outcome = handler.handle_json("not json").await;

        assert_eq!(outcome.status_code(), 400);
    }

    #[tokio::test]
    async fn test_missing_rates_is_not_found() {
        let (_, handler) = setup_handler();

        let outcome = handler
            .handle_json(r#"{"price": 10, "source": "usd", "target": "eur"}"#)
            .await;

        assert_eq!(outcome.status_code(), 404);
        assert_eq!(
            outcome,
            ExchangeOutcome::NotFound(
                "The exchange information for the currency USD was not found or its out of date"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_source_failure_is_unavailable() {
        let (source, handler) = setup_handler();
        source.fail_with(Currency::eur(), "connection reset");

        let outcome = handler.handle(&raw(dec!(23.32), "EUR", "USD")).await;

        assert_eq!(outcome.status_code(), 503);
        match outcome {
            ExchangeOutcome::Unavailable(message) => assert!(message.contains("connection reset")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_overflowing_amount_is_unavailable() {
        let (_, handler) = setup_handler();

        let outcome = handler.handle(&raw(Decimal::MAX, "EUR", "USD")).await;

        assert_eq!(outcome.status_code(), 503);
    }

    #[tokio::test]
    async fn test_requests_share_one_cache() {
        let (source, handler) = setup_handler();

        for target in ["GBP", "USD", "EUR"] {
            let outcome = handler.handle(&raw(dec!(23.32), "EUR", target)).await;
            assert!(outcome.is_success());
        }

        assert_eq!(source.fetch_all_calls(), 1);
        assert_eq!(source.fetch_one_calls(), 0);
        assert_eq!(handler.calculator().cache().len(), 1);
    }
}
