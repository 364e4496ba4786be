//! FX engine error types.

use rust_decimal::Decimal;
use thiserror::Error;
use xrate_common::{Currency, RateTableError};

/// Errors that can occur in the FX engine.
///
/// Missing rate data is not an error: the source reports it as
/// [`SourceRates::NotFound`](crate::SourceRates::NotFound) and the cache as
/// `None`. Everything here is either an upstream failure or a
/// data-integrity fault.
#[derive(Debug, Error)]
pub enum FxError {
    /// The upstream could not be reached, timed out, or failed mid-response.
    #[error("Rate source transport error: {0}")]
    Transport(String),

    /// The upstream answered with a body that is not a usable rate table.
    #[error("Malformed rate payload for {currency}: {reason}")]
    MalformedPayload { currency: Currency, reason: String },

    /// A stored rate table lacks an entry or breaks an invariant.
    #[error(transparent)]
    RateTable(#[from] RateTableError),

    /// The source currency's own rate is zero, so no cross rate exists.
    #[error("Reference rate for {0} is zero")]
    ZeroReferenceRate(Currency),

    /// The exchanged amount does not fit in a decimal.
    #[error("Exchanging {price} {source_currency} into {target_currency} overflows")]
    AmountOverflow {
        price: Decimal,
        source_currency: Currency,
        target_currency: Currency,
    },
}

impl FxError {
    /// Whether this error came from talking to the upstream source.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FxError::Transport(_) | FxError::MalformedPayload { .. }
        )
    }

    /// Get error code for outcome bodies and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Transport(_) => "TRANSPORT_ERROR",
            FxError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            FxError::RateTable(e) => e.error_code(),
            FxError::ZeroReferenceRate(_) => "ZERO_REFERENCE_RATE",
            FxError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
        }
    }
}

impl From<reqwest::Error> for FxError {
    fn from(e: reqwest::Error) -> Self {
        FxError::Transport(e.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(FxError::Transport("connection refused".to_string()).is_transport());
        assert!(FxError::MalformedPayload {
            currency: Currency::eur(),
            reason: "missing rates".to_string(),
        }
        .is_transport());

        let integrity = FxError::from(RateTableError::MissingRate {
            base: Currency::eur(),
            currency: Currency::usd(),
        });
        assert!(!integrity.is_transport());
        assert_eq!(integrity.error_code(), "MISSING_RATE");
    }
}
