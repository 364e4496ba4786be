//! Error types for rate table construction and lookup.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::Currency;

/// A rate table broke one of its invariants, or lacks a requested entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateTableError {
    /// The table has no rate for the requested currency.
    #[error("Rate table for {base} has no rate for {currency}")]
    MissingRate { base: Currency, currency: Currency },

    /// A rate below zero.
    #[error("Rate table for {base} has negative rate {rate} for {currency}")]
    NegativeRate {
        base: Currency,
        currency: Currency,
        rate: Decimal,
    },

    /// The base currency's own entry is not exactly 1.
    #[error("Rate table for {base} has base rate {rate}, expected 1")]
    BaseRateNotOne { base: Currency, rate: Decimal },
}

impl RateTableError {
    /// Get error code for outcome bodies and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            RateTableError::MissingRate { .. } => "MISSING_RATE",
            RateTableError::NegativeRate { .. } => "NEGATIVE_RATE",
            RateTableError::BaseRateNotOne { .. } => "BASE_RATE_NOT_ONE",
        }
    }
}
