//! xrate Gateway
//!
//! Front end of the exchange service: validates inbound requests, runs them
//! through the shared calculator and maps results to status codes and JSON
//! bodies.

pub mod config;
pub mod handler;
pub mod request;
pub mod serve;

pub use config::GatewayConfig;
pub use handler::{ExchangeHandler, ExchangeOutcome};
pub use request::{ExchangeRequestBuilder, RawExchangeRequest, RequestError};
pub use serve::serve_lines;
