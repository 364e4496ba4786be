//! xrate Common Types
//!
//! This crate contains shared types used across xrate, including currencies,
//! rate tables, exchange requests and responses.

pub mod monetary;
pub mod exchange;
pub mod error;
pub mod time;

pub use monetary::*;
pub use exchange::*;
pub use error::*;
pub use time::UnixSeconds;
