//! Minibank Gateway
//!
//! Configuration, logging and the JSON boundary in front of the ledger.

pub mod api;
pub mod config;
pub mod logging;
pub mod seed;

pub use api::{ApiError, ApiResponse};
pub use config::{GatewayConfig, LogFormat};
