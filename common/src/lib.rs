//! Minibank Common Types
//!
//! Shared types used across the minibank workspace: account identifiers,
//! minor-unit money, the transfer request/receipt pair and the transfer
//! error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod transfer;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use transfer::*;
pub use error::*;
