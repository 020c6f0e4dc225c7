//! Database driver implementations.
//!
//! Each driver implements the client traits from [`core::traits`](crate::core::traits):
//!
//! - [`firebird`]: Firebird 3.0+ (feature `firebird`, enabled by default)

#[cfg(feature = "firebird")]
pub mod firebird;

#[cfg(feature = "firebird")]
pub use firebird::{FirebirdConnection, FirebirdConnector};
