//! Firebird driver.
//!
//! - [`FirebirdConnector`]: attaches to and creates databases
//! - [`FirebirdConnection`]: script target and `RDB$` catalog reader
//!
//! The client is rsfbclient's pure-Rust wire protocol implementation, so no
//! native client library is required.

mod catalog;
mod connection;

pub use connection::{FirebirdConnection, FirebirdConnector};
