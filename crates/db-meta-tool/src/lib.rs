//! # db-meta-tool
//!
//! Build a Firebird database from ordered DDL scripts, and export a database's
//! schema back to a DDL script.
//!
//! - **Script runner**: applies `*.sql` files in path order, one transaction per file
//! - **Statement splitter**: line-anchored terminators, block comments stripped
//! - **Catalog reconstructor**: domains, tables, and procedures from `RDB$` tables
//! - **Native export**: `gbak` backup plus metadata-only restore
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use db_meta_tool::{Config, Orchestrator};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> db_meta_tool::Result<()> {
//!     let orchestrator = Orchestrator::firebird(Config::default());
//!     let report = orchestrator
//!         .build_database(Path::new("db"), Path::new("scripts"))
//!         .await?;
//!     println!("Applied {} statements", report.summary.total_statements);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod script;
pub mod service;
pub mod typemap;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::{Config, ConnectionConfig, ExportStrategy, SplitPolicy};
pub use ddl::{DdlReconstructor, DdlReport};
pub use error::{MetaError, Result};
pub use export::{ExportReport, Exporter};
pub use orchestrator::{BuildReport, Orchestrator};
pub use script::{RunSummary, ScriptRunner, StatementSplitter};
pub use service::{BackupService, GbakService, ServiceJob};
pub use typemap::map_type;
