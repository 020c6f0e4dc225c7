//! Core traits for the database client seam.
//!
//! The tool never talks to a database driver directly. It works through:
//!
//! - [`ScriptTarget`]: executes statements inside an explicit transaction
//! - [`CatalogSource`]: reads schema descriptors from the system catalog
//! - [`Connector`]: opens, creates, and closes connections
//!
//! The Firebird implementation lives in [`drivers::firebird`](crate::drivers).
//! Tests use in-memory implementations.
//!
//! # Send
//!
//! The traits are declared `?Send`: every operation runs sequentially on the
//! calling task, and driver connections are not required to be `Send`.

use async_trait::async_trait;
use tracing::warn;

use crate::config::ConnectionConfig;
use crate::error::Result;

use super::schema::{DomainDescriptor, ParameterDescriptor, ProcedureDescriptor, TableDescriptor};

/// Execute SQL statements inside a transaction.
///
/// One transaction is open at a time. Statement errors are returned as
/// plain messages; the caller decides how to wrap them.
#[async_trait(?Send)]
pub trait ScriptTarget {
    /// Start a transaction.
    async fn begin_transaction(&mut self) -> Result<()>;

    /// Execute a single statement in the open transaction.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<()>;
}

/// Read schema metadata from the system catalog.
///
/// Each method corresponds to one catalog query. Results are ordered by name
/// (domains, tables, procedures) or by position (columns, parameters).
#[async_trait(?Send)]
pub trait CatalogSource {
    /// User domains: non-system fields whose names are not `RDB$`-prefixed.
    async fn load_domains(&mut self) -> Result<Vec<DomainDescriptor>>;

    /// User tables without columns. Views and system relations are excluded.
    async fn load_tables(&mut self) -> Result<Vec<TableDescriptor>>;

    /// Populate `table.columns` in field position order.
    async fn load_columns(&mut self, table: &mut TableDescriptor) -> Result<()>;

    /// User procedures with their source body, parameters not loaded.
    async fn load_procedures(&mut self) -> Result<Vec<ProcedureDescriptor>>;

    /// Input and output parameters of a procedure.
    async fn load_procedure_parameters(
        &mut self,
        procedure: &str,
    ) -> Result<Vec<ParameterDescriptor>>;
}

/// Opens connections to a database.
///
/// Connections are scoped to one logical operation and closed by the
/// operation that opened them.
#[async_trait(?Send)]
pub trait Connector {
    /// Connection type produced by this connector.
    type Connection: ScriptTarget + CatalogSource;

    /// Attach to an existing database.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Connection>;

    /// Create a new database at `config.database` with the given page size
    /// and attach to it.
    async fn create_database(
        &self,
        config: &ConnectionConfig,
        page_size: u32,
    ) -> Result<Self::Connection>;

    /// Detach and release the connection.
    async fn close(&self, connection: Self::Connection) -> Result<()>;

    /// Database type identifier (e.g., "firebird").
    fn db_type(&self) -> &str;
}

/// Close `connection` and return `result`.
///
/// A close failure is returned only when `result` is `Ok`; otherwise it is
/// logged and the original error wins.
pub(crate) async fn close_after<K: Connector, T>(
    connector: &K,
    connection: K::Connection,
    result: Result<T>,
) -> Result<T> {
    match (result, connector.close(connection).await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), close_result) => {
            if let Err(close_err) = close_result {
                warn!("Failed to close {} connection: {}", connector.db_type(), close_err);
            }
            Err(e)
        }
    }
}
