//! Firebird connector and connection.
//!
//! rsfbclient is synchronous. Each call runs inside
//! [`tokio::task::block_in_place`], which needs the multi-threaded runtime.

use async_trait::async_trait;
use rsfbclient::{Execute, FbError, Queryable, SimpleConnection};
use tracing::{debug, info};

use super::catalog::{
    column_from_row, domain_from_row, parameter_from_row, procedure_from_row, table_from_row,
    ColumnRow, DomainRow, ParameterRow, ProcedureRow, COLUMNS_QUERY, DOMAINS_QUERY,
    PARAMETERS_QUERY, PROCEDURES_QUERY, TABLES_QUERY,
};
use crate::config::ConnectionConfig;
use crate::core::schema::{DomainDescriptor, ParameterDescriptor, ProcedureDescriptor, TableDescriptor};
use crate::core::traits::{CatalogSource, Connector, ScriptTarget};
use crate::error::{MetaError, Result};

fn db_err(err: FbError) -> MetaError {
    MetaError::Database(err.to_string())
}

/// Opens Firebird attachments over the wire protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebirdConnector;

impl FirebirdConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Connector for FirebirdConnector {
    type Connection = FirebirdConnection;

    async fn connect(&self, config: &ConnectionConfig) -> Result<FirebirdConnection> {
        let conn = tokio::task::block_in_place(|| {
            rsfbclient::builder_pure_rust()
                .host(&config.data_source)
                .port(config.port)
                .db_name(&config.database)
                .user(&config.user)
                .pass(&config.password)
                .connect()
        })
        .map_err(db_err)?;

        info!("Connected to Firebird: {}", config.server_path());
        Ok(FirebirdConnection { conn: conn.into() })
    }

    async fn create_database(
        &self,
        config: &ConnectionConfig,
        page_size: u32,
    ) -> Result<FirebirdConnection> {
        let conn = tokio::task::block_in_place(|| {
            rsfbclient::builder_pure_rust()
                .host(&config.data_source)
                .port(config.port)
                .db_name(&config.database)
                .user(&config.user)
                .pass(&config.password)
                .page_size(page_size)
                .create_database()
        })
        .map_err(db_err)?;

        info!(
            "Created Firebird database: {} (page size {})",
            config.server_path(),
            page_size
        );
        Ok(FirebirdConnection { conn: conn.into() })
    }

    async fn close(&self, connection: FirebirdConnection) -> Result<()> {
        tokio::task::block_in_place(|| connection.conn.close()).map_err(db_err)?;
        debug!("Firebird connection closed");
        Ok(())
    }

    fn db_type(&self) -> &str {
        "firebird"
    }
}

/// An open Firebird attachment.
pub struct FirebirdConnection {
    conn: SimpleConnection,
}

impl FirebirdConnection {
    fn query<P, R>(&mut self, sql: &str, params: P) -> Result<Vec<R>>
    where
        P: rsfbclient::IntoParams,
        R: rsfbclient::FromRow + 'static,
    {
        tokio::task::block_in_place(|| self.conn.query(sql, params)).map_err(db_err)
    }
}

#[async_trait(?Send)]
impl ScriptTarget for FirebirdConnection {
    async fn begin_transaction(&mut self) -> Result<()> {
        tokio::task::block_in_place(|| self.conn.begin_transaction()).map_err(db_err)
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        let affected = tokio::task::block_in_place(|| self.conn.execute(sql, ())).map_err(db_err)?;
        debug!("{} rows affected", affected);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        tokio::task::block_in_place(|| self.conn.commit()).map_err(db_err)
    }

    async fn rollback(&mut self) -> Result<()> {
        tokio::task::block_in_place(|| self.conn.rollback()).map_err(db_err)
    }
}

#[async_trait(?Send)]
impl CatalogSource for FirebirdConnection {
    async fn load_domains(&mut self) -> Result<Vec<DomainDescriptor>> {
        let rows: Vec<DomainRow> = self.query(DOMAINS_QUERY, ())?;
        debug!("Loaded {} domains", rows.len());
        Ok(rows.into_iter().map(domain_from_row).collect())
    }

    async fn load_tables(&mut self) -> Result<Vec<TableDescriptor>> {
        let rows: Vec<(String,)> = self.query(TABLES_QUERY, ())?;
        debug!("Loaded {} tables", rows.len());
        Ok(rows.into_iter().map(table_from_row).collect())
    }

    async fn load_columns(&mut self, table: &mut TableDescriptor) -> Result<()> {
        let rows: Vec<ColumnRow> = self.query(COLUMNS_QUERY, (table.name.clone(),))?;
        table.columns = rows.into_iter().map(column_from_row).collect();
        Ok(())
    }

    async fn load_procedures(&mut self) -> Result<Vec<ProcedureDescriptor>> {
        let rows: Vec<ProcedureRow> = self.query(PROCEDURES_QUERY, ())?;
        debug!("Loaded {} procedures", rows.len());
        Ok(rows.into_iter().map(procedure_from_row).collect())
    }

    async fn load_procedure_parameters(
        &mut self,
        procedure: &str,
    ) -> Result<Vec<ParameterDescriptor>> {
        let rows: Vec<ParameterRow> = self.query(PARAMETERS_QUERY, (procedure.to_string(),))?;
        Ok(rows.into_iter().map(parameter_from_row).collect())
    }
}
