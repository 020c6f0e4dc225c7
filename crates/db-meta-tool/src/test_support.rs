//! In-memory database used by unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::core::schema::{
    ColumnDescriptor, DomainDescriptor, FieldSpec, ParameterDescriptor, ProcedureDescriptor,
    TableDescriptor,
};
use crate::core::traits::{CatalogSource, Connector, ScriptTarget};
use crate::error::{MetaError, Result};

/// Catalog contents served by [`MemoryConnection`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    pub domains: Vec<DomainDescriptor>,
    pub tables: Vec<TableDescriptor>,
    pub procedures: Vec<ProcedureDescriptor>,
}

impl MemoryDatabase {
    /// One domain, one two-column table, no procedures.
    pub fn sample() -> Self {
        let mut customers = TableDescriptor::new("CUSTOMERS");
        customers.columns = vec![
            ColumnDescriptor {
                name: "ID".to_string(),
                field: FieldSpec {
                    field_type: 8,
                    ..Default::default()
                },
                domain: None,
                not_null: true,
                default_source: None,
                position: 0,
            },
            ColumnDescriptor {
                name: "NAME".to_string(),
                field: FieldSpec {
                    field_type: 37,
                    length: Some(80),
                    ..Default::default()
                },
                domain: None,
                not_null: false,
                default_source: None,
                position: 1,
            },
        ];

        Self {
            domains: vec![DomainDescriptor {
                name: "D_ID".to_string(),
                field: FieldSpec {
                    field_type: 8,
                    ..Default::default()
                },
                not_null: true,
                default_source: None,
                check_source: None,
            }],
            tables: vec![customers],
            procedures: Vec::new(),
        }
    }
}

/// Connector handing out [`MemoryConnection`]s that share one commit log.
#[derive(Default)]
pub struct MemoryConnector {
    pub database: MemoryDatabase,
    pub refuse_connect: bool,
    /// Statements containing this text fail.
    pub fail_marker: Option<String>,
    pub committed: Rc<RefCell<Vec<String>>>,
    /// Database path and page size of every created database.
    pub created: RefCell<Vec<(String, u32)>>,
    pub closed: Cell<usize>,
}

impl MemoryConnector {
    pub fn with_database(database: MemoryDatabase) -> Self {
        Self {
            database,
            ..Default::default()
        }
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }

    fn open(&self) -> MemoryConnection {
        MemoryConnection {
            database: self.database.clone(),
            fail_marker: self.fail_marker.clone(),
            pending: Vec::new(),
            committed: Rc::clone(&self.committed),
        }
    }
}

#[async_trait(?Send)]
impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self, _config: &ConnectionConfig) -> Result<MemoryConnection> {
        if self.refuse_connect {
            return Err(MetaError::Database("connection refused".to_string()));
        }
        Ok(self.open())
    }

    async fn create_database(
        &self,
        config: &ConnectionConfig,
        page_size: u32,
    ) -> Result<MemoryConnection> {
        if self.refuse_connect {
            return Err(MetaError::Database("connection refused".to_string()));
        }
        if std::path::Path::new(&config.database).exists() {
            return Err(MetaError::Database(format!(
                "I/O error during \"open O_CREAT\" operation for file \"{}\"",
                config.database
            )));
        }
        std::fs::write(&config.database, b"").map_err(|e| MetaError::io(&config.database, e))?;
        self.created
            .borrow_mut()
            .push((config.database.clone(), page_size));
        Ok(self.open())
    }

    async fn close(&self, _connection: MemoryConnection) -> Result<()> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}

pub struct MemoryConnection {
    database: MemoryDatabase,
    fail_marker: Option<String>,
    pending: Vec<String>,
    committed: Rc<RefCell<Vec<String>>>,
}

#[async_trait(?Send)]
impl ScriptTarget for MemoryConnection {
    async fn begin_transaction(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        if self.fail_marker.as_deref().is_some_and(|m| sql.contains(m)) {
            return Err(MetaError::Database(format!("failed: {}", sql)));
        }
        self.pending.push(sql.to_string());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.committed.borrow_mut().append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }
}

#[async_trait(?Send)]
impl CatalogSource for MemoryConnection {
    async fn load_domains(&mut self) -> Result<Vec<DomainDescriptor>> {
        Ok(self.database.domains.clone())
    }

    async fn load_tables(&mut self) -> Result<Vec<TableDescriptor>> {
        Ok(self
            .database
            .tables
            .iter()
            .map(|t| TableDescriptor::new(t.name.clone()))
            .collect())
    }

    async fn load_columns(&mut self, table: &mut TableDescriptor) -> Result<()> {
        if let Some(source) = self.database.tables.iter().find(|t| t.name == table.name) {
            table.columns = source.columns.clone();
        }
        Ok(())
    }

    async fn load_procedures(&mut self) -> Result<Vec<ProcedureDescriptor>> {
        Ok(self.database.procedures.clone())
    }

    async fn load_procedure_parameters(
        &mut self,
        _procedure: &str,
    ) -> Result<Vec<ParameterDescriptor>> {
        Ok(Vec::new())
    }
}
