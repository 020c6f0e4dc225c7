//! DDL reconstruction from the system catalog.
//!
//! Runs three passes against a [`CatalogSource`] (domains, tables with their
//! columns, procedures) and writes one `CREATE` statement per object. Every
//! statement is followed by a line holding only the terminator, so the output
//! can be fed back through the line-anchored splitter unchanged, procedure
//! bodies included.
//!
//! Triggers, indexes, constraints, views, and generators are not exported.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::core::schema::{DomainDescriptor, ParameterDescriptor, ProcedureDescriptor, TableDescriptor};
use crate::core::traits::CatalogSource;
use crate::error::{MetaError, Result};

/// Object counts written by one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlReport {
    pub output: PathBuf,
    pub domains: usize,
    pub tables: usize,
    pub columns: usize,
    pub procedures: usize,
}

impl DdlReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Renders catalog descriptors as DDL text.
#[derive(Debug, Clone, Copy)]
pub struct DdlReconstructor {
    terminator: char,
}

impl Default for DdlReconstructor {
    fn default() -> Self {
        Self::new(';')
    }
}

impl DdlReconstructor {
    pub fn new(terminator: char) -> Self {
        Self { terminator }
    }

    /// Write the full DDL of `catalog` to `output`.
    ///
    /// The output file is created before any catalog query runs. A catalog
    /// error aborts the extraction; the partially written file is left as is.
    pub async fn extract<C: CatalogSource>(&self, catalog: &mut C, output: &Path) -> Result<DdlReport> {
        let file = tokio::fs::File::create(output)
            .await
            .map_err(|e| MetaError::io(output, e))?;
        let mut writer = DdlWriter {
            inner: BufWriter::new(file),
            path: output,
        };
        let mut report = DdlReport {
            output: output.to_path_buf(),
            ..Default::default()
        };

        writer
            .write(&format!(
                "/* Generated by db-meta-tool {} at {} */\n\n",
                env!("CARGO_PKG_VERSION"),
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ))
            .await?;

        // Pass 1: domains
        info!("Extracting domains");
        writer.write(&banner("DOMAINS")).await?;
        let domains = catalog
            .load_domains()
            .await
            .map_err(|e| extraction_error(output, e))?;
        for domain in &domains {
            debug!("Domain: {}", domain.name);
            writer.write(&self.terminate(&render_domain(domain))).await?;
        }
        report.domains = domains.len();

        // Pass 2: tables and columns
        info!("Extracting tables");
        writer.write(&banner("TABLES")).await?;
        let mut tables = catalog
            .load_tables()
            .await
            .map_err(|e| extraction_error(output, e))?;
        for table in &mut tables {
            catalog
                .load_columns(table)
                .await
                .map_err(|e| extraction_error(output, e))?;
            table.sort_columns();
            debug!("Table: {} ({} columns)", table.name, table.columns.len());
            writer.write(&self.terminate(&render_table(table))).await?;
            report.columns += table.columns.len();
        }
        report.tables = tables.len();

        // Pass 3: procedures
        info!("Extracting procedures");
        writer.write(&banner("PROCEDURES")).await?;
        let mut procedures = catalog
            .load_procedures()
            .await
            .map_err(|e| extraction_error(output, e))?;
        for procedure in &mut procedures {
            let params = catalog
                .load_procedure_parameters(&procedure.name)
                .await
                .map_err(|e| extraction_error(output, e))?;
            procedure.set_parameters(params);
            debug!("Procedure: {}", procedure.name);
            writer.write(&self.terminate(&render_procedure(procedure))).await?;
        }
        report.procedures = procedures.len();

        writer.finish().await?;

        info!(
            "Wrote {}: {} domains, {} tables ({} columns), {} procedures",
            output.display(),
            report.domains,
            report.tables,
            report.columns,
            report.procedures
        );
        Ok(report)
    }

    fn terminate(&self, statement: &str) -> String {
        format!("{}\n{}\n\n", statement, self.terminator)
    }
}

struct DdlWriter<'a> {
    inner: BufWriter<tokio::fs::File>,
    path: &'a Path,
}

impl DdlWriter<'_> {
    async fn write(&mut self, text: &str) -> Result<()> {
        self.inner
            .write_all(text.as_bytes())
            .await
            .map_err(|e| MetaError::io(self.path, e))
    }

    async fn finish(mut self) -> Result<()> {
        self.inner
            .flush()
            .await
            .map_err(|e| MetaError::io(self.path, e))
    }
}

fn banner(section: &str) -> String {
    format!("/* ==================== {} ==================== */\n\n", section)
}

fn extraction_error(output: &Path, err: MetaError) -> MetaError {
    let message = match err {
        MetaError::Database(msg) => msg,
        other => other.to_string(),
    };
    MetaError::Extraction {
        file: output.to_path_buf(),
        message,
    }
}

/// `CREATE DOMAIN <name> AS <type> [default] [NOT NULL] [check]`
pub fn render_domain(domain: &DomainDescriptor) -> String {
    let mut ddl = format!(
        "CREATE DOMAIN {} AS {}",
        quote_identifier(&domain.name),
        domain.field.sql_type()
    );
    if let Some(default) = source_text(&domain.default_source) {
        ddl.push(' ');
        ddl.push_str(default);
    }
    if domain.not_null {
        ddl.push_str(" NOT NULL");
    }
    if let Some(check) = source_text(&domain.check_source) {
        ddl.push(' ');
        ddl.push_str(check);
    }
    ddl
}

/// `CREATE TABLE <name> (` one column per line `)`
pub fn render_table(table: &TableDescriptor) -> String {
    let col_defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let column_type = match c.domain {
                Some(ref domain) => quote_identifier(domain),
                None => c.field.sql_type(),
            };
            let mut def = format!("{} {}", quote_identifier(&c.name), column_type);
            if let Some(default) = source_text(&c.default_source) {
                def.push(' ');
                def.push_str(default);
            }
            if c.not_null {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_identifier(&table.name),
        col_defs.join(",\n    ")
    )
}

/// `CREATE PROCEDURE <name> [(inputs)] [RETURNS (outputs)] AS <body>`
pub fn render_procedure(procedure: &ProcedureDescriptor) -> String {
    let mut ddl = format!("CREATE PROCEDURE {}", quote_identifier(&procedure.name));
    if !procedure.inputs.is_empty() {
        ddl.push_str(&format!(" ({})", render_parameters(&procedure.inputs)));
    }
    if !procedure.outputs.is_empty() {
        ddl.push_str(&format!("\nRETURNS ({})", render_parameters(&procedure.outputs)));
    }
    ddl.push_str("\nAS");
    match source_text(&procedure.source) {
        Some(body) => {
            ddl.push('\n');
            ddl.push_str(body);
        }
        None => ddl.push_str("\nBEGIN\nEND"),
    }
    ddl
}

fn render_parameters(params: &[ParameterDescriptor]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", quote_identifier(&p.name), p.field.sql_type()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn source_text(source: &Option<String>) -> Option<&str> {
    source.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Quote an identifier unless it is a plain upper-case dialect 3 name.
pub fn quote_identifier(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !is_reserved_word(name);

    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_reserved_word(word: &str) -> bool {
    const RESERVED: &[&str] = &[
        "ADD", "ALL", "ALTER", "AND", "AS", "BEGIN", "BY", "CHECK", "COLUMN", "CREATE",
        "CURRENT", "DATE", "DEFAULT", "DELETE", "DISTINCT", "DROP", "END", "FOR", "FROM",
        "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INSERT", "INTO", "IS", "JOIN", "KEY",
        "NOT", "NULL", "OF", "ON", "OR", "ORDER", "POSITION", "PRIMARY", "SELECT", "SET",
        "TABLE", "TIME", "TIMESTAMP", "TO", "UNION", "UPDATE", "USER", "VALUE", "VALUES",
        "WHERE", "WITH",
    ];
    RESERVED.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDescriptor, FieldSpec, ParameterDirection};
    use crate::script::StatementSplitter;
    use async_trait::async_trait;

    fn field(field_type: i16, length: Option<i32>, scale: Option<i32>) -> FieldSpec {
        FieldSpec {
            field_type,
            length,
            precision: None,
            scale,
        }
    }

    /// In-memory catalog: one domain, one table, one procedure.
    struct MemoryCatalog {
        domains: Vec<DomainDescriptor>,
        tables: Vec<TableDescriptor>,
        procedures: Vec<ProcedureDescriptor>,
        params: Vec<(String, ParameterDescriptor)>,
        fail_on_tables: bool,
    }

    impl MemoryCatalog {
        fn sample() -> Self {
            let mut orders = TableDescriptor::new("ORDERS");
            orders.columns = vec![
                ColumnDescriptor {
                    name: "STATUS".to_string(),
                    field: field(37, Some(20), None),
                    domain: None,
                    not_null: true,
                    default_source: Some("DEFAULT 'NEW'".to_string()),
                    position: 1,
                },
                ColumnDescriptor {
                    name: "NOTE".to_string(),
                    field: field(37, Some(200), None),
                    domain: None,
                    not_null: false,
                    default_source: None,
                    position: 0,
                },
            ];

            Self {
                domains: vec![DomainDescriptor {
                    name: "D_AMOUNT".to_string(),
                    field: field(16, None, Some(-2)),
                    not_null: true,
                    default_source: Some("DEFAULT 0".to_string()),
                    check_source: Some("CHECK (VALUE >= 0)".to_string()),
                }],
                tables: vec![orders],
                procedures: vec![ProcedureDescriptor::new(
                    "ORDER_COUNT",
                    Some("BEGIN\n  SELECT COUNT(*) FROM ORDERS INTO :CNT;\n  SUSPEND;\nEND".to_string()),
                )],
                params: vec![(
                    "ORDER_COUNT".to_string(),
                    ParameterDescriptor {
                        name: "CNT".to_string(),
                        direction: ParameterDirection::Output,
                        field: field(8, None, None),
                        position: 0,
                    },
                )],
                fail_on_tables: false,
            }
        }
    }

    #[async_trait(?Send)]
    impl CatalogSource for MemoryCatalog {
        async fn load_domains(&mut self) -> Result<Vec<DomainDescriptor>> {
            Ok(self.domains.clone())
        }

        async fn load_tables(&mut self) -> Result<Vec<TableDescriptor>> {
            if self.fail_on_tables {
                return Err(MetaError::Database("lock conflict".to_string()));
            }
            Ok(self
                .tables
                .iter()
                .map(|t| TableDescriptor::new(t.name.clone()))
                .collect())
        }

        async fn load_columns(&mut self, table: &mut TableDescriptor) -> Result<()> {
            if let Some(source) = self.tables.iter().find(|t| t.name == table.name) {
                table.columns = source.columns.clone();
            }
            Ok(())
        }

        async fn load_procedures(&mut self) -> Result<Vec<ProcedureDescriptor>> {
            Ok(self.procedures.clone())
        }

        async fn load_procedure_parameters(
            &mut self,
            procedure: &str,
        ) -> Result<Vec<ParameterDescriptor>> {
            Ok(self
                .params
                .iter()
                .filter(|(name, _)| name == procedure)
                .map(|(_, p)| p.clone())
                .collect())
        }
    }

    #[test]
    fn test_render_domain() {
        let catalog = MemoryCatalog::sample();
        assert_eq!(
            render_domain(&catalog.domains[0]),
            "CREATE DOMAIN D_AMOUNT AS NUMERIC(18,2) DEFAULT 0 NOT NULL CHECK (VALUE >= 0)"
        );
    }

    #[test]
    fn test_render_domain_minimal() {
        let domain = DomainDescriptor {
            name: "D_FLAG".to_string(),
            field: field(7, None, None),
            not_null: false,
            default_source: Some("  ".to_string()),
            check_source: None,
        };
        assert_eq!(render_domain(&domain), "CREATE DOMAIN D_FLAG AS SMALLINT");
    }

    #[test]
    fn test_render_table() {
        let mut table = MemoryCatalog::sample().tables.remove(0);
        table.sort_columns();
        assert_eq!(
            render_table(&table),
            "CREATE TABLE ORDERS (\n    NOTE VARCHAR(200),\n    STATUS VARCHAR(20) DEFAULT 'NEW' NOT NULL\n)"
        );
    }

    #[test]
    fn test_render_table_uses_domain_name() {
        let mut table = TableDescriptor::new("ACCOUNTS");
        table.columns = vec![ColumnDescriptor {
            name: "ID".to_string(),
            field: field(8, None, None),
            domain: Some("D_ID".to_string()),
            not_null: true,
            default_source: Some("DEFAULT 0".to_string()),
            position: 0,
        }];
        assert_eq!(
            render_table(&table),
            "CREATE TABLE ACCOUNTS (\n    ID D_ID DEFAULT 0 NOT NULL\n)"
        );
    }

    #[test]
    fn test_render_procedure_with_parameters() {
        let mut procedure = ProcedureDescriptor::new("ADD_ONE", Some("BEGIN\n  R = X + 1;\nEND".to_string()));
        procedure.set_parameters(vec![
            ParameterDescriptor {
                name: "X".to_string(),
                direction: ParameterDirection::Input,
                field: field(8, None, None),
                position: 0,
            },
            ParameterDescriptor {
                name: "R".to_string(),
                direction: ParameterDirection::Output,
                field: field(8, None, None),
                position: 0,
            },
        ]);
        assert_eq!(
            render_procedure(&procedure),
            "CREATE PROCEDURE ADD_ONE (X INTEGER)\nRETURNS (R INTEGER)\nAS\nBEGIN\n  R = X + 1;\nEND"
        );
    }

    #[test]
    fn test_render_procedure_without_source() {
        let procedure = ProcedureDescriptor::new("EMPTY_PROC", None);
        assert_eq!(render_procedure(&procedure), "CREATE PROCEDURE EMPTY_PROC\nAS\nBEGIN\nEND");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("ORDERS"), "ORDERS");
        assert_eq!(quote_identifier("RDB$X_1"), "RDB$X_1");
        assert_eq!(quote_identifier("MixedCase"), "\"MixedCase\"");
        assert_eq!(quote_identifier("ORDER"), "\"ORDER\"");
        assert_eq!(quote_identifier("1ST"), "\"1ST\"");
        assert_eq!(quote_identifier("A\"B"), "\"A\"\"B\"");
    }

    #[tokio::test]
    async fn test_extract_writes_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ddl.txt");
        let mut catalog = MemoryCatalog::sample();

        let report = DdlReconstructor::default()
            .extract(&mut catalog, &output)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.matches("CREATE DOMAIN").count(), 1);
        assert_eq!(text.matches("CREATE TABLE").count(), 1);
        assert_eq!(text.matches("CREATE PROCEDURE").count(), 1);
        assert!(text.contains("NOTE VARCHAR(200),\n    STATUS VARCHAR(20) DEFAULT 'NEW' NOT NULL"));

        let domain_at = text.find("CREATE DOMAIN").unwrap();
        let table_at = text.find("CREATE TABLE").unwrap();
        let proc_at = text.find("CREATE PROCEDURE").unwrap();
        assert!(domain_at < table_at && table_at < proc_at);
        assert!(text.find("DOMAINS ===").unwrap() < domain_at);
        assert!(text.find("PROCEDURES ===").unwrap() < proc_at);

        assert_eq!(
            report,
            DdlReport {
                output: output.clone(),
                domains: 1,
                tables: 1,
                columns: 2,
                procedures: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_extract_output_splits_back_into_statements() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ddl.txt");
        let mut catalog = MemoryCatalog::sample();

        DdlReconstructor::default()
            .extract(&mut catalog, &output)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let statements = StatementSplitter::default().split(&text);
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE DOMAIN D_AMOUNT"));
        assert!(statements[1].starts_with("CREATE TABLE ORDERS"));
        assert!(statements[2].starts_with("CREATE PROCEDURE ORDER_COUNT\nRETURNS (CNT INTEGER)"));
        assert!(statements[2].ends_with("SUSPEND;\nEND"));
    }

    #[tokio::test]
    async fn test_extract_catalog_error_names_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ddl.txt");
        let mut catalog = MemoryCatalog::sample();
        catalog.fail_on_tables = true;

        let err = DdlReconstructor::default()
            .extract(&mut catalog, &output)
            .await
            .unwrap_err();

        match err {
            MetaError::Extraction { file, message } => {
                assert_eq!(file, output);
                assert_eq!(message, "lock conflict");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_extract_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("ddl.txt");
        let mut catalog = MemoryCatalog::sample();

        let err = DdlReconstructor::default()
            .extract(&mut catalog, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MetaError::Io { .. }));
    }
}
