//! Verb orchestrator - dispatch targets for `build-db`, `export-scripts`,
//! and `update-db`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{Config, ConnectionConfig};
use crate::core::traits::{close_after, Connector};
use crate::error::{MetaError, Result};
use crate::export::{ExportReport, Exporter};
use crate::script::{RunSummary, ScriptRunner};
use crate::service::BackupService;

/// Result of `build-db`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Path of the created database file.
    pub database: PathBuf,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl BuildReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs one verb per call against a connector and a backup service.
pub struct Orchestrator<K, S> {
    config: Config,
    connector: K,
    service: S,
}

#[cfg(feature = "firebird")]
impl Orchestrator<crate::drivers::FirebirdConnector, crate::service::GbakService> {
    /// Orchestrator wired to Firebird and the configured `gbak`.
    pub fn firebird(config: Config) -> Self {
        let service = crate::service::GbakService::new(config.export.gbak_path.clone());
        Self::new(config, crate::drivers::FirebirdConnector::new(), service)
    }
}

impl<K: Connector, S: BackupService> Orchestrator<K, S> {
    pub fn new(config: Config, connector: K, service: S) -> Self {
        Self {
            config,
            connector,
            service,
        }
    }

    /// Create a database in `db_dir` and apply every script in `scripts_dir`.
    ///
    /// On any failure the whole `db_dir` is removed.
    pub async fn build_database(&self, db_dir: &Path, scripts_dir: &Path) -> Result<BuildReport> {
        info!(
            "Building {} database in {} from {}",
            self.connector.db_type(),
            db_dir.display(),
            scripts_dir.display()
        );

        let result = self.try_build(db_dir, scripts_dir).await;
        if let Err(ref e) = result {
            error!("Build failed: {}", e);
            remove_db_dir(db_dir).await;
        }
        result
    }

    async fn try_build(&self, db_dir: &Path, scripts_dir: &Path) -> Result<BuildReport> {
        let runner = ScriptRunner::new(&self.config.scripts);
        let files = runner.discover(scripts_dir).await?;

        tokio::fs::create_dir_all(db_dir)
            .await
            .map_err(|e| MetaError::io(db_dir, e))?;
        let db_dir = tokio::fs::canonicalize(db_dir)
            .await
            .map_err(|e| MetaError::io(db_dir, e))?;
        let database = db_dir.join(&self.config.build.db_file_name);

        match tokio::fs::remove_file(&database).await {
            Ok(()) => info!("Replaced existing database file {}", database.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MetaError::io(&database, e)),
        }

        let conn_config =
            ConnectionConfig::for_database(&self.config.connection, database.display().to_string());
        let mut conn = self
            .connector
            .create_database(&conn_config, self.config.build.page_size)
            .await?;
        let result = runner.run_files(&mut conn, &files).await;
        let summary = close_after(&self.connector, conn, result).await?;

        info!(
            "Database built: {} files, {} statements",
            summary.files.len(),
            summary.total_statements
        );
        Ok(BuildReport { database, summary })
    }

    /// Write the full DDL of the database named by `conn_str` into `output_dir`.
    pub async fn export_scripts(&self, conn_str: &str, output_dir: &Path) -> Result<ExportReport> {
        let source = self.config.connection(conn_str)?;
        let exporter = Exporter::new(self.config.export.clone(), self.config.scripts.terminator);
        exporter
            .export_all(&self.connector, &self.service, &source, output_dir)
            .await
    }

    /// Incremental migration is not supported.
    pub async fn update_database(&self, _conn_str: &str, _scripts_dir: &Path) -> Result<()> {
        Err(MetaError::NotImplemented("update-db"))
    }
}

async fn remove_db_dir(db_dir: &Path) {
    match tokio::fs::remove_dir_all(db_dir).await {
        Ok(()) => info!("Removed {}", db_dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", db_dir.display(), e),
    }
}
