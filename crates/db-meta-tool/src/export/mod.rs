//! Full-schema DDL export.
//!
//! Two strategies produce the output file:
//!
//! - [`ExportStrategy::Catalog`]: connect and run the [`DdlReconstructor`].
//! - [`ExportStrategy::Native`]: back up the source to a temporary artifact,
//!   then restore only its metadata into the output path.
//!
//! The output directory is created before either strategy runs. The native
//! strategy replaces an existing output file and removes its artifact on
//! every exit path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConnectionConfig, ExportConfig, ExportStrategy};
use crate::core::traits::{close_after, Connector};
use crate::ddl::{DdlReconstructor, DdlReport};
use crate::error::{MetaError, Result};
use crate::service::BackupService;

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub strategy: ExportStrategy,
    pub output: PathBuf,
    /// Object counts, present for the catalog strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ddl: Option<DdlReport>,
}

impl ExportReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes the full DDL of a database into an output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
    reconstructor: DdlReconstructor,
}

impl Exporter {
    pub fn new(config: ExportConfig, terminator: char) -> Self {
        Self {
            config,
            reconstructor: DdlReconstructor::new(terminator),
        }
    }

    /// Export `source` into `output_dir` using the configured strategy.
    pub async fn export_all<K, S>(
        &self,
        connector: &K,
        service: &S,
        source: &ConnectionConfig,
        output_dir: &Path,
    ) -> Result<ExportReport>
    where
        K: Connector,
        S: BackupService,
    {
        let output = self.prepare_output(output_dir).await?;
        info!(
            "Exporting {} to {} ({:?} strategy)",
            source.database,
            output.display(),
            self.config.strategy
        );

        match self.config.strategy {
            ExportStrategy::Catalog => {
                let report = self.export_catalog(connector, source, &output).await?;
                Ok(ExportReport {
                    strategy: ExportStrategy::Catalog,
                    output,
                    ddl: Some(report),
                })
            }
            ExportStrategy::Native => {
                self.export_native(service, source, &output).await?;
                Ok(ExportReport {
                    strategy: ExportStrategy::Native,
                    output,
                    ddl: None,
                })
            }
        }
    }

    /// Create `output_dir` if needed and return the output file path.
    async fn prepare_output(&self, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| MetaError::io(output_dir, e))?;
        let dir = tokio::fs::canonicalize(output_dir)
            .await
            .map_err(|e| MetaError::io(output_dir, e))?;
        Ok(dir.join(&self.config.output_file_name))
    }

    async fn export_catalog<K: Connector>(
        &self,
        connector: &K,
        source: &ConnectionConfig,
        output: &Path,
    ) -> Result<DdlReport> {
        let mut conn = connector.connect(source).await?;
        let result = self.reconstructor.extract(&mut conn, output).await;
        close_after(connector, conn, result).await
    }

    async fn export_native<S: BackupService>(
        &self,
        service: &S,
        source: &ConnectionConfig,
        output: &Path,
    ) -> Result<()> {
        // A metadata-only restore will not create over an existing file.
        match tokio::fs::remove_file(output).await {
            Ok(()) => info!("Replaced existing {}", output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MetaError::io(output, e)),
        }

        let artifact = self
            .config
            .artifact_dir()
            .join(format!("{}.fbk", Uuid::new_v4()));
        debug!("Temporary backup artifact: {}", artifact.display());

        let result = self.backup_and_restore(service, source, &artifact, output).await;
        remove_artifact(&artifact).await;
        result
    }

    async fn backup_and_restore<S: BackupService>(
        &self,
        service: &S,
        source: &ConnectionConfig,
        artifact: &Path,
        output: &Path,
    ) -> Result<()> {
        service
            .backup(source, artifact)
            .await
            .map_err(|e| as_backup_restore(output, e))?;

        let destination = ConnectionConfig {
            database: output.display().to_string(),
            ..source.clone()
        };
        service
            .restore_metadata_only(artifact, &destination)
            .await
            .map_err(|e| as_backup_restore(output, e))
    }
}

async fn remove_artifact(artifact: &Path) {
    match tokio::fs::remove_file(artifact).await {
        Ok(()) => debug!("Removed {}", artifact.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", artifact.display(), e),
    }
}

/// Report a service failure against the output file.
fn as_backup_restore(output: &Path, err: MetaError) -> MetaError {
    match err {
        MetaError::BackupRestoreFailed { message, .. } | MetaError::Database(message) => {
            MetaError::backup_restore(output, message)
        }
        other => MetaError::backup_restore(output, other),
    }
}
