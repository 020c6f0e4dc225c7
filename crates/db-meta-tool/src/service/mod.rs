//! Backup and restore service jobs.
//!
//! The native export strategy drives the server's backup utility (`gbak`)
//! through the [`BackupService`] trait. Each run is one [`ServiceJob`]; the
//! spawned child is killed if its handle is dropped before it exits.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{MetaError, Result};

/// Backup and metadata-only restore.
#[async_trait(?Send)]
pub trait BackupService {
    /// Back up the database behind `source` into `artifact`.
    async fn backup(&self, source: &ConnectionConfig, artifact: &Path) -> Result<()>;

    /// Restore only the metadata of `artifact` into `destination.database`.
    async fn restore_metadata_only(
        &self,
        artifact: &Path,
        destination: &ConnectionConfig,
    ) -> Result<()>;
}

/// A single invocation of the backup utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceJob {
    Backup {
        source: ConnectionConfig,
        artifact: PathBuf,
    },
    Restore {
        artifact: PathBuf,
        destination: ConnectionConfig,
    },
}

impl ServiceJob {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceJob::Backup { .. } => "backup",
            ServiceJob::Restore { .. } => "restore",
        }
    }

    /// File the job is about, used in error reports.
    pub fn file(&self) -> &Path {
        match self {
            ServiceJob::Backup { artifact, .. } => artifact,
            ServiceJob::Restore { artifact, .. } => artifact,
        }
    }

    /// Command-line arguments for `gbak`.
    pub fn args(&self) -> Vec<String> {
        match self {
            ServiceJob::Backup { source, artifact } => vec![
                "-b".to_string(),
                "-v".to_string(),
                "-user".to_string(),
                source.user.clone(),
                "-password".to_string(),
                source.password.clone(),
                source.server_path(),
                artifact.display().to_string(),
            ],
            ServiceJob::Restore {
                artifact,
                destination,
            } => vec![
                "-c".to_string(),
                "-m".to_string(),
                "-v".to_string(),
                "-user".to_string(),
                destination.user.clone(),
                "-password".to_string(),
                destination.password.clone(),
                artifact.display().to_string(),
                destination.server_path(),
            ],
        }
    }
}

/// [`BackupService`] backed by the `gbak` executable.
#[derive(Debug, Clone)]
pub struct GbakService {
    program: PathBuf,
}

impl GbakService {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run a job to completion, logging its verbose output.
    pub async fn run(&self, job: &ServiceJob) -> Result<()> {
        info!("Starting {} job ({})", job.name(), job.file().display());

        let output = tokio::process::Command::new(&self.program)
            .args(job.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MetaError::backup_restore(
                    job.file(),
                    format!("failed to start {}: {}", self.program.display(), e),
                )
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("{}: {}", job.name(), line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(MetaError::backup_restore(
                job.file(),
                format!(
                    "{} exited with {}{}{}",
                    job.name(),
                    output.status,
                    if detail.is_empty() { "" } else { ": " },
                    detail
                ),
            ));
        }

        info!("{} job finished", job.name());
        Ok(())
    }
}

#[async_trait(?Send)]
impl BackupService for GbakService {
    async fn backup(&self, source: &ConnectionConfig, artifact: &Path) -> Result<()> {
        self.run(&ServiceJob::Backup {
            source: source.clone(),
            artifact: artifact.to_path_buf(),
        })
        .await
    }

    async fn restore_metadata_only(
        &self,
        artifact: &Path,
        destination: &ConnectionConfig,
    ) -> Result<()> {
        self.run(&ServiceJob::Restore {
            artifact: artifact.to_path_buf(),
            destination: destination.clone(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionDefaults;

    fn conn(database: &str) -> ConnectionConfig {
        ConnectionConfig::for_database(&ConnectionDefaults::default(), database)
    }

    #[test]
    fn test_backup_args() {
        let job = ServiceJob::Backup {
            source: conn("/data/app.fdb"),
            artifact: PathBuf::from("/tmp/x.fbk"),
        };
        assert_eq!(
            job.args(),
            [
                "-b",
                "-v",
                "-user",
                "SYSDBA",
                "-password",
                "masterkey",
                "localhost/3050:/data/app.fdb",
                "/tmp/x.fbk",
            ]
        );
        assert_eq!(job.name(), "backup");
    }

    #[test]
    fn test_restore_args_are_metadata_only() {
        let job = ServiceJob::Restore {
            artifact: PathBuf::from("/tmp/x.fbk"),
            destination: conn("/out/01_FULL_DDL.txt"),
        };
        let args = job.args();
        assert_eq!(&args[..3], ["-c", "-m", "-v"]);
        assert_eq!(args[args.len() - 2], "/tmp/x.fbk");
        assert_eq!(args[args.len() - 1], "localhost/3050:/out/01_FULL_DDL.txt");
        assert_eq!(job.file(), Path::new("/tmp/x.fbk"));
    }

    #[tokio::test]
    async fn test_missing_program_is_backup_restore_error() {
        let service = GbakService::new("/nonexistent/bin/gbak");
        let err = service
            .backup(&conn("/data/app.fdb"), Path::new("/tmp/x.fbk"))
            .await
            .unwrap_err();
        match err {
            MetaError::BackupRestoreFailed { file, message } => {
                assert_eq!(file, PathBuf::from("/tmp/x.fbk"));
                assert!(message.contains("failed to start"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
