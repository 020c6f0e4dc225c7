//! Error types for the metadata tool.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for build and export operations.
#[derive(Error, Debug)]
pub enum MetaError {
    /// Configuration error (invalid YAML, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required directory or file does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The scripts directory contains no matching script files
    #[error("No script files matching *.{extension} in {}", .dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },

    /// A discovered script file has zero length
    #[error("Script file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    /// A statement failed; the file's transaction was rolled back
    #[error("SQL error while executing script '{file}', transaction rolled back: {message}")]
    ScriptExecutionFailed { file: String, message: String },

    /// Database client error outside a script transaction
    #[error("Database error: {0}")]
    Database(String),

    /// Catalog pass failed while reconstructing DDL
    #[error("DDL extraction to {} failed: {message}", .file.display())]
    Extraction { file: PathBuf, message: String },

    /// Backup or metadata restore failed
    #[error("Backup/restore for {} failed: {message}", .file.display())]
    BackupRestoreFailed { file: PathBuf, message: String },

    /// Operation is not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// IO error with the path it happened on
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetaError {
    /// Create an Io error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a ScriptExecutionFailed error
    pub fn script(file: impl Into<String>, message: impl Into<String>) -> Self {
        MetaError::ScriptExecutionFailed {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a BackupRestoreFailed error
    pub fn backup_restore(file: impl Into<PathBuf>, message: impl ToString) -> Self {
        MetaError::BackupRestoreFailed {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for a failed verb.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for metadata tool operations.
pub type Result<T> = std::result::Result<T, MetaError>;
