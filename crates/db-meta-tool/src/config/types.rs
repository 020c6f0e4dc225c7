//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Every section is optional in YAML; omitted values fall back to the
/// documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server and credential defaults.
    #[serde(default)]
    pub connection: ConnectionDefaults,

    /// `build-db` settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Script discovery and splitting.
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// `export-scripts` settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Defaults applied to every connection.
///
/// The built-in user and password are the stock Firebird `SYSDBA` account.
/// They are plain configuration values, not managed secrets.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    /// Server host (default: "localhost").
    #[serde(default = "default_data_source")]
    pub data_source: String,

    /// Server port (default: 3050).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username (default: "SYSDBA").
    #[serde(default = "default_user")]
    pub user: String,

    /// Password (default: "masterkey").
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            data_source: default_data_source(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
        }
    }
}

impl fmt::Debug for ConnectionDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDefaults")
            .field("data_source", &self.data_source)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Database creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// File name of the database created inside `--db-dir`.
    #[serde(default = "default_db_file_name")]
    pub db_file_name: String,

    /// Page size in bytes of the created database (default: 8192).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            db_file_name: default_db_file_name(),
            page_size: default_page_size(),
        }
    }
}

/// How script text is cut into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// A boundary is a line holding only the terminator.
    #[default]
    LineAnchored,
    /// Every terminator outside quotes is a boundary.
    ///
    /// Breaks procedure bodies that use the terminator internally.
    Anywhere,
}

/// Script discovery and splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// File extension of script files, without the dot (default: "sql").
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Statement terminator character (default: ';').
    #[serde(default = "default_terminator")]
    pub terminator: char,

    /// Boundary rule (default: line_anchored).
    #[serde(default)]
    pub split_policy: SplitPolicy,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            terminator: default_terminator(),
            split_policy: SplitPolicy::default(),
        }
    }
}

/// Where the exported DDL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    /// Reconstruct DDL from the system catalog.
    #[default]
    Catalog,
    /// Back up to a temporary artifact and restore metadata only into the output.
    Native,
}

/// DDL export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Export strategy (default: catalog).
    #[serde(default)]
    pub strategy: ExportStrategy,

    /// Output file name inside `--output-dir` (default: "01_FULL_DDL.txt").
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,

    /// Path to the gbak executable used by the native strategy.
    #[serde(default = "default_gbak_path")]
    pub gbak_path: PathBuf,

    /// Directory for temporary backup artifacts (default: system temp dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            strategy: ExportStrategy::default(),
            output_file_name: default_output_file_name(),
            gbak_path: default_gbak_path(),
            temp_dir: None,
        }
    }
}

impl ExportConfig {
    /// Directory that receives temporary backup artifacts.
    pub fn artifact_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_data_source() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3050
}

fn default_user() -> String {
    "SYSDBA".to_string()
}

fn default_password() -> String {
    "masterkey".to_string()
}

fn default_db_file_name() -> String {
    "DATABASE.FDB".to_string()
}

fn default_page_size() -> u32 {
    8192
}

fn default_extension() -> String {
    "sql".to_string()
}

fn default_terminator() -> char {
    ';'
}

fn default_output_file_name() -> String {
    "01_FULL_DDL.txt".to_string()
}

fn default_gbak_path() -> PathBuf {
    PathBuf::from("gbak")
}
