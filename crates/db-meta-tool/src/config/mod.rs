//! Configuration loading and validation.

mod connection;
mod types;
mod validation;

pub use connection::ConnectionConfig;
pub use types::*;

use crate::error::{MetaError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MetaError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Parse a connection string against this configuration's defaults.
    pub fn connection(&self, conn_str: &str) -> Result<ConnectionConfig> {
        ConnectionConfig::parse(conn_str, &self.connection)
    }
}
