//! Connection parameters and connection string parsing.
//!
//! Connection strings use the `Key=Value;Key=Value` form, e.g.
//! `User=SYSDBA;Password=masterkey;Database=/data/app.fdb;DataSource=localhost;Port=3050`.
//! Keys are case-insensitive. Missing keys other than `Database` fall back to
//! [`ConnectionDefaults`].

use std::fmt;

use tracing::debug;

use super::ConnectionDefaults;
use crate::error::{MetaError, Result};

/// Parameters for one database attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host.
    pub data_source: String,
    /// Server port.
    pub port: u16,
    /// Database path as seen by the server.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: String,
}

impl ConnectionConfig {
    /// Connection to `database` using only the defaults.
    pub fn for_database(defaults: &ConnectionDefaults, database: impl Into<String>) -> Self {
        Self {
            data_source: defaults.data_source.clone(),
            port: defaults.port,
            database: database.into(),
            user: defaults.user.clone(),
            password: defaults.password.clone(),
        }
    }

    /// Parse a `Key=Value;` connection string.
    pub fn parse(conn_str: &str, defaults: &ConnectionDefaults) -> Result<Self> {
        let mut config = Self::for_database(defaults, String::new());

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part.split_once('=').ok_or_else(|| {
                MetaError::Config(format!(
                    "Invalid connection string segment '{}': expected Key=Value",
                    part
                ))
            })?;
            let value = value.trim();

            match normalize_key(key).as_str() {
                "user" | "userid" | "username" => config.user = value.to_string(),
                "password" | "pwd" => config.password = value.to_string(),
                "database" | "initialcatalog" => config.database = value.to_string(),
                "datasource" | "server" | "host" => config.data_source = value.to_string(),
                "port" => {
                    config.port = value.parse().map_err(|_| {
                        MetaError::Config(format!("Invalid port in connection string: '{}'", value))
                    })?;
                }
                other => debug!("Ignoring connection string key '{}'", other),
            }
        }

        if config.database.is_empty() {
            return Err(MetaError::Config(
                "Connection string is missing Database".to_string(),
            ));
        }

        Ok(config)
    }

    /// Server-qualified database name in `host/port:path` form.
    pub fn server_path(&self) -> String {
        format!("{}/{}:{}", self.data_source, self.port, self.database)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("data_source", &self.data_source)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
