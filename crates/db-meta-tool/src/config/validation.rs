//! Configuration validation.

use super::Config;
use crate::error::{MetaError, Result};

/// Page sizes accepted by Firebird 3 and later.
const PAGE_SIZES: [u32; 4] = [4096, 8192, 16384, 32768];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Connection validation
    if config.connection.data_source.is_empty() {
        return Err(MetaError::Config("connection.data_source is required".into()));
    }
    if config.connection.user.is_empty() {
        return Err(MetaError::Config("connection.user is required".into()));
    }
    if config.connection.port == 0 {
        return Err(MetaError::Config("connection.port must be non-zero".into()));
    }

    // Build validation
    if !is_plain_file_name(&config.build.db_file_name) {
        return Err(MetaError::Config(format!(
            "build.db_file_name must be a plain file name, got '{}'",
            config.build.db_file_name
        )));
    }

    if !PAGE_SIZES.contains(&config.build.page_size) {
        return Err(MetaError::Config(format!(
            "build.page_size must be one of {:?}, got {}",
            PAGE_SIZES, config.build.page_size
        )));
    }

    // Scripts validation
    let extension = config.scripts.extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(MetaError::Config("scripts.extension is required".into()));
    }
    if config.scripts.terminator.is_whitespace() {
        return Err(MetaError::Config(
            "scripts.terminator must not be whitespace".into(),
        ));
    }

    // Export validation
    if !is_plain_file_name(&config.export.output_file_name) {
        return Err(MetaError::Config(format!(
            "export.output_file_name must be a plain file name, got '{}'",
            config.export.output_file_name
        )));
    }

    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
