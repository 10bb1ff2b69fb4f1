//! Configuration file loading.

use std::fs;
use std::io;
use std::path::Path;

use notion_assets_types::{ConfigError, ShimConfig};

/// Load a JSON config file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<ShimConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound { path: path.to_path_buf() },
        _ => ConfigError::Read { path: path.to_path_buf(), source: e },
    })?;
    let config: ShimConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, &e))?;

    config.validate()?;
    Ok(config)
}
