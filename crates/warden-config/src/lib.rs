//! Configuration system for Warden.
//!
//! Provides TOML-based configuration with:
//! - `[cache]`: capacity and background sweep settings for the session cache
//! - `[logging]`: filter directives and output format for the host's subscriber
//!
//! Configuration is an explicit value handed to constructors; nothing here
//! installs global state.

pub mod error;
pub mod types;

use std::path::Path;

pub use error::{ConfigError, Result};
pub use types::*;

/// Environment variable naming a config file to load.
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Load config from a specific file path and validate it.
pub fn load_config_file(path: &Path) -> Result<WardenConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = WardenConfig::from_toml(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` if given, otherwise fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<WardenConfig> {
    match path {
        Some(path) => load_config_file(path),
        None => Ok(WardenConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "[cache]\nmax_size = 5\ncleanup_period_secs = 60\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.cache.max_size, 5);
        assert_eq!(config.cache.cleanup_period_secs, 60);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_config_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "[cache]\nmax_size = 0\n").unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_defaults() {
        assert_eq!(load_config(None).unwrap(), WardenConfig::default());
    }
}
