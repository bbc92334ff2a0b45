//! CLI command handlers.

pub mod config;
pub mod soak;

use std::path::PathBuf;

use warden_config::WardenConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration.
    pub config: WardenConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}
