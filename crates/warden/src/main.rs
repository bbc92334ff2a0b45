//! Warden - session cache tooling
//!
//! Main entry point for the Warden CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, soak};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Warden - session cache tooling
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (TOML); defaults apply when omitted
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration inspection
    Config(config::ConfigArgs),

    /// Hammer a live cache with concurrent readers and writers
    Soak(soak::SoakArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = warden_config::load_config(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("loading {}", path.display()),
            None => "loading default config".to_string(),
        }
    })?;

    // Initialize tracing: console output, JSON when configured
    let filter = if cli.verbose {
        "warden=debug,warden_session=debug,warden_auth=debug,warden_config=debug,info".to_string()
    } else {
        config.logging.filter.clone()
    };

    use tracing_subscriber::prelude::*;
    let fmt_layer = if config.logging.json {
        tracing_subscriber::fmt::layer().json().with_target(true).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(tracing_subscriber::EnvFilter::new(filter)))
        .init();

    let ctx = commands::Context {
        config,
        config_path: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Soak(args) => soak::run(args, &ctx).await,
    }
}
