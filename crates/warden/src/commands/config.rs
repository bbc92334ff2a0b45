//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Print a config file with every default filled in
    Init,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Init => cmd_init(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();
    let config = &ctx.config;

    println!("# Warden Configuration\n");
    match &ctx.config_path {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("{}\n", dim.apply_to("No config file loaded (using defaults)")),
    }

    println!("Cache:");
    println!("  max_size:        {}", config.cache.max_size);
    println!("  cleanup period:  {}s", config.cache.cleanup_period_secs);
    println!("  cleanup task:    {}", on_off(config.cache.enable_cleanup_task));
    println!();

    println!("Logging:");
    println!("  filter: {}", config.logging.filter);
    println!("  json:   {}", on_off(config.logging.json));
    println!();

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn cmd_init() -> Result<()> {
    print!("{}", warden_config::WardenConfig::default().to_toml()?);
    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}
