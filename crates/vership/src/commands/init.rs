//! Initialize command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use vership_config::{CONFIG_FILE_NAME, default_config_toml};
use vership_core::detect_manifests;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Runs the init command.
pub fn run(args: &InitArgs) -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        bail!("{CONFIG_FILE_NAME} already exists, use --force to overwrite it");
    }

    fs::write(path, default_config_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE_NAME}"))?;
    println!("{} Created {CONFIG_FILE_NAME}", style("✓").green());

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    match detect_manifests(&cwd).first() {
        Some(manifest) => println!("  Version source: {}", manifest.display()),
        None => println!(
            "  {} no Cargo.toml or package.json found; list manifests under [version] files",
            style("warning:").yellow()
        ),
    }

    Ok(())
}
