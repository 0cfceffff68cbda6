//! CLI definition.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Bump the version, write the changelog, commit, tag, push and publish a
/// GitHub release, rolling back on failure.
#[derive(Debug, Parser)]
#[command(name = "vership")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub release: commands::release::ReleaseArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a default vership.toml
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Runs the CLI command. Without a subcommand a release is run.
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Init(args)) => commands::init::run(&args),
            None => commands::release::run(self.release, self.verbose),
        }
    }
}
