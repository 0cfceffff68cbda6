//! Release command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use tracing::debug;

use vership_config::{LoadedConfig, find_and_load_config_from, load_config};
use vership_core::{
    BumpStrategy, FileManifests, GithubPublisher, GithubReleaseFlags, KeepAChangelog,
    NonInteractive, Options, Pipeline, PipelineFailure, PreReleaseBase, Prompter, ReleaseType,
    RollbackReport, RunContext, Services, SkipFlags,
};
use vership_git::SystemGit;

use crate::prompt::TerminalPrompter;

/// Arguments for a release run.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Show what would happen without changing anything
    #[arg(short, long)]
    pub dry_run: bool,

    /// Never prompt (for CI environments)
    #[arg(long)]
    pub ci: bool,

    /// Package name used in templates (defaults to the manifest name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// How to pick the next version: auto, manual
    #[arg(short = 's', long, value_name = "STRATEGY")]
    pub bump_strategy: Option<BumpStrategy>,

    /// Release type: major, minor, patch, premajor, preminor, prepatch, prerelease
    #[arg(short, long, value_name = "TYPE")]
    pub release_type: Option<ReleaseType>,

    /// Pre-release identifier [default: alpha]
    #[arg(short = 'p', long, value_name = "ID")]
    pub pre_release_id: Option<String>,

    /// Pre-release counter base: 0, 1, next, canary, nightly
    #[arg(short = 'B', long, value_name = "BASE", default_value = "0")]
    pub pre_release_base: PreReleaseBase,

    /// Keep the current version
    #[arg(long)]
    pub skip_bump: bool,

    /// Do not update the changelog
    #[arg(long)]
    pub skip_changelog: bool,

    /// Do not publish a GitHub release
    #[arg(long)]
    pub skip_release: bool,

    /// Do not create a tag
    #[arg(long)]
    pub skip_tag: bool,

    /// Do not create the release commit
    #[arg(long)]
    pub skip_commit: bool,

    /// Do not push the branch
    #[arg(long)]
    pub skip_push: bool,

    /// Do not push the tag
    #[arg(long)]
    pub skip_push_tag: bool,

    /// Only update the manifests
    #[arg(long)]
    pub bump_only: bool,

    /// Only update the manifests and the changelog
    #[arg(long)]
    pub bump_only_with_changelog: bool,

    /// Create the GitHub release as a draft
    #[arg(long)]
    pub github_release_draft: bool,

    /// Mark the GitHub release as a pre-release
    #[arg(long)]
    pub github_release_prerelease: bool,

    /// Mark the GitHub release as the latest release
    #[arg(long)]
    pub github_release_latest: bool,

    /// Configuration file (defaults to vership.toml in this or a parent directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ReleaseArgs {
    /// Converts the flags into pipeline options.
    pub fn options(&self, verbose: bool) -> Options {
        Options {
            dry_run: self.dry_run,
            verbose,
            ci: self.ci,
            name: self.name.clone(),
            bump_strategy: self.bump_strategy,
            release_type: self.release_type,
            pre_release_id: self.pre_release_id.clone(),
            pre_release_base: self.pre_release_base,
            skip: SkipFlags {
                bump: self.skip_bump,
                changelog: self.skip_changelog,
                commit: self.skip_commit,
                tag: self.skip_tag,
                push: self.skip_push,
                push_tag: self.skip_push_tag,
                release: self.skip_release,
            },
            bump_only: self.bump_only,
            bump_only_with_changelog: self.bump_only_with_changelog,
            github_release: GithubReleaseFlags {
                draft: self.github_release_draft,
                prerelease: self.github_release_prerelease,
                latest: self.github_release_latest,
            },
        }
    }

    fn load_config(&self, workdir: &std::path::Path) -> Result<LoadedConfig> {
        match &self.config {
            Some(path) => {
                let config = load_config(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                Ok(LoadedConfig {
                    path: Some(path.clone()),
                    config,
                })
            }
            None => find_and_load_config_from(workdir).context("failed to load configuration"),
        }
    }
}

/// Runs a release.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ReleaseArgs, verbose: bool) -> Result<()> {
    let workdir = std::env::current_dir().context("failed to read current directory")?;
    let loaded = args.load_config(&workdir)?;
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), "loaded configuration");
    }

    let options = args.options(verbose);
    let prompter: Box<dyn Prompter> = if options.ci {
        Box::new(NonInteractive)
    } else {
        Box::new(TerminalPrompter)
    };
    let services = Services {
        workdir: workdir.clone(),
        vcs: Box::new(SystemGit::new(&workdir)),
        manifests: Box::new(FileManifests::new()),
        changelog: Box::new(KeepAChangelog::from_config(&loaded.config.changelog)),
        publisher: Box::new(
            GithubPublisher::from_config(&loaded.config.github)
                .context("failed to create GitHub client")?,
        ),
        prompter,
    };
    let ctx = RunContext::new(options, loaded.config).with_config_path(loaded.path);

    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    match rt.block_on(Pipeline::new(services).run(ctx)) {
        Ok(ctx) => {
            print_summary(&ctx);
            Ok(())
        }
        Err(failure) => {
            print_failure(&failure, verbose);
            Err((*failure).into())
        }
    }
}

fn print_summary(ctx: &RunContext) {
    let Some(next) = ctx.next_version() else {
        return;
    };

    if ctx.is_dry_run() {
        println!(
            "\n{} {} {} -> {}",
            style("Dry run:").yellow().bold(),
            ctx.name,
            ctx.current_version,
            style(next).green()
        );
        if let Some(changelog) = &ctx.changelog {
            println!("\n{}", changelog.trim_end());
        }
        println!("\nNo changes were made.");
    } else if next == &ctx.current_version {
        println!("\n{} {} {next}", style("✓").green(), ctx.name);
    } else {
        println!(
            "\n{} Released {} {} -> {}",
            style("✓").green(),
            ctx.name,
            ctx.current_version,
            style(next).green().bold()
        );
    }
}

fn print_failure(failure: &PipelineFailure, verbose: bool) {
    if verbose && let Some(output) = failure.error.command_output() {
        eprintln!("{}", style(output.trim_end()).dim());
    }

    match &failure.rollback {
        RollbackReport::Nothing => {}
        RollbackReport::Completed { undone } => {
            eprintln!("{} Rolled back:", style("↺").yellow());
            for description in undone {
                eprintln!("  - {description}");
            }
        }
        RollbackReport::Fallback {
            undone,
            failed,
            error,
            fallback_error,
        } => {
            eprintln!("{} Rolled back:", style("↺").yellow());
            for description in undone {
                eprintln!("  - {description}");
            }
            eprintln!(
                "{} could not {failed}: {error}; reset the working tree to HEAD instead",
                style("warning:").yellow()
            );
            if let Some(err) = fallback_error {
                eprintln!(
                    "{} reset failed too, the repository needs manual cleanup: {err}",
                    style("error:").red()
                );
            }
        }
    }
}
