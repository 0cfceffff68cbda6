//! Changelog generation and prepending.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info};
use vership_commit::ConventionalParser;

use super::StageOutcome;
use crate::CoreResult;
use crate::changelog::{ReleaseNotes, prepend_section};
use crate::context::RunContext;
use crate::ledger::RollbackAction;
use crate::pipeline::Services;

fn compare_url(ctx: &RunContext, tag: &str) -> Option<String> {
    let repository = ctx.repository.as_deref()?;
    let previous = ctx.previous_tag.as_deref()?;
    Some(format!(
        "{}/{repository}/compare/{previous}...{tag}",
        ctx.config.github.web_url()
    ))
}

pub(super) async fn run(ctx: &RunContext, services: &Services) -> CoreResult<StageOutcome> {
    let version = ctx.require_next_version()?.clone();
    let tag = ctx.tag_name()?;

    let commits = services
        .vcs
        .commits_since(ctx.previous_tag.as_deref())
        .await?;
    let notes = ReleaseNotes {
        version,
        date: Local::now().date_naive(),
        commits: ConventionalParser::new().parse_all(&commits),
        compare_url: compare_url(ctx, &tag),
    };
    let section = services.changelog.generate(&notes);
    let context = ctx.clone().with_changelog(section.clone());

    let relative = PathBuf::from(&ctx.config.changelog.path);
    if ctx.is_dry_run() {
        info!(path = %relative.display(), "would prepend changelog section");
        debug!("\n{section}");
        return Ok(StageOutcome::new(context));
    }

    let tracked = services.vcs.is_tracked(&relative).await?;
    let full = services.path(&relative);
    let existing = match fs::read_to_string(&full) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };
    fs::write(&full, prepend_section(&existing, &section))?;
    info!(path = %relative.display(), commits = notes.commits.len(), "updated changelog");

    Ok(StageOutcome::new(context).with_rollback(RollbackAction::RevertChangelog {
        path: relative,
        tracked,
    }))
}
