//! Commit types for vership.
//!
//! This crate provides the commit types used by the release pipeline:
//! - [`RawCommit`]: A commit as retrieved from Git
//! - [`ParsedCommit`]: A commit classified by the [`ConventionalParser`]
//! - [`Note`]: A footer note such as `BREAKING CHANGE: ...`

mod parsed;
mod parser;
mod raw;

pub use parsed::{BREAKING_CHANGE, Note, ParsedCommit, ParsedCommitBuilder};
pub use parser::ConventionalParser;
pub use raw::RawCommit;
