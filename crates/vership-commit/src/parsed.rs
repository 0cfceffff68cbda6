//! Classified commit type produced by the conventional parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title of a footer note that marks an incompatible change.
pub const BREAKING_CHANGE: &str = "BREAKING CHANGE";

/// A footer note attached to a commit (`TITLE: text`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// The note keyword, e.g. `BREAKING CHANGE`.
    pub title: String,

    /// The note text.
    pub text: String,
}

impl Note {
    /// Creates a breaking-change note.
    #[must_use]
    pub fn breaking(text: impl Into<String>) -> Self {
        Self {
            title: BREAKING_CHANGE.to_string(),
            text: text.into(),
        }
    }

    /// Returns true if this note announces a breaking change.
    ///
    /// Both the spaced and the hyphenated spelling are accepted.
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        self.title == BREAKING_CHANGE || self.title == "BREAKING-CHANGE"
    }
}

/// A commit after classification.
///
/// Commits whose header does not follow the `type(scope): subject` pattern are
/// still represented, with `r#type` set to `None`, so their footer notes are
/// not lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommit {
    /// The commit hash (SHA).
    pub hash: String,

    /// The commit type (feat, fix, docs, ...), `None` for free-form headers.
    pub r#type: Option<String>,

    /// The optional scope.
    pub scope: Option<String>,

    /// The subject, without type and scope prefix.
    pub subject: String,

    /// Whether the header carried the `!` marker.
    pub breaking: bool,

    /// Footer notes.
    pub notes: Vec<Note>,

    /// The commit author name.
    pub author: String,

    /// The commit date.
    pub date: DateTime<Utc>,
}

impl ParsedCommit {
    /// Creates a new parsed commit builder.
    #[must_use]
    pub fn builder(hash: impl Into<String>) -> ParsedCommitBuilder {
        ParsedCommitBuilder::new(hash)
    }

    /// Returns true if the header matched the conventional pattern.
    #[must_use]
    pub fn is_conventional(&self) -> bool {
        self.r#type.is_some()
    }

    /// Returns true if this commit is exactly of type `feat`.
    #[must_use]
    pub fn is_feature(&self) -> bool {
        self.r#type.as_deref() == Some("feat")
    }

    /// Returns true if this commit is exactly of type `fix`.
    #[must_use]
    pub fn is_fix(&self) -> bool {
        self.r#type.as_deref() == Some("fix")
    }

    /// Returns the breaking-change notes of this commit.
    pub fn breaking_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|note| note.is_breaking())
    }

    /// Returns true if the commit announces any breaking change.
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        self.breaking || self.breaking_notes().next().is_some()
    }

    /// Returns the short hash (first 7 characters).
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }
}

/// Builder for [`ParsedCommit`].
#[derive(Debug)]
pub struct ParsedCommitBuilder {
    hash: String,
    r#type: Option<String>,
    scope: Option<String>,
    subject: String,
    breaking: bool,
    notes: Vec<Note>,
    author: String,
    date: DateTime<Utc>,
}

impl ParsedCommitBuilder {
    fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            r#type: None,
            scope: None,
            subject: String::new(),
            breaking: false,
            notes: Vec::new(),
            author: String::new(),
            date: Utc::now(),
        }
    }

    /// Sets the commit type.
    #[must_use]
    pub fn commit_type(mut self, commit_type: impl Into<String>) -> Self {
        self.r#type = Some(commit_type.into());
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the header breaking marker.
    #[must_use]
    pub fn breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    /// Appends a footer note.
    #[must_use]
    pub fn note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Builds the [`ParsedCommit`].
    #[must_use]
    pub fn build(self) -> ParsedCommit {
        ParsedCommit {
            hash: self.hash,
            r#type: self.r#type,
            scope: self.scope,
            subject: self.subject,
            breaking: self.breaking,
            notes: self.notes,
            author: self.author,
            date: self.date,
        }
    }
}
