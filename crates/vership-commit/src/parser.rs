//! Conventional Commits parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Note, ParsedCommit, RawCommit};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<subject>.+)$")
        .expect("invalid regex")
});

static NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>BREAKING[ -]CHANGE): ?(?P<text>.*)$").expect("invalid regex")
});

/// Conventional Commits parser.
///
/// Recognizes `type(scope): subject` headers, the `type(scope)!: subject`
/// breaking variant, and `BREAKING CHANGE:` footer notes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConventionalParser;

impl ConventionalParser {
    /// Creates a new conventional parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classifies a raw commit.
    ///
    /// Never fails: free-form headers produce a commit without a type.
    #[must_use]
    pub fn parse(&self, raw: &RawCommit) -> ParsedCommit {
        let mut builder = ParsedCommit::builder(&raw.hash)
            .author(&raw.author)
            .date(raw.date);

        let header = raw.subject().trim();
        let mut bang = false;
        match HEADER_RE.captures(header) {
            Some(captures) => {
                bang = captures.name("breaking").is_some();
                builder = builder
                    .commit_type(&captures["type"])
                    .subject(&captures["subject"])
                    .breaking(bang);
                if let Some(scope) = captures.name("scope") {
                    builder = builder.scope(scope.as_str());
                }
            }
            None => builder = builder.subject(header),
        }

        let notes = raw.body().map(Self::parse_notes).unwrap_or_default();
        let has_breaking_note = notes.iter().any(Note::is_breaking);
        for note in notes {
            builder = builder.note(note);
        }

        // A `!` header counts as one breaking note unless the footer spells it out.
        if bang && !has_breaking_note {
            builder = builder.note(Note::breaking(
                HEADER_RE
                    .captures(header)
                    .map(|c| c["subject"].to_string())
                    .unwrap_or_default(),
            ));
        }

        builder.build()
    }

    /// Parses all commits in order.
    #[must_use]
    pub fn parse_all(&self, raw_commits: &[RawCommit]) -> Vec<ParsedCommit> {
        raw_commits.iter().map(|raw| self.parse(raw)).collect()
    }

    /// Extracts footer notes from a commit body.
    ///
    /// Lines following a note keyword are appended to that note until a blank
    /// line or another keyword starts.
    fn parse_notes(body: &str) -> Vec<Note> {
        let mut notes: Vec<Note> = Vec::new();
        let mut open = false;

        for line in body.lines() {
            if let Some(captures) = NOTE_RE.captures(line) {
                notes.push(Note {
                    title: captures["title"].to_string(),
                    text: captures["text"].trim().to_string(),
                });
                open = true;
            } else if line.trim().is_empty() {
                open = false;
            } else if open && let Some(note) = notes.last_mut() {
                if !note.text.is_empty() {
                    note.text.push('\n');
                }
                note.text.push_str(line.trim());
            }
        }

        notes
    }
}
