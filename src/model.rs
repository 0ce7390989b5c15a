// src/model.rs

use chrono::{DateTime, Duration, Utc};

/// A single commit as reported by one repository's history.
///
/// `(repository, hash)` is the identity; hashes are only unique within
/// a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Repository location relative to the scan root
    pub repository: String,
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: DateTime<Utc>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub committer_time: Option<DateTime<Utc>>,
    /// The `.../meta` reference holding the change's review lifecycle
    pub review_ref: Option<String>,
    pub bug: Option<String>,
    /// False for the "nothing found here" placeholder
    pub has_match: bool,
}

impl Commit {
    /// Placeholder for a repository without a matching commit. Never
    /// eligible as an earliest commit.
    pub fn sentinel(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            hash: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            author_time: Utc::now(),
            committer_name: None,
            committer_email: None,
            committer_time: None,
            review_ref: None,
            bug: None,
            has_match: false,
        }
    }

    /// Canonical ordering key: author time, then identity.
    pub fn order_key(&self) -> (DateTime<Utc>, &str, &str) {
        (self.author_time, &self.repository, &self.hash)
    }
}

/// Which author identity the per-author index is keyed on.
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum AuthorKey {
    Name,
    Email,
}

impl AuthorKey {
    pub fn of<'a>(&self, commit: &'a Commit) -> &'a str {
        match self {
            AuthorKey::Name => &commit.author_name,
            AuthorKey::Email => &commit.author_email,
        }
    }
}

/// A commit paired with the time its change was merged.
#[derive(Debug, Clone)]
pub struct MergeRecord {
    pub commit: Commit,
    pub merged_at: DateTime<Utc>,
}

impl MergeRecord {
    /// Time from authorship to merge.
    pub fn latency(&self) -> Duration {
        self.merged_at - self.commit.author_time
    }
}
