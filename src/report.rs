// src/report.rs

use crate::error::{Error, Result};
use crate::git::HistorySource;
use crate::merge::resolve_merge;
use crate::model::{AuthorKey, Commit, MergeRecord};
use chrono::{DateTime, Duration, Months, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// Earliest real commit. Sentinels never win, whatever their timestamp.
pub fn find_oldest(commits: &[Commit]) -> Option<&Commit> {
    commits
        .iter()
        .filter(|c| c.has_match)
        .min_by(|a, b| a.order_key().cmp(&b.order_key()))
}

/// Each author's earliest commit.
#[derive(Debug)]
pub struct AuthorIndex {
    key: AuthorKey,
    entries: BTreeMap<String, Commit>,
}

impl AuthorIndex {
    pub fn new(key: AuthorKey) -> Self {
        Self {
            key,
            entries: BTreeMap::new(),
        }
    }

    /// Fold a commit stream. The result does not depend on stream order: an
    /// entry is only replaced by a commit that sorts strictly earlier.
    pub fn fold(key: AuthorKey, commits: impl IntoIterator<Item = Commit>) -> Self {
        let mut index = Self::new(key);
        for commit in commits {
            index.insert(commit);
        }
        index
    }

    pub fn insert(&mut self, commit: Commit) {
        if !commit.has_match {
            return;
        }
        let author = self.key.of(&commit).to_string();
        let earlier = self
            .entries
            .get(&author)
            .map_or(true, |current| commit.order_key() < current.order_key());
        if earlier {
            self.entries.insert(author, commit);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First commits ordered by author key.
    pub fn commits(&self) -> impl Iterator<Item = &Commit> {
        self.entries.values()
    }
}

/// Resolve the merge of every author's first commit. Authors whose first
/// commit never went through review are skipped.
pub fn first_merges(index: &AuthorIndex, source: &dyn HistorySource) -> Result<Vec<MergeRecord>> {
    let mut records = Vec::new();
    for commit in index.commits() {
        if commit.review_ref.is_none() {
            debug!("Skipping {} in '{}': no review reference", commit.hash, commit.repository);
            continue;
        }
        records.push(resolve_merge(source, commit)?);
    }
    Ok(records)
}

/// Start of a trailing window of `months` calendar months ending at `now`.
pub fn window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Mean time to first merge over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Average {
    pub mean: Duration,
    pub samples: usize,
}

/// Average the first-merge latency of authors whose first commit inside
/// the window went through review. An empty window is `Error::NoData`.
pub fn average_latency(
    commits: Vec<Commit>,
    key: AuthorKey,
    now: DateTime<Utc>,
    months: u32,
    source: &dyn HistorySource,
) -> Result<Average> {
    let since = window_start(now, months);
    let recent = commits.into_iter().filter(|c| c.author_time >= since);
    let merges = first_merges(&AuthorIndex::fold(key, recent), source)?;
    mean_latency(&merges).ok_or(Error::NoData { months })
}

/// Arithmetic mean with nanosecond precision, `None` for no records.
pub fn mean_latency(records: &[MergeRecord]) -> Option<Average> {
    if records.is_empty() {
        return None;
    }
    let total: i128 = records.iter().map(|r| nanos(r.latency())).sum();
    let mean = total / records.len() as i128;
    let mean = i64::try_from(mean).unwrap_or(if mean < 0 { i64::MIN } else { i64::MAX });
    Some(Average {
        mean: Duration::nanoseconds(mean),
        samples: records.len(),
    })
}

fn nanos(d: Duration) -> i128 {
    d.num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(d.num_seconds()) * 1_000_000_000)
}

/// Human-readable duration such as `2d 3h 0m 12s`.
pub fn format_duration(d: Duration) -> String {
    let sign = if d < Duration::zero() { "-" } else { "" };
    let total = d.num_seconds().unsigned_abs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );
    let text = if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };
    format!("{}{}", sign, text)
}

/// One report line, ready to paste into a shell.
pub fn describe(root: &Path, commit: &Commit, latency: Option<Duration>) -> String {
    let line = format!(
        "git -C '{}' show {} by '{}' at {}",
        root.join(&commit.repository).display(),
        commit.hash,
        commit.author_name,
        commit.author_time.to_rfc2822()
    );
    match latency {
        Some(latency) => format!("{} ({})", line, format_duration(latency)),
        None => line,
    }
}
