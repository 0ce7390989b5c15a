// src/record.rs

use crate::error::{Error, Result};
use crate::model::Commit;
use chrono::{DateTime, TimeZone, Utc};

/// Substring identifying a gerrit change ref among a commit's decorations.
pub const CHANGE_MARKER: &str = "refs/changes";

const HISTORY_FIELDS: usize = 9;
const SEARCH_FIELDS: usize = 4;

/// Map a commit's decoration list to the meta ref of its first change ref.
///
/// `"origin/master, refs/changes/23/123/6"` becomes `"refs/changes/23/123/meta"`.
/// Lists without a change ref yield `None`, whatever else they contain.
pub fn review_ref(refs: &str) -> Option<String> {
    refs.split(',')
        .map(str::trim)
        .find(|candidate| candidate.contains(CHANGE_MARKER))
        .map(meta_ref)
}

fn meta_ref(change_ref: &str) -> String {
    match change_ref.rsplit_once('/') {
        Some((parent, _)) => format!("{}/meta", parent),
        None => "meta".to_string(),
    }
}

/// Parse decimal epoch seconds.
pub fn parse_epoch(repo: &str, field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    let err = || Error::TimestampParse {
        repo: repo.to_string(),
        field,
        value: value.to_string(),
    };
    let secs: i64 = value.trim().parse().map_err(|_| err())?;
    Utc.timestamp_opt(secs, 0).single().ok_or_else(err)
}

fn non_empty(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

/// Parse one line of bulk history output (`git::HISTORY_FORMAT`).
pub fn parse_record(repo: &str, line: &str) -> Result<Commit> {
    let fields: Vec<&str> = line.split('\0').collect();
    if fields.len() != HISTORY_FIELDS {
        return Err(Error::MalformedRecord {
            repo: repo.to_string(),
            expected: HISTORY_FIELDS,
            found: fields.len(),
        });
    }

    Ok(Commit {
        repository: repo.to_string(),
        author_time: parse_epoch(repo, "author", fields[0])?,
        author_name: fields[1].to_string(),
        author_email: fields[2].to_string(),
        hash: fields[3].to_string(),
        bug: non_empty(fields[4]),
        review_ref: review_ref(fields[5]),
        committer_time: Some(parse_epoch(repo, "committer", fields[6])?),
        committer_email: Some(fields[7].to_string()),
        committer_name: Some(fields[8].to_string()),
        has_match: true,
    })
}

/// Split bulk history output into records. Empty output means no commits.
pub fn parse_history(repo: &str, output: &str) -> Result<Vec<Commit>> {
    let output = output.trim_end();
    if output.is_empty() {
        return Ok(Vec::new());
    }
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_record(repo, line))
        .collect()
}

/// Parse a user search hit (`git::SEARCH_FORMAT`).
pub fn parse_search_hit(repo: &str, line: &str) -> Result<Commit> {
    let fields: Vec<&str> = line.split('\t').collect();
    // A commit without decorations may lose its empty trailing field
    if fields.len() != SEARCH_FIELDS && fields.len() != SEARCH_FIELDS - 1 {
        return Err(Error::MalformedRecord {
            repo: repo.to_string(),
            expected: SEARCH_FIELDS,
            found: fields.len(),
        });
    }

    Ok(Commit {
        repository: repo.to_string(),
        author_name: fields[0].to_string(),
        author_email: String::new(),
        hash: fields[1].to_string(),
        author_time: parse_epoch(repo, "author", fields[2])?,
        committer_name: None,
        committer_email: None,
        committer_time: None,
        review_ref: fields.get(3).and_then(|refs| review_ref(refs)),
        bug: None,
        has_match: true,
    })
}
