// src/merge.rs

use crate::error::{Error, Result};
use crate::git::{HistorySource, MERGED_MARKER};
use crate::model::{Commit, MergeRecord};
use crate::record::parse_epoch;
use log::debug;

/// Look up when `commit`'s change was merged, from the lifecycle trailers on
/// its meta ref. Not cached: each call queries the repository again.
pub fn resolve_merge(source: &dyn HistorySource, commit: &Commit) -> Result<MergeRecord> {
    let not_found = |meta_ref: &str, reason: String| Error::NoMergeRecordFound {
        repo: commit.repository.clone(),
        hash: commit.hash.clone(),
        meta_ref: meta_ref.to_string(),
        reason,
    };

    let meta_ref = commit
        .review_ref
        .as_deref()
        .ok_or_else(|| not_found("-", "commit has no review reference".to_string()))?;
    debug!("Resolving merge of {} via {}", commit.hash, meta_ref);

    let output = match source.merge_log(&commit.repository, meta_ref) {
        Ok(output) => output,
        // git ran but could not resolve the ref
        Err(Error::ToolInvocation { message, .. }) => return Err(not_found(meta_ref, message)),
        Err(err) => return Err(err),
    };

    // Newest first; a change merged more than once counts from its first merge.
    let first_merge = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| not_found(meta_ref, format!("no '{}' entry", MERGED_MARKER)))?;

    Ok(MergeRecord {
        commit: commit.clone(),
        merged_at: parse_epoch(&commit.repository, "merge", first_merge)?,
    })
}
