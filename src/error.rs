// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Every fatal condition the scan can hit. Components return these and
/// `main` decides whether to abort.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot scan {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git failed in '{repo}': {message}")]
    ToolInvocation { repo: String, message: String },

    /// git could not be started at all
    #[error("Could not run git in '{repo}': {source}")]
    ToolUnavailable {
        repo: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad {field} timestamp '{value}' in '{repo}'")]
    TimestampParse {
        repo: String,
        field: &'static str,
        value: String,
    },

    #[error("Malformed log record in '{repo}': expected {expected} fields, got {found}")]
    MalformedRecord {
        repo: String,
        expected: usize,
        found: usize,
    },

    #[error("No merge record for {hash} in '{repo}' on {meta_ref}: {reason}")]
    NoMergeRecordFound {
        repo: String,
        hash: String,
        meta_ref: String,
        reason: String,
    },

    #[error("No merged changes authored in the last {months} month(s)")]
    NoData { months: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
