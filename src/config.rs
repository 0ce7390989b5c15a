// src/config.rs

use crate::cli::{Args, Mode};
use crate::error::{Error, Result};
use crate::model::AuthorKey;
use std::path::PathBuf;

/// In-flight repository scans allowed per logical CPU. Scans spend their
/// time waiting on git, so the pool is oversubscribed.
pub const WORKERS_PER_CPU: usize = 4;

/// Resolved run configuration, handed to each component explicitly.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub user_pattern: Option<String>,
    pub verbose: bool,
    pub store_path: Option<PathBuf>,
    pub mode: Mode,
    pub author_key: AuthorKey,
    pub window_months: u32,
    pub export_path: Option<PathBuf>,
    pub index_name: String,
    /// Maximum number of repositories scanned at once
    pub concurrency: usize,
    pub show_progress: bool,
}

impl ScanConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let mode = match (args.mode, &args.users) {
            (Some(Mode::First), None) => {
                return Err(Error::Config("--mode first requires --users".into()))
            }
            (Some(mode), _) => mode,
            (None, Some(_)) => Mode::First,
            (None, None) => Mode::Authors,
        };
        if mode == Mode::Average && args.window_months == 0 {
            return Err(Error::Config("--window-months must be at least 1".into()));
        }

        Ok(Self {
            root: args.repos.clone(),
            user_pattern: args.users.clone(),
            verbose: args.verbose,
            store_path: args.sqlite.clone(),
            mode,
            author_key: args.key,
            window_months: args.window_months,
            export_path: args.export.clone(),
            index_name: args.index.clone(),
            concurrency: num_cpus::get().max(1) * WORKERS_PER_CPU,
            show_progress: true,
        })
    }
}
