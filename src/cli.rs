// src/cli.rs

use crate::model::AuthorKey;
use clap::Parser;
use std::path::PathBuf;

/// Time to first merge: find each contributor's first change across a tree
/// of gerrit-managed git repositories and how long it took to land.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to git repositories
    #[arg(short, long, default_value = ".")]
    pub repos: PathBuf,

    /// Pattern of users to search for (case-insensitive extended regex)
    #[arg(short, long)]
    pub users: Option<String>,

    /// Increase verbosity of output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path of an output store (accepted but not written to)
    #[arg(short, long)]
    pub sqlite: Option<PathBuf>,

    /// Report to produce. Defaults to `first` with --users, `authors` otherwise
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Author identity used to group commits
    #[arg(long, value_enum, default_value_t = AuthorKey::Email)]
    pub key: AuthorKey,

    /// Trailing window for the average report, in calendar months
    #[arg(long, default_value_t = 3)]
    pub window_months: u32,

    /// Write one bulk-index document per author to this file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Index name used in exported bulk actions
    #[arg(long, default_value = "ttfm")]
    pub index: String,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Earliest commit matching --users across all repositories
    First,
    /// First contribution and its merge latency for every author
    Authors,
    /// Mean merge latency of first contributions inside the window
    Average,
}
