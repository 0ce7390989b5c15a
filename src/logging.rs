// src/logging.rs

use env_logger::Env;
use log::LevelFilter;

/// Default filter for the given verbosity. `RUST_LOG` still wins.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the process logger. Diagnostics go to stderr so that report
/// lines on stdout stay machine-readable.
pub fn init(verbose: bool) {
    let level = default_level(verbose).to_string().to_lowercase();
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
