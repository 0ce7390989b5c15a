// src/scan.rs

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::git::HistorySource;
use crate::locator::RepoLocation;
use crate::model::Commit;
use crate::record;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::debug;
use rayon::prelude::*;

/// Run `scan_one` for every repository on a pool of `config.concurrency`
/// workers and concatenate the results in repository order.
///
/// Each worker returns its own records; nothing is shared while the pool
/// runs. All repositories are scanned before the first failure (in
/// repository order) is returned.
fn fan_out<T, F>(repos: &[RepoLocation], config: &ScanConfig, scan_one: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&RepoLocation) -> Result<Vec<T>> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency.max(1))
        .build()
        .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;

    let bar = if config.show_progress {
        ProgressBar::new(repos.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_message("Scanning repositories");

    let results: Vec<Result<Vec<T>>> = pool.install(|| {
        repos
            .par_iter()
            .progress_with(bar.clone())
            .map(|repo| {
                debug!("Checking '{}'", repo.path.display());
                scan_one(repo)
            })
            .collect()
    });
    bar.finish_and_clear();

    let mut out = Vec::new();
    for result in results {
        out.extend(result?);
    }
    Ok(out)
}

/// Sort newest author time first, ties broken by repository then hash
/// (descending), giving one total order independent of worker scheduling.
pub fn canonical_order(commits: &mut [Commit]) {
    commits.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
}

/// Full branch-head history of every repository, in canonical order.
pub fn scan_history(
    repos: &[RepoLocation],
    source: &dyn HistorySource,
    config: &ScanConfig,
) -> Result<Vec<Commit>> {
    let mut commits = fan_out(repos, config, |repo| {
        let output = source.history(&repo.label)?;
        record::parse_history(&repo.label, &output)
    })?;
    canonical_order(&mut commits);
    debug!("Collected {} commits from {} repositories", commits.len(), repos.len());
    Ok(commits)
}

/// Oldest commit matching `pattern` in each repository. Repositories without
/// a match contribute a sentinel.
pub fn scan_search(
    repos: &[RepoLocation],
    source: &dyn HistorySource,
    pattern: &str,
    config: &ScanConfig,
) -> Result<Vec<Commit>> {
    fan_out(repos, config, |repo| {
        let commit = match source.search(&repo.label, pattern)? {
            Some(line) => record::parse_search_hit(&repo.label, &line)?,
            None => Commit::sentinel(repo.label.clone()),
        };
        Ok(vec![commit])
    })
}
