// src/main.rs

mod cli;
mod config;
mod error;
mod export;
mod git;
mod locator;
mod logging;
mod merge;
mod model;
mod record;
mod report;
mod scan;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Args, Mode};
use config::ScanConfig;
use export::BulkWriter;
use git::{GitCli, HistorySource};
use locator::RepoLocation;
use log::{debug, info};
use model::MergeRecord;
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

fn main() {
    let args = Args::parse();
    let config = match ScanConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };
    logging::init(config.verbose);
    let start_time = Instant::now();

    if let Err(err) = run(&config) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    debug!("Total time: {:.2?}", start_time.elapsed());
}

fn run(config: &ScanConfig) -> Result<()> {
    if let Some(store) = &config.store_path {
        debug!("Output store {} is not written to", store.display());
    }

    let repos = locator::find_repositories(&config.root)?;
    info!(
        "Scanning {} repositories under {} ({} at a time)",
        repos.len(),
        config.root.display(),
        config.concurrency
    );
    let git = GitCli::new(&config.root);

    match config.mode {
        Mode::First => report_first(config, &repos, &git),
        Mode::Authors => report_authors(config, &repos, &git),
        Mode::Average => report_average(config, &repos, &git),
    }
}

fn report_first(config: &ScanConfig, repos: &[RepoLocation], git: &dyn HistorySource) -> Result<()> {
    let pattern = config.user_pattern.as_deref().unwrap_or_default();
    let hits = scan::scan_search(repos, git, pattern, config)?;

    let Some(oldest) = report::find_oldest(&hits) else {
        println!("No commit found for '{}'", pattern);
        return Ok(());
    };

    if oldest.review_ref.is_some() {
        let record = merge::resolve_merge(git, oldest)?;
        println!("{}", report::describe(&config.root, oldest, Some(record.latency())));
        export(config, &[record])?;
    } else {
        println!("{}", report::describe(&config.root, oldest, None));
    }
    Ok(())
}

fn report_authors(config: &ScanConfig, repos: &[RepoLocation], git: &dyn HistorySource) -> Result<()> {
    let scan_start = Instant::now();
    let commits = scan::scan_history(repos, git, config)?;
    info!(
        "Scan finished in {:.2?}. Found {} commits.",
        scan_start.elapsed(),
        commits.len()
    );

    let index = report::AuthorIndex::fold(config.author_key, commits);
    if index.is_empty() {
        println!("No commits found under {}", config.root.display());
        return Ok(());
    }
    let records = report::first_merges(&index, git)?;
    for record in &records {
        println!(
            "{}",
            report::describe(&config.root, &record.commit, Some(record.latency()))
        );
    }
    info!(
        "{} of {} authors had a reviewed first change",
        records.len(),
        index.len()
    );
    export(config, &records)
}

fn report_average(config: &ScanConfig, repos: &[RepoLocation], git: &dyn HistorySource) -> Result<()> {
    let commits = scan::scan_history(repos, git, config)?;
    match report::average_latency(
        commits,
        config.author_key,
        Utc::now(),
        config.window_months,
        git,
    ) {
        Ok(average) => {
            println!(
                "Average time to first merge over the last {} month(s): {} ({} authors)",
                config.window_months,
                report::format_duration(average.mean),
                average.samples
            );
            Ok(())
        }
        Err(err @ error::Error::NoData { .. }) => {
            println!("No data: {}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn export(config: &ScanConfig, records: &[MergeRecord]) -> Result<()> {
    let Some(path) = &config.export_path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    let mut sink = BulkWriter::new(BufWriter::new(file), config.index_name.as_str());
    let written = export::export_all(&mut sink, records)?;
    sink.finish()?;
    info!("Exported {} documents to {}", written, path.display());
    Ok(())
}
