// src/locator.rs

use crate::error::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix identifying repository metadata (`.git` dirs, `.git` files of
/// worktrees and submodules, bare `name.git` directories).
const REPO_MARKER: &str = ".git";

/// A repository found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    /// Where git is run from
    pub path: PathBuf,
    /// `path` relative to the scan root, used to label commits
    pub label: String,
}

/// Walk `root` and return every repository beneath it, in file-name order.
///
/// Unreadable entries below the root are skipped; failing to read the root
/// itself is a `Discovery` error. Symlinks are not followed.
pub fn find_repositories(root: &Path) -> Result<Vec<RepoLocation>> {
    std::fs::metadata(root).map_err(|source| Error::Discovery {
        path: root.to_path_buf(),
        source,
    })?;

    let mut repos = Vec::new();
    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(Error::Discovery {
                    path: root.to_path_buf(),
                    source: err.into(),
                })
            }
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(REPO_MARKER) {
            continue;
        }

        // A `.git` entry marks its parent as the work tree; `name.git` is a bare repository.
        let path = if name == REPO_MARKER {
            entry.path().parent().unwrap_or(root).to_path_buf()
        } else {
            entry.path().to_path_buf()
        };
        debug!("Found repository at {}", path.display());
        repos.push(RepoLocation {
            label: label_for(root, &path),
            path,
        });

        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
    }

    Ok(repos)
}

fn label_for(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
