// src/git.rs

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// NUL-separated fields of a bulk history record, in the order `record::parse_record`
/// expects them.
pub const HISTORY_FORMAT: &str = concat!(
    "%at", "%x00", // author time
    "%aN", "%x00", // author name
    "%aE", "%x00", // author email
    "%H", "%x00", // hash
    // folded trailer values would otherwise carry a newline into the record
    "%(trailers:key=Bug,valueonly,unfold,separator=%x2C)", "%x00",
    "%D", "%x00", // refs
    "%ct", "%x00", // committer time
    "%cE", "%x00", // committer email
    "%cN", // committer name
);

/// TAB-separated fields of a user search hit.
pub const SEARCH_FORMAT: &str = "%aN%x09%H%x09%at%x09%D";

/// Lifecycle trailer written to a change's meta ref once it is submitted.
pub const MERGED_MARKER: &str = "Status: merged";

/// The three history queries the scan depends on. Repositories are named by
/// their label relative to the scan root.
pub trait HistorySource: Sync {
    /// Every commit reachable from a branch head, newest author date first,
    /// one `HISTORY_FORMAT` record per line.
    fn history(&self, repo: &str) -> Result<String>;

    /// Oldest commit reachable from a branch head whose author matches
    /// `pattern`, or `None` when nothing matches.
    fn search(&self, repo: &str, pattern: &str) -> Result<Option<String>>;

    /// Author timestamps of the commits on `meta_ref` that carry the merged
    /// marker, newest first.
    fn merge_log(&self, repo: &str, meta_ref: &str) -> Result<String>;
}

/// `HistorySource` backed by the `git` executable.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn run(&self, repo: &str, args: &[&str]) -> Result<Output> {
        Command::new("git")
            // refs/changes/* are hidden from %D by default on newer git
            .args(["-c", "log.initialDecorationSet=all", "-C"])
            .arg(self.root.join(repo))
            .args(args)
            .output()
            .map_err(|source| Error::ToolUnavailable {
                repo: repo.to_string(),
                source,
            })
    }
}

/// Exit contract of a user search: a silent failure reads as "nothing
/// here", anything git had to say is fatal.
fn search_result(repo: &str, output: &Output) -> Result<Option<String>> {
    if !output.status.success() {
        if output.stdout.is_empty() && output.stderr.is_empty() {
            return Ok(None);
        }
        return Err(failure(repo, output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(String::from))
}

fn failure(repo: &str, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = match stderr.trim() {
        "" => format!("exited with {}", output.status),
        text => text.to_string(),
    };
    Error::ToolInvocation {
        repo: repo.to_string(),
        message,
    }
}

impl HistorySource for GitCli {
    fn history(&self, repo: &str) -> Result<String> {
        let format = format!("--format={}", HISTORY_FORMAT);
        let output = self.run(
            repo,
            &["log", "--glob=heads", "--author-date-order", &format],
        )?;
        if !output.status.success() {
            return Err(failure(repo, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn search(&self, repo: &str, pattern: &str) -> Result<Option<String>> {
        let format = format!("--format={}", SEARCH_FORMAT);
        let author = format!("--author={}", pattern);
        let output = self.run(
            repo,
            &[
                "log",
                "--glob=heads",
                &format,
                &author,
                "--extended-regexp",
                "--regexp-ignore-case",
                "--reverse",
            ],
        )?;
        search_result(repo, &output)
    }

    fn merge_log(&self, repo: &str, meta_ref: &str) -> Result<String> {
        let grep = format!("--grep={}", MERGED_MARKER);
        let output = self.run(repo, &["log", "--format=%at", &grep, meta_ref, "--"])?;
        if !output.status.success() {
            return Err(failure(repo, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_history_emits_nul_records() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let repo = init(&tmp.path().join("core"));
        let oid = commit(
            &repo,
            "refs/heads/master",
            "Alice",
            "alice@example.org",
            1_600_000_000,
            "Add feature\n\nBug: T123\n",
        );
        review(&repo, oid, "refs/changes/23/123/6", 1_600_003_600);

        let out = GitCli::new(tmp.path()).history("core").unwrap();
        let line = out.lines().next().unwrap();
        let fields: Vec<&str> = line.split('\0').collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], "1600000000");
        assert_eq!(fields[1], "Alice");
        assert_eq!(fields[2], "alice@example.org");
        assert_eq!(fields[3], oid.to_string());
        assert_eq!(fields[4], "T123");
        assert!(fields[5].contains("refs/changes/23/123/6"));
    }

    #[test]
    fn test_search_returns_oldest_match() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let repo = init(&tmp.path().join("core"));
        let first = commit(&repo, "refs/heads/master", "Bob", "bob@example.org", 100, "one");
        commit(&repo, "refs/heads/master", "Bob", "bob@example.org", 200, "two");

        let git = GitCli::new(tmp.path());
        let hit = git.search("core", "^bo").unwrap().unwrap();
        let fields: Vec<&str> = hit.split('\t').collect();
        assert_eq!(fields[0], "Bob");
        assert_eq!(fields[1], first.to_string());
        assert_eq!(fields[2], "100");

        assert_eq!(git.search("core", "carol").unwrap(), None);
    }

    #[test]
    fn test_merge_log_finds_marker() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let repo = init(&tmp.path().join("core"));
        let oid = commit(&repo, "refs/heads/master", "Alice", "a@example.org", 1_000, "x");
        review(&repo, oid, "refs/changes/01/1/1", 5_000);

        let git = GitCli::new(tmp.path());
        let out = git.merge_log("core", "refs/changes/01/1/meta").unwrap();
        assert_eq!(out.trim(), "5000");

        let err = git.merge_log("core", "refs/changes/02/2/meta").unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { .. }));
    }

    #[test]
    fn test_history_of_missing_repository_fails() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let err = GitCli::new(tmp.path()).history("gone").unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { ref repo, .. } if repo == "gone"));
    }

    #[test]
    fn test_folded_bug_trailer_stays_on_one_record() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let repo = init(&tmp.path().join("core"));
        commit(
            &repo,
            "refs/heads/master",
            "Alice",
            "alice@example.org",
            1_600_000_000,
            "Fix thing\n\nBug: T1\n  continued on the next line\n",
        );

        let out = GitCli::new(tmp.path()).history("core").unwrap();
        let commits = crate::record::parse_history("core", &out).unwrap();
        assert_eq!(commits.len(), 1);
        let bug = commits[0].bug.as_deref().unwrap();
        assert!(bug.starts_with("T1"));
        assert!(bug.contains("continued on the next line"));
        assert!(!bug.contains('\n'));
    }

    #[test]
    fn test_search_outside_repository_fails() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("plain")).unwrap();
        let err = GitCli::new(tmp.path()).search("plain", "alice").unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { ref repo, .. } if repo == "plain"));
    }

    #[cfg(unix)]
    #[test]
    fn test_search_exit_contract() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        let output = |code: i32, stdout: &str, stderr: &str| Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        };

        assert_eq!(search_result("core", &output(1, "", "")).unwrap(), None);

        let err = search_result("core", &output(128, "", "fatal: bad object")).unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { ref message, .. } if message == "fatal: bad object"));

        let err = search_result("core", &output(1, "Ann\th1\t100\t\n", "")).unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { .. }));

        let hit = search_result("core", &output(0, "\nAnn\th1\t100\t\nAnn\th2\t200\t\n", "")).unwrap();
        assert_eq!(hit.as_deref(), Some("Ann\th1\t100\t"));
        assert_eq!(search_result("core", &output(0, "", "")).unwrap(), None);
    }
}
