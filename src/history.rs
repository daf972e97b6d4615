// src/history.rs
//! The Source History seam: bounded commit queries used by the
//! co-commit and recency signals. The default implementation shells out
//! to `git`; a missing binary or a non-repo directory degrades every
//! query to empty, never to an error.

use std::path::{Path, PathBuf};
use std::process::Command;

pub trait SourceHistory: Send + Sync {
    fn is_available(&self) -> bool;

    /// Hashes of the most recent commits touching `path`, newest first.
    fn commits_for_file(&self, path: &Path, max_count: usize) -> Vec<String>;

    /// Project-relative paths touched by one commit.
    fn files_for_commit(&self, hash: &str) -> Vec<PathBuf>;

    /// Hashes of the most recent commits in the repository, newest first.
    fn recent_commit_hashes(&self, n: usize) -> Vec<String>;

    /// Files touched by any commit within the last `days` days.
    fn recently_touched_files(&self, days: u32) -> Vec<PathBuf>;
}

/// Git-CLI-backed history. Each query is one batched `git` invocation.
pub struct GitHistory {
    root: PathBuf,
}

impl GitHistory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Runs git with `args`, returning stdout on success and None on
    /// any failure (missing binary, not a repo, bad revision).
    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn lines_as_paths(stdout: &str) -> Vec<PathBuf> {
        let mut seen = std::collections::HashSet::new();
        stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter(|l| seen.insert((*l).to_string()))
            .map(PathBuf::from)
            .collect()
    }
}

impl SourceHistory for GitHistory {
    fn is_available(&self) -> bool {
        self.git(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.trim() == "true")
            .unwrap_or(false)
    }

    fn commits_for_file(&self, path: &Path, max_count: usize) -> Vec<String> {
        let n = max_count.to_string();
        let path_str = path.to_string_lossy();
        self.git(&["log", "--format=%H", "-n", &n, "--", &path_str])
            .map(|out| out.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn files_for_commit(&self, hash: &str) -> Vec<PathBuf> {
        self.git(&[
            "diff-tree",
            "--no-commit-id",
            "--name-only",
            "-r",
            hash,
        ])
        .map(|out| Self::lines_as_paths(&out))
        .unwrap_or_default()
    }

    fn recent_commit_hashes(&self, n: usize) -> Vec<String> {
        let count = n.to_string();
        self.git(&["log", "--format=%H", "-n", &count])
            .map(|out| out.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn recently_touched_files(&self, days: u32) -> Vec<PathBuf> {
        let since = format!("{days}.days.ago");
        self.git(&["log", "--since", &since, "--name-only", "--format="])
            .map(|out| Self::lines_as_paths(&out))
            .unwrap_or_default()
    }
}

/// History stub for hosts (and tests) without version control.
/// Everything is empty; every history signal contributes zero.
#[derive(Default)]
pub struct NoHistory;

impl SourceHistory for NoHistory {
    fn is_available(&self) -> bool {
        false
    }

    fn commits_for_file(&self, _path: &Path, _max_count: usize) -> Vec<String> {
        Vec::new()
    }

    fn files_for_commit(&self, _hash: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn recent_commit_hashes(&self, _n: usize) -> Vec<String> {
        Vec::new()
    }

    fn recently_touched_files(&self, _days: u32) -> Vec<PathBuf> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_is_empty() {
        let h = NoHistory;
        assert!(!h.is_available());
        assert!(h.commits_for_file(Path::new("a.rs"), 10).is_empty());
        assert!(h.recent_commit_hashes(5).is_empty());
    }

    #[test]
    fn git_in_non_repo_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let h = GitHistory::new(dir.path());
        assert!(!h.is_available());
        assert!(h.recent_commit_hashes(5).is_empty());
        assert!(h.recently_touched_files(7).is_empty());
    }

    #[test]
    fn lines_as_paths_dedupes() {
        let paths = GitHistory::lines_as_paths("a.rs\nb.rs\na.rs\n\n");
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
    }
}
