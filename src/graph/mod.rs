// src/graph/mod.rs
//! The project graph: one immutable snapshot per analysis pass.

pub mod builder;
pub mod cache;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Aggregate of everything one analysis pass learns about the tree.
///
/// Built fully by the graph builder, persisted as the cache artifact,
/// and handed to readers behind `Arc`. Replaced atomically on the
/// next successful pass, never patched in place.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All enumerated files in scan order (the tie-break authority).
    pub files: Vec<PathBuf>,
    /// file -> raw import specifiers, scan order, deduplicated.
    pub dependencies: BTreeMap<PathBuf, Vec<String>>,
    /// file -> resolved forward edges.
    pub resolved: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// file -> files that import it.
    pub dependents: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// file -> files whose basename stem it mentions as a whole word.
    pub mentions: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Bounded, deterministically ordered hub set.
    pub hub_files: Vec<PathBuf>,
    /// file -> (peer -> shared commit count); symmetric.
    pub co_commits: BTreeMap<PathBuf, BTreeMap<PathBuf, u32>>,
    /// Files touched within the recency window.
    pub recent_files: BTreeSet<PathBuf>,
}

impl GraphSnapshot {
    /// Raw specifiers scanned from `path`.
    #[must_use]
    pub fn raw_specifiers_of(&self, path: &Path) -> &[String] {
        self.dependencies.get(path).map_or(&[], Vec::as_slice)
    }

    /// Resolved files `path` imports.
    #[must_use]
    pub fn dependencies_of(&self, path: &Path) -> &[PathBuf] {
        self.resolved.get(path).map_or(&[], Vec::as_slice)
    }

    /// Files importing `path`.
    #[must_use]
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        self.dependents
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Files whose stem `path` mentions in its content.
    #[must_use]
    pub fn mentions_of(&self, path: &Path) -> &[PathBuf] {
        self.mentions.get(path).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_hub(&self, path: &Path) -> bool {
        self.hub_files.iter().any(|h| h == path)
    }

    /// Peers sharing commits with `path`, most-shared first.
    #[must_use]
    pub fn shared_commit_peers(&self, path: &Path) -> Vec<(PathBuf, u32)> {
        let Some(peers) = self.co_commits.get(path) else {
            return Vec::new();
        };
        let mut out: Vec<(PathBuf, u32)> = peers.iter().map(|(p, c)| (p.clone(), *c)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    #[must_use]
    pub fn is_recently_committed(&self, path: &Path) -> bool {
        self.recent_files.contains(path)
    }
}
