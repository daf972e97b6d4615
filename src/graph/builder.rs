// src/graph/builder.rs
//! The full-tree analysis pass. Four passes over the enumerated files:
//! scan + mention detection, resolution + hub selection, co-commit
//! sampling, recency. Per-file I/O failures skip that file and never
//! abort the pass.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;

use crate::config::EngineConfig;
use crate::enumerate;
use crate::graph::GraphSnapshot;
use crate::history::SourceHistory;
use crate::ignore_rules::IgnoreStore;
use crate::lang;
use crate::resolve;
use crate::store::FileStore;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").unwrap());

/// Runs a complete analysis pass and returns a fresh snapshot.
#[must_use]
pub fn analyze(
    store: &dyn FileStore,
    history: &dyn SourceHistory,
    ignores: &IgnoreStore,
    config: &EngineConfig,
) -> GraphSnapshot {
    let files = enumerate::project_files(store, ignores);
    analyze_files(&files, store, history, config)
}

/// Analysis over a pre-enumerated file list (test seam).
#[must_use]
pub fn analyze_files(
    files: &[PathBuf],
    store: &dyn FileStore,
    history: &dyn SourceHistory,
    config: &EngineConfig,
) -> GraphSnapshot {
    let scanned = scan_all(files, store);
    let mentions = detect_mentions(files, &scanned);
    let (dependencies, resolved, dependents) = resolve_all(files, &scanned, store);
    let hub_files = select_hubs(files, &dependents, config);
    let co_commits = sample_co_commits(files, history, config);
    let recent_files = collect_recent(files, history, config);

    GraphSnapshot {
        files: files.to_vec(),
        dependencies,
        resolved,
        dependents,
        mentions,
        hub_files,
        co_commits,
        recent_files,
    }
}

struct ScannedFile {
    specifiers: Vec<String>,
    words: HashSet<String>,
}

/// Pass 1: read, scan raw specifiers, tokenize content into a word set
/// for mention detection. Unreadable files contribute empty entries.
fn scan_all(files: &[PathBuf], store: &dyn FileStore) -> HashMap<PathBuf, ScannedFile> {
    files
        .par_iter()
        .map(|path| {
            let content = store.read(path).unwrap_or_default();
            let specifiers = lang::scan(path, &content);
            let words = WORD_RE
                .find_iter(&content)
                .map(|m| m.as_str().to_string())
                .collect();
            (path.clone(), ScannedFile { specifiers, words })
        })
        .collect()
}

/// Whole-word basename-stem mentions; self-mentions excluded. Targets
/// kept in scan order for determinism.
fn detect_mentions(
    files: &[PathBuf],
    scanned: &HashMap<PathBuf, ScannedFile>,
) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let stems: Vec<(usize, String)> = files
        .iter()
        .enumerate()
        .filter_map(|(i, p)| Some((i, p.file_stem()?.to_str()?.to_string())))
        .collect();

    let mut mentions = BTreeMap::new();
    for (i, path) in files.iter().enumerate() {
        let Some(scan) = scanned.get(path) else {
            continue;
        };
        let targets: Vec<PathBuf> = stems
            .iter()
            .filter(|(j, stem)| *j != i && scan.words.contains(stem))
            .map(|(j, _)| files[*j].clone())
            .collect();
        if !targets.is_empty() {
            mentions.insert(path.clone(), targets);
        }
    }
    mentions
}

type ResolvedGraphs = (
    BTreeMap<PathBuf, Vec<String>>,
    BTreeMap<PathBuf, Vec<PathBuf>>,
    BTreeMap<PathBuf, BTreeSet<PathBuf>>,
);

/// Pass 2: resolve stored specifiers against the known file set and
/// invert the edges.
fn resolve_all(
    files: &[PathBuf],
    scanned: &HashMap<PathBuf, ScannedFile>,
    store: &dyn FileStore,
) -> ResolvedGraphs {
    let known: HashSet<&PathBuf> = files.iter().collect();
    let mut dependencies = BTreeMap::new();
    let mut resolved_map = BTreeMap::new();
    let mut dependents: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();

    for path in files {
        let Some(scan) = scanned.get(path) else {
            continue;
        };
        if scan.specifiers.is_empty() {
            continue;
        }
        dependencies.insert(path.clone(), scan.specifiers.clone());

        let mut targets = Vec::new();
        for spec in &scan.specifiers {
            let Some(target) = resolve::resolve(path, spec, store) else {
                continue;
            };
            if !known.contains(&target) || &target == path {
                continue;
            }
            if !targets.contains(&target) {
                dependents
                    .entry(target.clone())
                    .or_default()
                    .insert(path.clone());
                targets.push(target);
            }
        }
        if !targets.is_empty() {
            resolved_map.insert(path.clone(), targets);
        }
    }

    (dependencies, resolved_map, dependents)
}

/// Hub selection: candidates with in-degree >= 2, ordered by in-degree
/// descending with ties broken by scan order, capped at
/// `max_hub_files`. Files at or above the threshold sort first; the
/// cap is hard either way.
fn select_hubs(
    files: &[PathBuf],
    dependents: &BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    config: &EngineConfig,
) -> Vec<PathBuf> {
    let scan_index: HashMap<&PathBuf, usize> =
        files.iter().enumerate().map(|(i, p)| (p, i)).collect();

    let mut candidates: Vec<(&PathBuf, usize)> = dependents
        .iter()
        .map(|(path, importers)| (path, importers.len()))
        .filter(|(_, indeg)| *indeg >= 2)
        .collect();

    candidates.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| scan_index.get(a.0).cmp(&scan_index.get(b.0)))
    });

    candidates
        .into_iter()
        .take(config.max_hub_files)
        .map(|(path, _)| path.clone())
        .collect()
}

/// Pass 3: sample recent commits; commits touching between
/// `co_commit_min_files` and `co_commit_max_files` raw paths (the
/// merge-commit filter) contribute symmetric pair counts for the
/// currently-known files they touch.
fn sample_co_commits(
    files: &[PathBuf],
    history: &dyn SourceHistory,
    config: &EngineConfig,
) -> BTreeMap<PathBuf, BTreeMap<PathBuf, u32>> {
    let mut co_commits: BTreeMap<PathBuf, BTreeMap<PathBuf, u32>> = BTreeMap::new();
    if !history.is_available() {
        return co_commits;
    }

    let known: HashSet<&PathBuf> = files.iter().collect();
    for hash in history.recent_commit_hashes(config.commit_sample) {
        let touched = history.files_for_commit(&hash);
        if touched.len() < config.co_commit_min_files
            || touched.len() > config.co_commit_max_files
        {
            continue;
        }
        let present: Vec<&PathBuf> = touched.iter().filter(|p| known.contains(p)).collect();
        for i in 0..present.len() {
            for j in (i + 1)..present.len() {
                bump(&mut co_commits, present[i], present[j]);
                bump(&mut co_commits, present[j], present[i]);
            }
        }
    }
    co_commits
}

fn bump(map: &mut BTreeMap<PathBuf, BTreeMap<PathBuf, u32>>, a: &Path, b: &Path) {
    *map.entry(a.to_path_buf())
        .or_default()
        .entry(b.to_path_buf())
        .or_insert(0) += 1;
}

/// Pass 4: files touched within the recency window, intersected with
/// the known file set.
fn collect_recent(
    files: &[PathBuf],
    history: &dyn SourceHistory,
    config: &EngineConfig,
) -> BTreeSet<PathBuf> {
    if !history.is_available() {
        return BTreeSet::new();
    }
    let known: HashSet<&PathBuf> = files.iter().collect();
    history
        .recently_touched_files(config.recency_window_days)
        .into_iter()
        .filter(|p| known.contains(p))
        .collect()
}
