// src/score/signals.rs
//! The pure scoring routine. Both scoring phases call this one
//! function; the signal weights all come from `EngineConfig`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::graph::GraphSnapshot;
use crate::history::SourceHistory;
use crate::lang;
use crate::resolve;
use crate::store::FileStore;

/// One file supplying scoring signals for a request. User-selected
/// seeds carry modifier 1.0; heuristic additions are dampened.
#[derive(Debug, Clone)]
pub struct Seed {
    pub path: PathBuf,
    pub modifier: f64,
}

impl Seed {
    #[must_use]
    pub fn user(path: PathBuf) -> Self {
        Self {
            path,
            modifier: 1.0,
        }
    }

    #[must_use]
    pub fn heuristic(path: PathBuf, modifier: f64) -> Self {
        Self { path, modifier }
    }
}

pub type ScoreMap = HashMap<PathBuf, f64>;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "into", "onto", "when", "where", "what",
    "how", "why", "are", "was", "were", "will", "would", "should", "could", "has", "have", "had",
    "not", "but", "all", "any", "its", "can", "you", "your", "our", "out", "use", "using", "about",
];

/// Splits task text into lowercase keyword tokens, dropping stop words
/// and anything shorter than three characters.
#[must_use]
pub fn task_keywords(task_text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    task_text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .map(str::to_lowercase)
        .filter(|t| t.len() >= 3 && !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Scores `candidates` against `seeds`. Signals are additive per
/// candidate; per-seed signals are weighted by the seed's modifier.
#[must_use]
pub fn score(
    seeds: &[Seed],
    candidates: &[PathBuf],
    snapshot: &GraphSnapshot,
    store: &dyn FileStore,
    history: &dyn SourceHistory,
    keywords: &[String],
    config: &EngineConfig,
) -> ScoreMap {
    let mut scores: ScoreMap = candidates.iter().map(|c| (c.clone(), 0.0)).collect();

    apply_seed_independent(&mut scores, candidates, snapshot, keywords, config);
    apply_shared_commits(&mut scores, seeds, candidates, history, config);
    apply_per_seed(&mut scores, seeds, candidates, snapshot, store, config);

    scores
}

/// Keyword and hub bonuses do not depend on any seed.
fn apply_seed_independent(
    scores: &mut ScoreMap,
    candidates: &[PathBuf],
    snapshot: &GraphSnapshot,
    keywords: &[String],
    config: &EngineConfig,
) {
    for candidate in candidates {
        let mut bonus = 0.0;

        if !keywords.is_empty() {
            let path_str = candidate.to_string_lossy().to_lowercase();
            let matched = keywords.iter().filter(|k| path_str.contains(*k)).count();
            if matched >= 2 {
                bonus += config.keyword_multi_bonus;
            } else if matched == 1 {
                bonus += config.keyword_single_bonus;
            }
        }

        if snapshot.is_hub(candidate) {
            bonus += config.hub_bonus;
        }

        if bonus > 0.0 {
            if let Some(s) = scores.get_mut(candidate) {
                *s += bonus;
            }
        }
    }
}

/// Per seed: union the files of its bounded recent commits. The bonus
/// thresholds apply to the modifier-weighted aggregate across all
/// seeds, not per seed.
fn apply_shared_commits(
    scores: &mut ScoreMap,
    seeds: &[Seed],
    candidates: &[PathBuf],
    history: &dyn SourceHistory,
    config: &EngineConfig,
) {
    if !history.is_available() {
        return;
    }

    let mut touch_counts: HashMap<&PathBuf, f64> = HashMap::new();
    for seed in seeds {
        let hashes = history.commits_for_file(&seed.path, config.commits_per_seed);
        if hashes.is_empty() {
            continue;
        }
        let mut union: HashSet<PathBuf> = HashSet::new();
        for hash in hashes {
            union.extend(history.files_for_commit(&hash));
        }
        for candidate in candidates {
            if union.contains(candidate) {
                *touch_counts.entry(candidate).or_insert(0.0) += seed.modifier;
            }
        }
    }

    for (candidate, count) in touch_counts {
        let bonus = if count >= config.co_commit_multi_threshold {
            config.commit_multi_bonus
        } else {
            config.commit_single_bonus
        };
        if let Some(s) = scores.get_mut(candidate) {
            *s += bonus;
        }
    }
}

fn apply_per_seed(
    scores: &mut ScoreMap,
    seeds: &[Seed],
    candidates: &[PathBuf],
    snapshot: &GraphSnapshot,
    store: &dyn FileStore,
    config: &EngineConfig,
) {
    for seed in seeds {
        apply_direct_dependencies(scores, seed, store, config);
        apply_mentions(scores, seed, snapshot, config);
        apply_locality(scores, seed, candidates, config);
    }
}

/// Live scan + resolve of the seed's own imports: the selection may be
/// newer than the snapshot, so this signal never goes through the
/// cached graph. Read failures skip the seed silently.
fn apply_direct_dependencies(
    scores: &mut ScoreMap,
    seed: &Seed,
    store: &dyn FileStore,
    config: &EngineConfig,
) {
    let Ok(content) = store.read(&seed.path) else {
        return;
    };
    for specifier in lang::scan(&seed.path, &content) {
        let Some(target) = resolve::resolve(&seed.path, &specifier, store) else {
            continue;
        };
        if let Some(s) = scores.get_mut(&target) {
            *s += config.dependency_bonus * seed.modifier;
        }
    }
}

fn apply_mentions(
    scores: &mut ScoreMap,
    seed: &Seed,
    snapshot: &GraphSnapshot,
    config: &EngineConfig,
) {
    for mentioned in snapshot.mentions_of(&seed.path) {
        if let Some(s) = scores.get_mut(mentioned) {
            *s += config.mention_bonus * seed.modifier;
        }
    }
}

/// Same parent directory earns the folder bonus; an identical raw
/// filename stem stacks the sibling bonus on top. Stems are compared
/// literally: `Foo.ts` and `Foo.test.ts` do not match.
fn apply_locality(scores: &mut ScoreMap, seed: &Seed, candidates: &[PathBuf], config: &EngineConfig) {
    let seed_dir = seed.path.parent();
    let seed_stem = seed.path.file_stem();

    for candidate in candidates {
        if candidate.parent() != seed_dir {
            continue;
        }
        let mut bonus = config.same_folder_bonus;
        if seed_stem.is_some() && candidate.file_stem() == seed_stem {
            bonus += config.sibling_bonus;
        }
        if let Some(s) = scores.get_mut(candidate) {
            *s += bonus * seed.modifier;
        }
    }
}

/// Deterministic descending order: score first, path as tie-break.
#[must_use]
pub fn sorted_entries(scores: &ScoreMap) -> Vec<(PathBuf, f64)> {
    let mut entries: Vec<(PathBuf, f64)> = scores.iter().map(|(p, s)| (p.clone(), *s)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries
}
