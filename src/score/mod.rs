// src/score/mod.rs
//! Relevance scoring: two phases sharing one pure routine, then a
//! token-budgeted selection walk.
//!
//! Sparse selections (one or two files) starve the pure dependency and
//! mention signals, so a first phase promotes the strongest neighbors
//! of the selection into a heuristic seed basket before the final
//! scoring round.

pub mod signals;

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::enumerate;
use crate::graph::GraphSnapshot;
use crate::history::SourceHistory;
use crate::ignore_rules::IgnoreStore;
use crate::store::FileStore;
use crate::tokens::{self, Tokenizer};

pub use signals::{Seed, ScoreMap};

/// Result of one relevance request.
#[derive(Debug, Clone, Default)]
pub struct ContextResult {
    /// The caller's selection, echoed back.
    pub user_selected: Vec<PathBuf>,
    /// Files promoted into the seed basket by phase one.
    pub heuristic_seed_files: Vec<PathBuf>,
    /// Full filtered, sorted ranking, independent of the budget.
    pub all_neighbors: Vec<(PathBuf, f64)>,
    /// The budget-constrained prefix actually offered for the prompt.
    pub prompt_neighbors: Vec<PathBuf>,
}

/// One scoring call. Borrows the snapshot reference once; concurrent
/// snapshot replacement between calls is fine.
pub struct Scorer<'a> {
    pub snapshot: &'a GraphSnapshot,
    pub store: &'a dyn FileStore,
    pub history: &'a dyn SourceHistory,
    pub ignores: &'a IgnoreStore,
    pub config: &'a EngineConfig,
}

impl Scorer<'_> {
    /// Ranks and budget-selects neighbors for `selection`.
    #[must_use]
    pub fn calculate_context(
        &self,
        selection: &[PathBuf],
        task_text: Option<&str>,
    ) -> ContextResult {
        let universe = enumerate::project_files(self.store, self.ignores);
        let keywords = task_text.map(signals::task_keywords).unwrap_or_default();

        let (seeds, heuristic_seed_files) = self.build_seed_basket(selection, &universe, &keywords);

        let basket_paths: HashSet<&PathBuf> = seeds.iter().map(|s| &s.path).collect();
        let candidates: Vec<PathBuf> = universe
            .iter()
            .filter(|p| !basket_paths.contains(p))
            .cloned()
            .collect();

        let scores = self.score(&seeds, &candidates, &keywords);

        let all_neighbors: Vec<(PathBuf, f64)> = signals::sorted_entries(&scores)
            .into_iter()
            .filter(|(_, s)| *s >= self.config.min_relevance_score)
            .collect();

        let prompt_neighbors = self.walk_budget(&all_neighbors);

        ContextResult {
            user_selected: selection.to_vec(),
            heuristic_seed_files,
            all_neighbors,
            prompt_neighbors,
        }
    }

    /// Phase one. Only sparse selections get heuristic seeds; the
    /// basket never grows past its target size.
    fn build_seed_basket(
        &self,
        selection: &[PathBuf],
        universe: &[PathBuf],
        keywords: &[String],
    ) -> (Vec<Seed>, Vec<PathBuf>) {
        let mut seeds: Vec<Seed> = selection.iter().cloned().map(Seed::user).collect();
        let mut heuristic_files = Vec::new();

        if selection.len() > self.config.seed_selection_threshold {
            return (seeds, heuristic_files);
        }

        let selected: HashSet<&PathBuf> = selection.iter().collect();
        let candidates: Vec<PathBuf> = universe
            .iter()
            .filter(|p| !selected.contains(p))
            .cloned()
            .collect();

        let scores = self.score(&seeds, &candidates, keywords);
        for (path, score) in signals::sorted_entries(&scores) {
            if seeds.len() >= self.config.seed_basket_target {
                break;
            }
            if score <= 0.0 {
                break;
            }
            heuristic_files.push(path.clone());
            seeds.push(Seed::heuristic(path, self.config.heuristic_seed_modifier));
        }

        (seeds, heuristic_files)
    }

    fn score(&self, seeds: &[Seed], candidates: &[PathBuf], keywords: &[String]) -> ScoreMap {
        signals::score(
            seeds,
            candidates,
            self.snapshot,
            self.store,
            self.history,
            keywords,
            self.config,
        )
    }

    /// Budget walk over the ranked list. Each accepted candidate
    /// contributes its preview's token count; the first candidate that
    /// would overflow the budget terminates the walk entirely, with no
    /// skip-ahead to smaller files further down. Unreadable candidates
    /// are skipped.
    fn walk_budget(&self, ranked: &[(PathBuf, f64)]) -> Vec<PathBuf> {
        let mut accepted = Vec::new();
        let mut spent = 0usize;

        for (path, _) in ranked {
            let Ok(content) = self.store.read(path) else {
                continue;
            };
            let preview = tokens::preview(&content, self.config.preview_max_chars);
            let cost = Tokenizer::count(preview);
            if spent + cost > self.config.prompt_token_budget {
                break;
            }
            spent += cost;
            accepted.push(path.clone());
        }

        accepted
    }
}
