// src/config.rs
//! Engine tunables. Everything that shapes ranking or scheduling lives
//! here so the heuristics stay configuration, not hard-coded semantics.

use std::path::Path;

use serde::Deserialize;

/// Name of the local override file, read from the project root.
pub const CONFIG_FILE: &str = "scopehound.toml";

/// Reserved metadata directory at the project root. Never scanned,
/// never descended into; holds the graph cache artifact.
pub const META_DIR: &str = ".scopehound";

/// Primary ignore spec file name (overrides `.gitignore` per directory).
pub const PRIMARY_IGNORE_FILE: &str = ".houndignore";

/// Fallback VCS-style ignore spec file name.
pub const FALLBACK_IGNORE_FILE: &str = ".gitignore";

/// Extensions that count as project source for graph purposes.
pub const CODE_EXT_PATTERN: &str =
    r"(?i)\.(ts|tsx|js|jsx|mjs|cjs|py|css|scss|less|json|toml|yaml|yml|md|html)$";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Scoring
    pub seed_selection_threshold: usize,
    pub seed_basket_target: usize,
    pub heuristic_seed_modifier: f64,
    pub keyword_multi_bonus: f64,
    pub keyword_single_bonus: f64,
    pub hub_bonus: f64,
    pub commit_multi_bonus: f64,
    pub commit_single_bonus: f64,
    pub co_commit_multi_threshold: f64,
    pub dependency_bonus: f64,
    pub mention_bonus: f64,
    pub same_folder_bonus: f64,
    pub sibling_bonus: f64,
    pub min_relevance_score: f64,
    pub prompt_token_budget: usize,
    pub preview_max_chars: usize,
    pub commits_per_seed: usize,

    // Graph building
    pub hub_in_degree_threshold: usize,
    pub max_hub_files: usize,
    pub commit_sample: usize,
    pub co_commit_min_files: usize,
    pub co_commit_max_files: usize,
    pub recency_window_days: u32,

    // Ignore resolution
    pub respect_gitignore: bool,

    // Scheduling
    pub quiescence_ms: u64,
    pub inactivity_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_selection_threshold: 2,
            seed_basket_target: 5,
            heuristic_seed_modifier: 0.5,
            keyword_multi_bonus: 10.0,
            keyword_single_bonus: 4.0,
            hub_bonus: 2.0,
            commit_multi_bonus: 8.0,
            commit_single_bonus: 3.0,
            co_commit_multi_threshold: 3.0,
            dependency_bonus: 10.0,
            mention_bonus: 6.0,
            same_folder_bonus: 3.0,
            sibling_bonus: 5.0,
            min_relevance_score: 2.0,
            prompt_token_budget: 6_000,
            preview_max_chars: 1_500,
            commits_per_seed: 10,
            hub_in_degree_threshold: 5,
            max_hub_files: 20,
            commit_sample: 200,
            co_commit_min_files: 2,
            co_commit_max_files: 19,
            recency_window_days: 14,
            respect_gitignore: true,
            quiescence_ms: 2_000,
            inactivity_ms: 30_000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config with local overrides from `scopehound.toml` in
    /// `root`, if present. A missing or unparseable file yields defaults.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();
        let path = root.join(CONFIG_FILE);
        if let Ok(content) = std::fs::read_to_string(&path) {
            config.apply_toml(&content);
        }
        config
    }

    /// Applies overrides from TOML content. Unknown keys are ignored;
    /// malformed content leaves the config untouched.
    pub fn apply_toml(&mut self, content: &str) {
        let Ok(overlay) = toml::from_str::<ConfigOverlay>(content) else {
            log::warn!("ignoring malformed {CONFIG_FILE}");
            return;
        };
        overlay.apply(self);
    }
}

/// Serde shadow of the user-tunable subset of [`EngineConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    ranking: RankingOverlay,
    graph: GraphOverlay,
    scheduler: SchedulerOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RankingOverlay {
    min_relevance_score: Option<f64>,
    prompt_token_budget: Option<usize>,
    seed_basket_target: Option<usize>,
    co_commit_multi_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphOverlay {
    hub_in_degree_threshold: Option<usize>,
    max_hub_files: Option<usize>,
    commit_sample: Option<usize>,
    co_commit_min_files: Option<usize>,
    co_commit_max_files: Option<usize>,
    recency_window_days: Option<u32>,
    respect_gitignore: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SchedulerOverlay {
    quiescence_ms: Option<u64>,
    inactivity_ms: Option<u64>,
}

impl ConfigOverlay {
    fn apply(&self, config: &mut EngineConfig) {
        let r = &self.ranking;
        set(&mut config.min_relevance_score, r.min_relevance_score);
        set(&mut config.prompt_token_budget, r.prompt_token_budget);
        set(&mut config.seed_basket_target, r.seed_basket_target);
        set(
            &mut config.co_commit_multi_threshold,
            r.co_commit_multi_threshold,
        );

        let g = &self.graph;
        set(
            &mut config.hub_in_degree_threshold,
            g.hub_in_degree_threshold,
        );
        set(&mut config.max_hub_files, g.max_hub_files);
        set(&mut config.commit_sample, g.commit_sample);
        set(&mut config.co_commit_min_files, g.co_commit_min_files);
        set(&mut config.co_commit_max_files, g.co_commit_max_files);
        set(&mut config.recency_window_days, g.recency_window_days);
        set(&mut config.respect_gitignore, g.respect_gitignore);

        let s = &self.scheduler;
        set(&mut config.quiescence_ms, s.quiescence_ms);
        set(&mut config.inactivity_ms, s.inactivity_ms);
    }
}

fn set<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}
