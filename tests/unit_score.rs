// tests/unit_score.rs
//! Tests for the relevance scorer: signals, two-phase seeding, and the
//! token-budget walk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use scopehound_core::config::EngineConfig;
use scopehound_core::graph::builder;
use scopehound_core::history::{NoHistory, SourceHistory};
use scopehound_core::ignore_rules::IgnoreStore;
use scopehound_core::score::signals::{self, Seed};
use scopehound_core::score::Scorer;
use scopehound_core::store::FsFileStore;
use scopehound_core::tokens::{self, Tokenizer};

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

fn write_tree(entries: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in entries {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

struct Fixture {
    _dir: tempfile::TempDir,
    store: FsFileStore,
    ignores: IgnoreStore,
    snapshot: scopehound_core::GraphSnapshot,
    config: EngineConfig,
}

fn fixture(entries: &[(&str, &str)]) -> Fixture {
    let dir = write_tree(entries);
    let store = FsFileStore::new(dir.path());
    let ignores = IgnoreStore::discover(dir.path(), true);
    let config = EngineConfig::default();
    let snapshot = builder::analyze(&store, &NoHistory, &ignores, &config);
    Fixture {
        _dir: dir,
        store,
        ignores,
        snapshot,
        config,
    }
}

/// History fake with canned commit data.
#[derive(Default)]
struct FakeHistory {
    commits_by_file: HashMap<PathBuf, Vec<String>>,
    files_by_commit: HashMap<String, Vec<PathBuf>>,
}

impl SourceHistory for FakeHistory {
    fn is_available(&self) -> bool {
        true
    }

    fn commits_for_file(&self, path: &Path, max_count: usize) -> Vec<String> {
        let mut hashes = self
            .commits_by_file
            .get(path)
            .cloned()
            .unwrap_or_default();
        hashes.truncate(max_count);
        hashes
    }

    fn files_for_commit(&self, hash: &str) -> Vec<PathBuf> {
        self.files_by_commit.get(hash).cloned().unwrap_or_default()
    }

    fn recent_commit_hashes(&self, _n: usize) -> Vec<String> {
        self.files_by_commit.keys().cloned().collect()
    }

    fn recently_touched_files(&self, _days: u32) -> Vec<PathBuf> {
        Vec::new()
    }
}

// ── signal-level tests ─────────────────────────────────────────────

#[test]
fn test_direct_dependency_scores_positively_unrelated_scores_zero() {
    let fx = fixture(&[
        ("src/a.ts", "import { b } from './b';"),
        ("src/b.ts", "export const b = 1;"),
        ("other/c.ts", "export const c = 1;"),
    ]);
    let seeds = vec![Seed::user(p("src/a.ts"))];
    let candidates = vec![p("src/b.ts"), p("other/c.ts")];

    let scores = signals::score(
        &seeds,
        &candidates,
        &fx.snapshot,
        &fx.store,
        &NoHistory,
        &[],
        &fx.config,
    );

    assert!(
        scores[&p("src/b.ts")] > 0.0,
        "Imported file must score positively"
    );
    assert_eq!(
        scores[&p("other/c.ts")], 0.0,
        "Unrelated file in another folder must score zero"
    );
}

#[test]
fn test_keyword_bonus_applies_without_seeds() {
    let fx = fixture(&[
        ("auth/LoginService.ts", "export class LoginService {}"),
        ("billing/Invoice.ts", "export class Invoice {}"),
    ]);
    let keywords = signals::task_keywords("fix login bug in auth/LoginService");
    let candidates = vec![p("auth/LoginService.ts"), p("billing/Invoice.ts")];

    let scores = signals::score(
        &[],
        &candidates,
        &fx.snapshot,
        &fx.store,
        &NoHistory,
        &keywords,
        &fx.config,
    );

    assert_eq!(
        scores[&p("auth/LoginService.ts")],
        fx.config.keyword_multi_bonus,
        "Two or more distinct keyword matches earn the larger bonus"
    );
    assert_eq!(scores[&p("billing/Invoice.ts")], 0.0);
}

#[test]
fn test_heuristic_seed_modifier_dampens_signals() {
    let fx = fixture(&[
        ("src/a.ts", "import { b } from './b';"),
        ("src/b.ts", "export const b = 1;"),
    ]);
    let candidates = vec![p("src/b.ts")];

    let user = signals::score(
        &[Seed::user(p("src/a.ts"))],
        &candidates,
        &fx.snapshot,
        &fx.store,
        &NoHistory,
        &[],
        &fx.config,
    );
    let heuristic = signals::score(
        &[Seed::heuristic(p("src/a.ts"), 0.5)],
        &candidates,
        &fx.snapshot,
        &fx.store,
        &NoHistory,
        &[],
        &fx.config,
    );

    let u = user[&p("src/b.ts")];
    let h = heuristic[&p("src/b.ts")];
    assert!(
        (h - u / 2.0).abs() < 1e-9,
        "Heuristic seeds contribute at half strength: user={u}, heuristic={h}"
    );
}

#[test]
fn test_sibling_bonus_requires_identical_stem() {
    let fx = fixture(&[
        ("src/Foo.ts", "export {};"),
        ("src/Foo.css", "/* styles */"),
        ("src/Foo.test.ts", "export {};"),
    ]);
    let seeds = vec![Seed::user(p("src/Foo.ts"))];
    let candidates = vec![p("src/Foo.css"), p("src/Foo.test.ts")];

    let scores = signals::score(
        &seeds,
        &candidates,
        &fx.snapshot,
        &fx.store,
        &NoHistory,
        &[],
        &fx.config,
    );

    let cfg = &fx.config;
    assert_eq!(
        scores[&p("src/Foo.css")],
        cfg.same_folder_bonus + cfg.sibling_bonus,
        "Foo.css shares the literal stem Foo"
    );
    assert_eq!(
        scores[&p("src/Foo.test.ts")],
        cfg.same_folder_bonus,
        "Foo.test.ts has stem Foo.test, not Foo: folder bonus only"
    );
}

#[test]
fn test_shared_commit_thresholds_apply_to_aggregate() {
    let fx = fixture(&[
        ("a.ts", "export {};"),
        ("b.ts", "export {};"),
        ("c.ts", "export {};"),
        ("d.ts", "export {};"),
        ("peer.ts", "export {};"),
    ]);

    let mut history = FakeHistory::default();
    for (seed, hash) in [("a.ts", "h1"), ("b.ts", "h2"), ("c.ts", "h3")] {
        history
            .commits_by_file
            .insert(p(seed), vec![hash.to_string()]);
        history
            .files_by_commit
            .insert(hash.to_string(), vec![p(seed), p("peer.ts")]);
    }
    history
        .commits_by_file
        .insert(p("d.ts"), vec!["h4".to_string()]);
    history
        .files_by_commit
        .insert("h4".to_string(), vec![p("d.ts"), p("c.ts")]);

    // Three user seeds each share a commit with peer.ts: aggregate 3.0
    // hits the multi threshold.
    let seeds = vec![
        Seed::user(p("a.ts")),
        Seed::user(p("b.ts")),
        Seed::user(p("c.ts")),
    ];
    let scores = signals::score(
        &seeds,
        &[p("peer.ts")],
        &fx.snapshot,
        &fx.store,
        &history,
        &[],
        &fx.config,
    );
    assert_eq!(scores[&p("peer.ts")], fx.config.commit_multi_bonus);

    // A single seed sharing one commit stays below the threshold.
    let single = signals::score(
        &[Seed::user(p("d.ts"))],
        &[p("c.ts")],
        &fx.snapshot,
        &fx.store,
        &history,
        &[],
        &fx.config,
    );
    assert_eq!(single[&p("c.ts")], fx.config.commit_single_bonus);
}

// ── calculate_context tests ────────────────────────────────────────

#[test]
fn test_scoring_is_idempotent() {
    let fx = fixture(&[
        ("src/a.ts", "import { b } from './b';"),
        ("src/b.ts", "export const b = 1;"),
        ("src/util.ts", "export const u = 1;"),
        ("docs/readme.md", "see util for helpers"),
    ]);
    let scorer = Scorer {
        snapshot: &fx.snapshot,
        store: &fx.store,
        history: &NoHistory,
        ignores: &fx.ignores,
        config: &fx.config,
    };
    let selection = vec![p("src/a.ts")];

    let first = scorer.calculate_context(&selection, Some("tidy util helpers"));
    let second = scorer.calculate_context(&selection, Some("tidy util helpers"));

    assert_eq!(first.all_neighbors, second.all_neighbors);
    assert_eq!(first.prompt_neighbors, second.prompt_neighbors);
    assert_eq!(first.heuristic_seed_files, second.heuristic_seed_files);
}

#[test]
fn test_empty_selection_with_task_text_promotes_keyword_match() {
    let fx = fixture(&[
        ("auth/LoginService.ts", "export class LoginService {}"),
        ("billing/Invoice.ts", "export class Invoice {}"),
    ]);
    let scorer = Scorer {
        snapshot: &fx.snapshot,
        store: &fx.store,
        history: &NoHistory,
        ignores: &fx.ignores,
        config: &fx.config,
    };

    let result = scorer.calculate_context(&[], Some("fix login bug in auth/LoginService"));

    assert!(
        result
            .heuristic_seed_files
            .contains(&p("auth/LoginService.ts")),
        "Keyword-matched file must be promoted even with an empty selection: {:?}",
        result.heuristic_seed_files
    );
    assert!(!result
        .heuristic_seed_files
        .contains(&p("billing/Invoice.ts")));
}

#[test]
fn test_large_selection_skips_seed_basket() {
    let fx = fixture(&[
        ("a.ts", "export {};"),
        ("b.ts", "export {};"),
        ("c.ts", "export {};"),
        ("d.ts", "export {};"),
    ]);
    let scorer = Scorer {
        snapshot: &fx.snapshot,
        store: &fx.store,
        history: &NoHistory,
        ignores: &fx.ignores,
        config: &fx.config,
    };

    // Three selected files exceed the threshold of two: no phase one.
    let result = scorer.calculate_context(&[p("a.ts"), p("b.ts"), p("c.ts")], None);
    assert!(result.heuristic_seed_files.is_empty());
}

#[test]
fn test_token_budget_boundary_terminates_walk() {
    let small = "export const tiny = 1;\n";
    let big = "export const filler = 1;\n".repeat(400);
    let dir = write_tree(&[
        ("main.ts", "import './aa'; import './bb'; import './cc';"),
        ("aa.ts", small),
        ("bb.ts", big.as_str()),
        ("cc.ts", small),
    ]);
    let store = FsFileStore::new(dir.path());
    let ignores = IgnoreStore::discover(dir.path(), true);

    let mut config = EngineConfig::default();
    // No heuristic seeds: the basket is exactly the selection.
    config.seed_basket_target = 1;

    let cost = |content: &str| {
        Tokenizer::count(tokens::preview(content, config.preview_max_chars))
    };
    let cost_aa = cost(small);
    let cost_bb = cost(&big);
    assert!(cost_bb > cost_aa + 1, "fixture needs an oversized middle file");
    // aa fits; bb overflows; cc would fit in the remainder but must
    // never be reached.
    config.prompt_token_budget = cost_aa + cost_bb - 1;

    let snapshot = builder::analyze(&store, &NoHistory, &ignores, &config);
    let scorer = Scorer {
        snapshot: &snapshot,
        store: &store,
        history: &NoHistory,
        ignores: &ignores,
        config: &config,
    };

    let result = scorer.calculate_context(&[p("main.ts")], None);

    // All three candidates score identically (direct dependency +
    // same-folder), so the deterministic tie-break orders them
    // aa, bb, cc.
    let ranked: Vec<&PathBuf> = result.all_neighbors.iter().map(|(p, _)| p).collect();
    assert_eq!(ranked, vec![&p("aa.ts"), &p("bb.ts"), &p("cc.ts")]);

    assert_eq!(
        result.prompt_neighbors,
        vec![p("aa.ts")],
        "The first overflow must end the walk; no skip-ahead to cc.ts"
    );
}

#[test]
fn test_minimum_score_filters_weak_candidates() {
    let fx = fixture(&[
        ("src/a.ts", "import { b } from './b';"),
        ("src/b.ts", "export const b = 1;"),
        ("far/away.ts", "export {};"),
    ]);
    let mut config = fx.config.clone();
    config.seed_basket_target = 1;

    let scorer = Scorer {
        snapshot: &fx.snapshot,
        store: &fx.store,
        history: &NoHistory,
        ignores: &fx.ignores,
        config: &config,
    };
    let result = scorer.calculate_context(&[p("src/a.ts")], None);

    let names: Vec<&PathBuf> = result.all_neighbors.iter().map(|(p, _)| p).collect();
    assert!(names.contains(&&p("src/b.ts")));
    assert!(
        !names.contains(&&p("far/away.ts")),
        "Zero-signal candidates fall below the minimum score"
    );
}
