// src/engine.rs
//! The engine facade: one explicit context object owning every
//! component. No global mutable state anywhere; hosts construct one
//! `ContextEngine` per project and hand it events.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::graph::{cache, GraphSnapshot};
use crate::history::GitHistory;
use crate::ignore_rules::IgnoreStore;
use crate::orchestrator::{AnalysisHandle, AnalysisScheduler, AnalysisWorker, SchedulerAction};
use crate::score::{ContextResult, Scorer};
use crate::store::FsFileStore;

/// Progress notifications for hosts that surface analysis activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisEvent {
    Started,
    Finished { success: bool },
}

type EventListener = Box<dyn Fn(AnalysisEvent) + Send + Sync>;

pub struct ContextEngine {
    root: PathBuf,
    config: EngineConfig,
    store: Arc<FsFileStore>,
    history: Arc<GitHistory>,
    ignores: Arc<Mutex<IgnoreStore>>,
    /// The current snapshot, swapped atomically on analysis success.
    snapshot: Arc<Mutex<Arc<GraphSnapshot>>>,
    scheduler: Mutex<AnalysisScheduler>,
    worker: Arc<AnalysisWorker>,
    listeners: Arc<Mutex<Vec<EventListener>>>,
}

impl ContextEngine {
    /// Builds an engine for `root`. A well-formed cache artifact loads
    /// in place of a fresh pass; otherwise a background pass starts
    /// immediately.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: EngineConfig) -> Self {
        let root = root.into();
        let engine = Self {
            store: Arc::new(FsFileStore::new(&root)),
            history: Arc::new(GitHistory::new(&root)),
            ignores: Arc::new(Mutex::new(IgnoreStore::discover(
                &root,
                config.respect_gitignore,
            ))),
            snapshot: Arc::new(Mutex::new(Arc::new(GraphSnapshot::default()))),
            scheduler: Mutex::new(AnalysisScheduler::new(&config)),
            worker: Arc::new(AnalysisWorker::new()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            root,
            config,
        };
        engine.bootstrap();
        engine
    }

    /// Switches the engine to a new project root, atomically
    /// invalidating everything derived from the old one (ignore rules,
    /// snapshot, scheduler state) before reloading.
    pub fn set_base_dir(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        self.store = Arc::new(FsFileStore::new(&root));
        self.history = Arc::new(GitHistory::new(&root));
        self.ignores = Arc::new(Mutex::new(IgnoreStore::discover(
            &root,
            self.config.respect_gitignore,
        )));
        *lock_plain(&self.snapshot) = Arc::new(GraphSnapshot::default());
        *lock_plain(&self.scheduler) = AnalysisScheduler::new(&self.config);
        self.root = root;
        self.bootstrap();
    }

    fn bootstrap(&self) {
        if let Some(snapshot) = cache::load(&self.root) {
            *lock_plain(&self.snapshot) = Arc::new(snapshot);
        } else {
            self.start_analysis();
        }
    }

    /// Current snapshot reference; one clone per call, tolerant of
    /// concurrent replacement between calls.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        lock_plain(&self.snapshot).clone()
    }

    /// Ranks and budget-selects context neighbors for a selection.
    #[must_use]
    pub fn calculate_context(
        &self,
        selection: &[PathBuf],
        task_text: Option<&str>,
    ) -> ContextResult {
        let snapshot = self.snapshot();
        let ignores = lock_plain(&self.ignores);
        let scorer = Scorer {
            snapshot: &snapshot,
            store: self.store.as_ref(),
            history: self.history.as_ref(),
            ignores: &ignores,
            config: &self.config,
        };
        scorer.calculate_context(selection, task_text)
    }

    #[must_use]
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        lock_plain(&self.ignores).is_ignored(path, is_dir)
    }

    /// Adds an ignore pattern for `path` and rediscovers rules.
    /// Returns false for duplicates or write failures.
    pub fn add_ignore_pattern(&self, path: &Path, match_all_by_name: bool) -> bool {
        lock_plain(&self.ignores).add_pattern(path, match_all_by_name)
    }

    #[must_use]
    pub fn hub_files(&self) -> Vec<PathBuf> {
        self.snapshot().hub_files.clone()
    }

    #[must_use]
    pub fn dependents_for_file(&self, path: &Path) -> Vec<PathBuf> {
        self.snapshot().dependents_of(path)
    }

    #[must_use]
    pub fn shared_commit_peers(&self, path: &Path) -> Vec<(PathBuf, u32)> {
        self.snapshot().shared_commit_peers(path)
    }

    /// Registers a progress listener.
    pub fn subscribe(&self, listener: impl Fn(AnalysisEvent) + Send + Sync + 'static) {
        lock_plain(&self.listeners).push(Box::new(listener));
    }

    // ── Orchestration events ────────────────────────────────────────

    /// A tracked filesystem change was observed.
    pub fn on_file_event(&self) {
        lock_plain(&self.scheduler).note_file_change(Instant::now());
    }

    /// User activity in the interactive surface.
    pub fn on_activity(&self) {
        lock_plain(&self.scheduler).note_activity(Instant::now());
    }

    /// The interactive surface gained or lost focus.
    pub fn on_focus_changed(&self, focused: bool) {
        let action = lock_plain(&self.scheduler).set_focused(focused, Instant::now());
        if action == SchedulerAction::Analyze {
            self.start_analysis();
        }
    }

    /// Timer pump; hosts call this from their event loop.
    pub fn tick(&self) {
        let action = lock_plain(&self.scheduler).tick(Instant::now());
        if action == SchedulerAction::Analyze {
            self.start_analysis();
        }
    }

    /// Bypasses all timers and runs a pass now (or attaches to the
    /// in-flight one). The returned handle can be waited on.
    pub fn force_reanalyze(&self) -> AnalysisHandle {
        self.start_analysis()
    }

    fn start_analysis(&self) -> AnalysisHandle {
        lock_plain(&self.scheduler).mark_analysis_started();

        let cell = Arc::clone(&self.snapshot);
        let listeners = Arc::clone(&self.listeners);
        let root = self.root.clone();
        // The hook runs on the worker thread before the handle
        // resolves, so anyone waiting on the handle observes the
        // swapped snapshot.
        let (handle, newly_started) =
            self.worker
                .submit(&self.root, &self.config, move |outcome| match outcome {
                    Ok(snapshot) => {
                        *cell.lock().unwrap_or_else(|e| e.into_inner()) = Arc::clone(snapshot);
                        if let Err(e) = cache::save(&root, snapshot) {
                            log::warn!("failed to persist graph cache: {e}");
                        }
                        emit_to(&listeners, AnalysisEvent::Finished { success: true });
                    }
                    Err(e) => {
                        // Previous snapshot stays; the completion
                        // signal still fires so waiters never hang.
                        log::warn!("analysis pass failed: {e}");
                        emit_to(&listeners, AnalysisEvent::Finished { success: false });
                    }
                });
        if newly_started {
            self.emit(AnalysisEvent::Started);
        }
        handle
    }

    fn emit(&self, event: AnalysisEvent) {
        emit_to(&self.listeners, event);
    }
}

fn emit_to(listeners: &Arc<Mutex<Vec<EventListener>>>, event: AnalysisEvent) {
    for listener in lock_plain(listeners).iter() {
        listener(event);
    }
}

fn lock_plain<T>(cell: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(|e| e.into_inner())
}
