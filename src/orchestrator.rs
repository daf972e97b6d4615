// src/orchestrator.rs
//! Background analysis scheduling and the single-flight worker.
//!
//! The scheduler is a plain state machine over explicit events plus a
//! `tick` pump; timers are `Instant` deadlines that get cancelled or
//! rescheduled, never threads of their own. The worker runs at most
//! one full-tree pass at a time; concurrent submissions attach to the
//! in-flight handle instead of starting another pass. An in-flight
//! pass is never cancelled: it runs to completion or failure.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::graph::{builder, GraphSnapshot};
use crate::history::GitHistory;
use crate::ignore_rules::IgnoreStore;
use crate::store::FsFileStore;

/// What the engine should do after feeding the scheduler an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAction {
    Wait,
    Analyze,
}

/// Debounce/idle state machine. The host drives it single-threaded
/// from its watch-callback loop; there is no locking inside.
pub struct AnalysisScheduler {
    quiescence: Duration,
    inactivity: Duration,
    stale: bool,
    focused: bool,
    quiescence_deadline: Option<Instant>,
    inactivity_deadline: Option<Instant>,
}

impl AnalysisScheduler {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            quiescence: Duration::from_millis(config.quiescence_ms),
            inactivity: Duration::from_millis(config.inactivity_ms),
            stale: false,
            focused: true,
            quiescence_deadline: None,
            inactivity_deadline: None,
        }
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// A tracked filesystem change: mark stale and (re)start the
    /// quiescence timer. Any pending inactivity timer is superseded.
    pub fn note_file_change(&mut self, now: Instant) {
        self.stale = true;
        self.quiescence_deadline = Some(now + self.quiescence);
        self.inactivity_deadline = None;
    }

    /// Explicit user-activity signal: pushes a running inactivity
    /// timer out. A no-op when no inactivity timer is pending.
    pub fn note_activity(&mut self, now: Instant) {
        if self.inactivity_deadline.is_some() {
            self.inactivity_deadline = Some(now + self.inactivity);
        }
    }

    /// Focus change. Losing focus while stale with no pending
    /// quiescence timer triggers an immediate pass.
    pub fn set_focused(&mut self, focused: bool, _now: Instant) -> SchedulerAction {
        self.focused = focused;
        if !focused && self.stale && self.quiescence_deadline.is_none() {
            self.inactivity_deadline = None;
            return SchedulerAction::Analyze;
        }
        SchedulerAction::Wait
    }

    /// Timer pump. Call periodically (or whenever a deadline passes).
    pub fn tick(&mut self, now: Instant) -> SchedulerAction {
        if let Some(deadline) = self.quiescence_deadline {
            if now >= deadline {
                self.quiescence_deadline = None;
                if self.focused {
                    // Quiet but the user is still here: wait for an
                    // idle gap before burning CPU on a rebuild.
                    self.inactivity_deadline = Some(now + self.inactivity);
                } else {
                    return SchedulerAction::Analyze;
                }
            }
        }
        if let Some(deadline) = self.inactivity_deadline {
            if now >= deadline {
                self.inactivity_deadline = None;
                return SchedulerAction::Analyze;
            }
        }
        SchedulerAction::Wait
    }

    /// A pass is starting: clear staleness and all timers.
    pub fn mark_analysis_started(&mut self) {
        self.stale = false;
        self.quiescence_deadline = None;
        self.inactivity_deadline = None;
    }
}

/// Terminal result of one analysis pass. Errors cross the thread
/// boundary as strings; the orchestrator only logs them.
pub type AnalysisOutcome = Result<Arc<GraphSnapshot>, String>;

struct TaskState {
    result: Mutex<Option<AnalysisOutcome>>,
    done: Condvar,
}

/// Shared handle onto one in-flight (or finished) analysis pass.
/// Cloning attaches another subscriber; it never re-submits.
#[derive(Clone)]
pub struct AnalysisHandle {
    state: Arc<TaskState>,
}

impl AnalysisHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(TaskState {
                result: Mutex::new(None),
                done: Condvar::new(),
            }),
        }
    }

    fn complete(&self, outcome: AnalysisOutcome) {
        let mut guard = self.state.result.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(outcome);
        self.state.done.notify_all();
    }

    /// Blocks until the pass finishes.
    #[must_use]
    pub fn wait(&self) -> AnalysisOutcome {
        let mut guard = self.state.result.lock().unwrap_or_else(|e| e.into_inner());
        while guard.is_none() {
            guard = self
                .state
                .done
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
        guard.clone().expect("checked above")
    }

    /// Non-blocking probe.
    #[must_use]
    pub fn try_result(&self) -> Option<AnalysisOutcome> {
        self.state
            .result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Spawns analysis passes on a worker thread, one at a time.
#[derive(Default)]
pub struct AnalysisWorker {
    in_flight: Mutex<Option<AnalysisHandle>>,
}

impl AnalysisWorker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a pass for `root`. If one is already running, the
    /// existing handle is returned with `false` and no new pass
    /// starts; otherwise a fresh pass spawns and `true` is returned.
    ///
    /// `on_complete` runs on the worker thread, after the pass but
    /// before the handle resolves, so snapshot hand-off is finished by
    /// the time any subscriber's `wait` returns.
    pub fn submit<F>(&self, root: &Path, config: &EngineConfig, on_complete: F) -> (AnalysisHandle, bool)
    where
        F: FnOnce(&AnalysisOutcome) + Send + 'static,
    {
        let mut guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.as_ref() {
            if handle.try_result().is_none() {
                return (handle.clone(), false);
            }
        }

        let handle = AnalysisHandle::new();
        let worker_handle = handle.clone();
        let root: PathBuf = root.to_path_buf();
        let config = config.clone();
        thread::spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| run_pass(&root, &config)))
                .unwrap_or_else(|_| Err("analysis worker panicked".to_string()));
            on_complete(&outcome);
            worker_handle.complete(outcome);
        });

        *guard = Some(handle.clone());
        (handle, true)
    }
}

/// The pass itself. The worker takes only the project root and builds
/// its own fs-backed collaborators; nothing is shared with the
/// interactive side.
fn run_pass(root: &Path, config: &EngineConfig) -> AnalysisOutcome {
    let store = FsFileStore::new(root);
    let history = GitHistory::new(root);
    let ignores = IgnoreStore::discover(root, config.respect_gitignore);
    let snapshot = builder::analyze(&store, &history, &ignores, config);
    Ok(Arc::new(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> AnalysisScheduler {
        AnalysisScheduler::new(&EngineConfig::default())
    }

    #[test]
    fn change_then_quiescence_unfocused_analyzes() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.set_focused(false, t0);
        s.note_file_change(t0);

        assert_eq!(s.tick(t0 + Duration::from_millis(100)), SchedulerAction::Wait);
        assert_eq!(
            s.tick(t0 + Duration::from_millis(2_100)),
            SchedulerAction::Analyze
        );
    }

    #[test]
    fn focused_quiescence_defers_to_inactivity_timer() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_file_change(t0);

        // Quiescence elapses while focused: no analysis yet.
        assert_eq!(
            s.tick(t0 + Duration::from_millis(2_100)),
            SchedulerAction::Wait
        );
        // Activity pushes the idle deadline out.
        s.note_activity(t0 + Duration::from_millis(10_000));
        assert_eq!(
            s.tick(t0 + Duration::from_millis(33_000)),
            SchedulerAction::Wait
        );
        // Idle long enough: analyze.
        assert_eq!(
            s.tick(t0 + Duration::from_millis(40_100)),
            SchedulerAction::Analyze
        );
    }

    #[test]
    fn new_change_restarts_quiescence() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.set_focused(false, t0);
        s.note_file_change(t0);
        s.note_file_change(t0 + Duration::from_millis(1_900));

        assert_eq!(
            s.tick(t0 + Duration::from_millis(2_100)),
            SchedulerAction::Wait
        );
        assert_eq!(
            s.tick(t0 + Duration::from_millis(4_000)),
            SchedulerAction::Analyze
        );
    }

    #[test]
    fn losing_focus_while_stale_and_quiet_analyzes_immediately() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_file_change(t0);
        // Quiescence elapsed while focused; inactivity timer pending.
        assert_eq!(
            s.tick(t0 + Duration::from_millis(2_100)),
            SchedulerAction::Wait
        );

        assert_eq!(
            s.set_focused(false, t0 + Duration::from_millis(3_000)),
            SchedulerAction::Analyze
        );
    }

    #[test]
    fn losing_focus_with_pending_quiescence_waits() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_file_change(t0);
        assert_eq!(
            s.set_focused(false, t0 + Duration::from_millis(100)),
            SchedulerAction::Wait
        );
    }

    #[test]
    fn mark_started_clears_state() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.note_file_change(t0);
        s.mark_analysis_started();
        assert!(!s.is_stale());
        assert_eq!(
            s.tick(t0 + Duration::from_millis(60_000)),
            SchedulerAction::Wait
        );
    }

    #[test]
    fn concurrent_submits_share_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export {};").unwrap();

        let worker = AnalysisWorker::new();
        let config = EngineConfig::default();
        let (first, started) = worker.submit(dir.path(), &config, |_| {});
        assert!(started, "first submit starts a pass");
        let (second, _) = worker.submit(dir.path(), &config, |_| {});

        // Both handles resolve; at most one pass ran at a time.
        let a = first.wait().expect("pass succeeds");
        let b = second.wait().expect("pass succeeds");
        assert_eq!(a.files, b.files);
    }
}
