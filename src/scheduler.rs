//! Task scheduling substrate.
//!
//! The engine never sleeps or spawns on its own. Delayed work goes through
//! an injected [`TaskScheduler`]; there is no handle to cancel it, so
//! scheduled work must check for staleness itself when it runs.

use crate::error::SessionError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// Fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Category of scheduled work, used for naming and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TaskKind {
    /// Compute-heavy work such as an AI opponent's search.
    #[strum(serialize = "BoardComputerTask")]
    Computer,
    /// Game bookkeeping such as timer ticks.
    #[strum(serialize = "BoardEventsTask")]
    GameEvent,
}

/// Runs work now or after a delay.
///
/// Delays are in abstract time units; the implementation decides how long a
/// unit lasts.
pub trait TaskScheduler: Send + Sync + std::fmt::Debug {
    /// Runs `work` as soon as possible.
    fn run_task(&self, kind: TaskKind, work: Task);

    /// Runs `work` after approximately `delay` units.
    fn run_task_after(&self, delay: u32, kind: TaskKind, work: Task);
}

// ─────────────────────────────────────────────────────────────
//  Manual scheduler
// ─────────────────────────────────────────────────────────────

struct PendingTask {
    due: u64,
    seq: u64,
    kind: TaskKind,
    work: Task,
}

/// Deterministic scheduler driven by explicit calls to [`ManualScheduler::advance`].
///
/// Nothing runs until the owner advances the clock, which makes it the
/// substrate of choice for headless turn-based hosts and for tests.
#[derive(Default)]
pub struct ManualScheduler {
    now: AtomicU64,
    seq: AtomicU64,
    queue: Mutex<Vec<PendingTask>>,
}

impl ManualScheduler {
    /// Creates a scheduler at time zero with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in units.
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Advances virtual time by `units`, running every task that falls due.
    ///
    /// Tasks run in due order, ties broken by submission order. Work queued
    /// by a running task is eligible in the same call if it falls due within
    /// the window. Returns how many tasks ran.
    #[instrument(skip(self))]
    pub fn advance(&self, units: u64) -> usize {
        let target = self.now().saturating_add(units);
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            self.now.store(task.due.max(self.now()), Ordering::SeqCst);
            trace!(kind = %task.kind, due = task.due, "Running task");
            (task.work)();
            ran += 1;
        }
        self.now.store(target, Ordering::SeqCst);
        debug!(ran, now = target, "Advanced manual clock");
        ran
    }

    /// Runs everything currently due without moving the clock.
    pub fn run_ready(&self) -> usize {
        self.advance(0)
    }

    fn pop_due(&self, target: u64) -> Option<PendingTask> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let position = queue
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= target)
            .min_by_key(|(_, task)| (task.due, task.seq))
            .map(|(position, _)| position)?;
        Some(queue.remove(position))
    }

    fn enqueue(&self, due: u64, kind: TaskKind, work: Task) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PendingTask {
                due,
                seq,
                kind,
                work,
            });
    }
}

impl TaskScheduler for ManualScheduler {
    fn run_task(&self, kind: TaskKind, work: Task) {
        self.enqueue(self.now(), kind, work);
    }

    fn run_task_after(&self, delay: u32, kind: TaskKind, work: Task) {
        self.enqueue(self.now().saturating_add(u64::from(delay)), kind, work);
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────
//  Tokio scheduler
// ─────────────────────────────────────────────────────────────

/// Scheduler backed by a tokio runtime; one unit lasts `unit`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
    unit: Duration,
}

impl TokioScheduler {
    /// Creates a scheduler on an explicit runtime handle.
    pub fn new(handle: tokio::runtime::Handle, unit: Duration) -> Self {
        Self { handle, unit }
    }

    /// Creates a scheduler on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SchedulerUnavailable` outside a tokio runtime.
    #[instrument]
    pub fn current(unit: Duration) -> Result<Self, SessionError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::SchedulerUnavailable(e.to_string()))?;
        Ok(Self::new(handle, unit))
    }

    /// Length of one time unit.
    pub fn unit(&self) -> Duration {
        self.unit
    }
}

impl TaskScheduler for TokioScheduler {
    fn run_task(&self, kind: TaskKind, work: Task) {
        trace!(%kind, "Spawning blocking task");
        self.handle.spawn_blocking(work);
    }

    fn run_task_after(&self, delay: u32, kind: TaskKind, work: Task) {
        let wait = self.unit.saturating_mul(delay);
        trace!(%kind, ?wait, "Scheduling delayed task");
        let handle = self.handle.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(wait).await;
            handle.spawn_blocking(work);
        });
    }
}
