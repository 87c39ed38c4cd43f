use crate::runtime::task::{Job, Task};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Tick-based eligibility for tick-driven loops.
///
/// A `TickGate` tags every task with the tick it was submitted in and
/// only admits tasks submitted more than `lag` ticks ago, unless the owner
/// has flagged that it has spare time this tick. Work submitted during a
/// tick therefore runs at the start of a later tick instead of stretching
/// the current one.
///
/// Clones share the same counter, so the owner can keep one clone to
/// advance ticks while the loop holds the others.
///
/// # Examples
///
/// ```rust
/// use ownerloop::{LoopBuilder, TickGate};
///
/// let gate = TickGate::new();
/// let ticked = LoopBuilder::new("server").tick_gated(&gate).build();
///
/// ticked.schedule(ticked.wrap_runnable(Box::new(|| {}))).unwrap();
/// assert!(!ticked.poll_task()); // tagged with the current tick
///
/// gate.advance();
/// assert!(ticked.poll_task());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TickGate {
    state: Arc<TickState>,
}

#[derive(Debug, Default)]
struct TickState {
    /// The current tick.
    current: AtomicU64,

    /// Whether the owner has spare time this tick.
    spare_time: AtomicBool,

    /// How many ticks a task waits after the one it was submitted in.
    lag: u64,
}

impl TickGate {
    /// Creates a gate starting at tick zero with no lag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gate that holds tasks back for `lag` extra ticks.
    pub fn with_lag(lag: u64) -> Self {
        Self {
            state: Arc::new(TickState {
                lag,
                ..TickState::default()
            }),
        }
    }

    /// Returns the current tick.
    pub fn current(&self) -> u64 {
        self.state.current.load(Ordering::Acquire)
    }

    /// Moves to the next tick and returns it.
    pub fn advance(&self) -> u64 {
        self.state.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Flags whether the owner has time to spare in the current tick.
    pub fn set_spare_time(&self, spare: bool) {
        self.state.spare_time.store(spare, Ordering::Release);
    }

    pub fn has_spare_time(&self) -> bool {
        self.state.spare_time.load(Ordering::Acquire)
    }

    /// Wrap hook: tags `job` with the current tick.
    pub fn tag(&self, job: Job) -> Task<u64> {
        Task::new(job, self.current())
    }

    /// Eligibility policy for tasks produced by [`tag`](Self::tag).
    pub fn admits(&self, task: &Task<u64>) -> bool {
        self.has_spare_time() || task.meta().saturating_add(self.state.lag) < self.current()
    }
}
