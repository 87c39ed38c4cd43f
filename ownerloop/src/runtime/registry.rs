use parking_lot::Mutex;

use std::sync::{Arc, Weak};

/// Diagnostic view of a live loop.
pub trait LoopDiagnostics: Send + Sync {
    /// The loop's name.
    fn name(&self) -> &str;

    /// Number of tasks waiting in the loop's queue.
    fn pending_count(&self) -> usize;

    /// Number of managed blocks currently active on the owner thread.
    fn blocking_depth(&self) -> usize;
}

/// Point-in-time diagnostics for one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSnapshot {
    pub name: String,
    pub pending: usize,
    pub blocking_depth: usize,
}

/// An explicit registry of live loops, for diagnostics.
///
/// Nothing registers itself: the context constructing a loop passes the
/// registry to [`LoopBuilder::registry`](crate::LoopBuilder::registry).
/// The registry only holds weak references, so it never keeps a loop
/// alive; dropped loops disappear from the next snapshot.
///
/// Cloning a registry yields another handle to the same set of loops.
#[derive(Clone, Default)]
pub struct LoopRegistry {
    loops: Arc<Mutex<Vec<Weak<dyn LoopDiagnostics>>>>,
}

impl LoopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loop, pruning entries for loops that were dropped.
    pub fn register(&self, entry: Arc<dyn LoopDiagnostics>) {
        let mut loops = self.loops.lock();
        loops.retain(|entry| entry.strong_count() > 0);
        loops.push(Arc::downgrade(&entry));
    }

    /// Returns a snapshot of every loop still alive, in registration order.
    pub fn snapshot(&self) -> Vec<LoopSnapshot> {
        let mut loops = self.loops.lock();
        loops.retain(|entry| entry.strong_count() > 0);

        loops
            .iter()
            .filter_map(Weak::upgrade)
            .map(|entry| LoopSnapshot {
                name: entry.name().to_owned(),
                pending: entry.pending_count(),
                blocking_depth: entry.blocking_depth(),
            })
            .collect()
    }

    /// Number of registered loops still alive.
    pub fn len(&self) -> usize {
        let mut loops = self.loops.lock();
        loops.retain(|entry| entry.strong_count() > 0);
        loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for LoopRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopRegistry")
            .field("loops", &self.len())
            .finish()
    }
}
