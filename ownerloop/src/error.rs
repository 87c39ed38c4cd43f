use thiserror::Error;

/// Errors returned when handing work to a loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    /// The loop has been closed and no longer accepts work.
    ///
    /// The rejected task is dropped without running.
    #[error("loop `{name}` is closed")]
    Closed { name: String },

    /// The task was dropped before it produced a result, either because
    /// it raised a fault or because the loop was closed while it was
    /// still queued.
    #[error("task on loop `{name}` was abandoned before completing")]
    Abandoned { name: String },
}
