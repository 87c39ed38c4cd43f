use std::fmt;

/// A plain unit of work handed to a loop.
///
/// Jobs are fire-and-forget closures. Anything that needs to report a
/// result back does so through a [`Completer`](super::Completer) captured
/// by the closure.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A queued unit of deferred work.
///
/// A `Task` pairs a [`Job`] with metadata `M` attached by the loop's wrap
/// hook at submission time. The metadata is what eligibility policies look
/// at when deciding whether the task may run yet (for instance the tick it
/// was submitted in). Loops that do not tag their work use `M = ()`.
///
/// A task is consumed exactly once: either it is run by the owner thread or
/// it is dropped when the queue is torn down.
pub struct Task<M = ()> {
    /// The work itself.
    job: Job,

    /// Scheduler-specific data attached when the task was wrapped.
    meta: M,
}

impl<M> Task<M> {
    /// Creates a task from a job and its metadata.
    pub fn new(job: Job, meta: M) -> Self {
        Self { job, meta }
    }

    /// Returns the metadata attached to this task.
    pub fn meta(&self) -> &M {
        &self.meta
    }

    /// Splits the task back into its job and metadata.
    pub fn into_parts(self) -> (Job, M) {
        (self.job, self.meta)
    }

    /// Runs the job, consuming the task.
    pub(crate) fn run(self) {
        (self.job)()
    }
}

impl Task<()> {
    /// Wraps a job with no metadata. This is the identity wrap.
    pub fn plain(job: Job) -> Self {
        Self::new(job, ())
    }
}

impl<M: fmt::Debug> fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_task_runs_its_job_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();

        let task = Task::plain(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        task.run();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_keeps_metadata() {
        let task = Task::new(Box::new(|| {}), 7u64);
        assert_eq!(*task.meta(), 7);

        let (_job, meta) = task.into_parts();
        assert_eq!(meta, 7);
    }

    #[test]
    fn test_task_debug_shows_metadata() {
        let task = Task::new(Box::new(|| {}), "tick-3");
        assert!(format!("{:?}", task).contains("tick-3"));
    }
}
