use crate::LoopError;
use crate::runtime::task::{Completer, Job, TaskHandle};

/// The minimal capability set of anything that accepts work.
///
/// Both the full [`OwnerLoop`](crate::OwnerLoop) and the lightweight
/// [`ExecutorAdapter`](crate::ExecutorAdapter) implement it, so a
/// collaborator that only needs to hand work off can be written against
/// this trait and plugged into either.
pub trait Executor: Send + Sync {
    /// The executor's native task representation.
    type Task: Send + 'static;

    /// Diagnostic identifier, used in fault logs.
    fn name(&self) -> &str;

    /// Enqueues a task. Safe to call from any thread.
    fn schedule(&self, task: Self::Task) -> Result<(), LoopError>;

    /// Converts a plain job into the executor's task representation.
    fn wrap_runnable(&self, job: Job) -> Self::Task;

    /// Best-effort teardown. Does nothing by default.
    fn close(&self) {}

    /// Wraps `work` and schedules it.
    fn tell<F>(&self, work: F) -> Result<(), LoopError>
    where
        F: FnOnce() + Send + 'static,
        Self: Sized,
    {
        self.schedule(self.wrap_runnable(Box::new(work)))
    }

    /// Schedules a job built around a fresh [`Completer`] and returns the
    /// matching handle.
    ///
    /// `build` receives the write side of the result cell and returns the
    /// job that will eventually complete it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ownerloop::{Executor, wrap_executor};
    ///
    /// let inline = wrap_executor("inline", |job: ownerloop::Job| job());
    /// let handle = inline
    ///     .ask(|done| Box::new(move || done.complete(6 * 7)))
    ///     .unwrap();
    ///
    /// assert_eq!(handle.get(), Some(&42));
    /// ```
    fn ask<T, F>(&self, build: F) -> Result<TaskHandle<T>, LoopError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Completer<T>) -> Job,
        Self: Sized,
    {
        let (handle, completer) = TaskHandle::pending();

        self.schedule(self.wrap_runnable(build(completer)))?;
        Ok(handle)
    }
}
