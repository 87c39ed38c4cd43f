use crate::LoopError;
use crate::runtime::executor::Executor;
use crate::runtime::task::Job;

use std::fmt;

/// An [`Executor`] over any "accept one unit of work" function.
///
/// The adapter has no queue of its own: tasks are jobs (identity wrap) and
/// `schedule` hands them straight to the acceptor. It exists so that
/// collaborators written against [`Executor`] can run on a thread pool, a
/// channel, or inline, without an [`OwnerLoop`](crate::OwnerLoop).
pub struct ExecutorAdapter<F> {
    name: String,
    acceptor: F,
}

/// Wraps `acceptor` as a named [`Executor`].
///
/// # Examples
///
/// ```rust
/// use ownerloop::{Executor, Job, wrap_executor};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel::<Job>();
/// let tx = std::sync::Mutex::new(tx);
/// let exec = wrap_executor("mailbox", move |job| {
///     let _ = tx.lock().unwrap().send(job);
/// });
///
/// exec.tell(|| println!("hello")).unwrap();
/// rx.recv().unwrap()();
/// ```
pub fn wrap_executor<F>(name: impl Into<String>, acceptor: F) -> ExecutorAdapter<F>
where
    F: Fn(Job) + Send + Sync,
{
    ExecutorAdapter {
        name: name.into(),
        acceptor,
    }
}

impl<F> Executor for ExecutorAdapter<F>
where
    F: Fn(Job) + Send + Sync,
{
    type Task = Job;

    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self, task: Job) -> Result<(), LoopError> {
        (self.acceptor)(task);
        Ok(())
    }

    fn wrap_runnable(&self, job: Job) -> Job {
        job
    }
}

impl<F> fmt::Debug for ExecutorAdapter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorAdapter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
