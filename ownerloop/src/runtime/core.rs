use crate::LoopError;
use crate::runtime::executor::Executor;
use crate::runtime::fault::{self, Classifier};
use crate::runtime::queue::SubmissionQueue;
use crate::runtime::registry::LoopDiagnostics;
use crate::runtime::task::{Job, Task, TaskHandle};
use crate::utils::ScopeGuard;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Wrap hook turning a plain job into a loop task.
pub(crate) type WrapHook<M> = Box<dyn Fn(Job) -> Task<M> + Send + Sync>;

/// Eligibility policy consulted outside managed blocks.
pub(crate) type EligibilityPolicy<M> = Box<dyn Fn(&Task<M>) -> bool + Send + Sync>;

/// A queue-backed task loop owned by a single thread.
///
/// Any thread may hand work to the loop; only the owner thread, fixed at
/// construction, ever runs it. The owner drains the queue at points of its
/// choosing ([`poll_task`](Self::poll_task),
/// [`run_all_tasks`](Self::run_all_tasks)) and can wait on an arbitrary
/// condition while still running queued work
/// ([`managed_block`](Self::managed_block)).
///
/// `OwnerLoop` is responsible for:
/// - accepting work from any thread and waking the owner,
/// - running work submitted on the owner thread in place,
/// - gating which queued tasks may run through an eligibility policy,
/// - containing faults raised by tasks.
///
/// Loops are created through [`LoopBuilder`](crate::LoopBuilder) and shared
/// behind an [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```rust
/// use ownerloop::LoopBuilder;
/// use std::thread;
///
/// let main_loop = LoopBuilder::new("main").build();
///
/// let producer = {
///     let main_loop = main_loop.clone();
///     thread::spawn(move || main_loop.submit(|| 6 * 7).unwrap())
/// };
///
/// let handle = producer.join().unwrap();
/// assert_eq!(*main_loop.join(&handle), 42);
/// ```
pub struct OwnerLoop<M = ()> {
    /// Diagnostic name, used in logs.
    name: String,

    /// The only thread allowed to run tasks.
    owner: ThreadId,

    /// Pending tasks.
    queue: SubmissionQueue<M>,

    /// Converts jobs into tasks, attaching metadata.
    wrap: WrapHook<M>,

    /// Decides which tasks may run outside a managed block.
    should_run: EligibilityPolicy<M>,

    /// Decides whether a task fault stops the loop.
    classifier: Classifier,

    /// Upper bound on a single idle wait inside a managed block.
    idle_wait: Duration,

    /// Number of active managed blocks.
    ///
    /// Only the owner thread modifies it; other threads read it for
    /// diagnostics.
    blocking: AtomicUsize,

    /// Set once the loop has been closed.
    closed: AtomicBool,
}

impl<M: Send + 'static> OwnerLoop<M> {
    pub(crate) fn new(
        name: String,
        owner: ThreadId,
        wrap: WrapHook<M>,
        should_run: EligibilityPolicy<M>,
        classifier: Classifier,
        idle_wait: Duration,
    ) -> Self {
        Self {
            name,
            owner,
            queue: SubmissionQueue::new(),
            wrap,
            should_run,
            classifier,
            idle_wait,
            blocking: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the loop's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if called on the owner thread.
    pub fn is_same_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of managed blocks currently active on the owner thread.
    pub fn blocking_depth(&self) -> usize {
        self.blocking.load(Ordering::Acquire)
    }

    /// Returns `true` while the owner thread is inside a managed block.
    pub fn is_blocking(&self) -> bool {
        self.blocking_depth() > 0
    }

    /// Number of tasks waiting in the queue.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Converts a job into this loop's task representation.
    pub fn wrap_runnable(&self, job: Job) -> Task<M> {
        (self.wrap)(job)
    }

    /// Enqueues a task and wakes the owner thread.
    ///
    /// Always enqueues, even on the owner thread. Returns
    /// [`LoopError::Closed`] and drops the task if the loop is closed.
    pub fn schedule(&self, task: Task<M>) -> Result<(), LoopError> {
        if self.is_closed() {
            tracing::debug!(scheduler = %self.name, "rejected task scheduled after close");

            return Err(LoopError::Closed {
                name: self.name.clone(),
            });
        }

        self.queue.push(task);
        Ok(())
    }

    /// Submits work and returns a handle to its result.
    ///
    /// On the owner thread, `work` runs immediately and the returned handle
    /// is already resolved. This can run ahead of tasks already sitting in
    /// the queue, and a panic in `work` propagates to the caller.
    ///
    /// On any other thread, `work` is queued and the handle resolves once
    /// the owner has run it. If the task raises a fault, or is discarded by
    /// [`close`](Self::close), the handle is never resolved.
    pub fn submit<T, F>(&self, work: F) -> Result<TaskHandle<T>, LoopError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_same_thread() {
            return Ok(TaskHandle::ready(work()));
        }

        let (handle, completer) = TaskHandle::pending();

        self.schedule(self.wrap_runnable(Box::new(move || completer.complete(work()))))?;
        Ok(handle)
    }

    /// Fire-and-forget variant of [`submit`](Self::submit).
    ///
    /// Runs in place on the owner thread, queues otherwise.
    pub fn execute<F>(&self, work: F) -> Result<(), LoopError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_same_thread() {
            work();
            return Ok(());
        }

        self.schedule(self.wrap_runnable(Box::new(work)))
    }

    /// Like [`execute`](Self::execute), but silently drops the work if the
    /// loop is closed.
    pub fn execute_if_possible<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.execute(work);
    }

    /// Submits work and blocks the calling thread until it has run.
    ///
    /// On the owner thread the work simply runs in place. Elsewhere, the
    /// caller sleeps until the owner thread drains the task. Returns
    /// [`LoopError::Abandoned`] if the task was dropped without producing a
    /// result.
    pub fn execute_blocking<T, F>(&self, work: F) -> Result<T, LoopError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_same_thread() {
            return Ok(work());
        }

        let (transmitter, receiver) = mpsc::channel();

        self.schedule(self.wrap_runnable(Box::new(move || {
            let _ = transmitter.send(work());
        })))?;

        receiver.recv().map_err(|_| LoopError::Abandoned {
            name: self.name.clone(),
        })
    }

    /// Runs the task at the head of the queue if it is eligible.
    ///
    /// Outside a managed block the head must pass the loop's eligibility
    /// policy; inside one, every task is eligible. Returns `true` if a task
    /// was run, including one that raised a recoverable fault.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owner, and resumes
    /// any fatal fault raised by the task.
    pub fn poll_task(&self) -> bool {
        self.assert_owner("poll_task");

        let blocking = self.is_blocking();

        match self.queue.pop_if(|task| blocking || (self.should_run)(task)) {
            Some(task) => {
                self.do_run_task(task);
                true
            }
            None => false,
        }
    }

    /// Polls until the queue is empty or its head is not eligible.
    ///
    /// # Panics
    ///
    /// Same as [`poll_task`](Self::poll_task).
    pub fn run_all_tasks(&self) {
        while self.poll_task() {}
    }

    /// Blocks the owner thread until `is_done` returns `true`, running
    /// queued tasks in the meantime.
    ///
    /// While blocked, the eligibility policy is bypassed so that any task
    /// the condition depends on can run. When the queue is empty the owner
    /// parks for at most the configured idle wait, or until new work
    /// arrives.
    ///
    /// Blocks may nest: a task run from inside a managed block may itself
    /// call `managed_block`. The blocking depth is restored on every exit,
    /// including a fatal fault unwinding through the call.
    ///
    /// There is no timeout. A condition that never becomes true blocks
    /// forever; fold a deadline into `is_done` if one is needed.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owner, and resumes
    /// any fatal fault raised by a task run while blocked.
    pub fn managed_block(&self, mut is_done: impl FnMut() -> bool) {
        self.assert_owner("managed_block");

        let depth = self.blocking.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(scheduler = %self.name, depth, "entering managed block");

        let _guard = ScopeGuard::new(|| {
            let depth = self.blocking.fetch_sub(1, Ordering::AcqRel) - 1;
            tracing::trace!(scheduler = %self.name, depth, "leaving managed block");
        });

        while !is_done() {
            if !self.poll_task() {
                self.wait_for_tasks();
            }
        }
    }

    /// Waits on the owner thread for `handle` to resolve, running queued
    /// tasks in the meantime.
    ///
    /// Never returns if the handle's task is dropped without running.
    pub fn join<'a, T>(&self, handle: &'a TaskHandle<T>) -> &'a T {
        self.managed_block(|| handle.is_done());
        handle.wait()
    }

    /// Parks the owner thread until work arrives or the idle wait
    /// elapses.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owner.
    pub fn wait_for_tasks(&self) {
        self.assert_owner("wait_for_tasks");

        thread::yield_now();
        self.queue.park(self.idle_wait);
    }

    /// Discards every queued task without running it.
    ///
    /// Handles belonging to discarded tasks are never resolved. Returns the
    /// number of tasks dropped.
    pub fn drop_all_tasks(&self) -> usize {
        let dropped = self.queue.clear();

        if dropped > 0 {
            tracing::debug!(scheduler = %self.name, dropped, "dropped queued tasks");
        }

        dropped
    }

    /// Closes the loop.
    ///
    /// Queued tasks are discarded and further scheduling is rejected with
    /// [`LoopError::Closed`]. Work submitted on the owner thread still runs
    /// in place. Closing is best effort: a task racing with `close` from
    /// another thread may still land in the queue.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let dropped = self.drop_all_tasks();
        tracing::debug!(scheduler = %self.name, dropped, "closed");
    }

    /// Runs a dequeued task inside the containment boundary.
    fn do_run_task(&self, task: Task<M>) {
        fault::contain(&self.name, self.classifier, || task.run());
    }

    fn assert_owner(&self, operation: &str) {
        assert!(
            self.is_same_thread(),
            "{operation} must be called on the owner thread of loop `{}`",
            self.name
        );
    }
}

impl<M: Send + 'static> Executor for OwnerLoop<M> {
    type Task = Task<M>;

    fn name(&self) -> &str {
        OwnerLoop::name(self)
    }

    fn schedule(&self, task: Task<M>) -> Result<(), LoopError> {
        OwnerLoop::schedule(self, task)
    }

    fn wrap_runnable(&self, job: Job) -> Task<M> {
        OwnerLoop::wrap_runnable(self, job)
    }

    fn close(&self) {
        OwnerLoop::close(self)
    }
}

impl<M: Send + 'static> LoopDiagnostics for OwnerLoop<M> {
    fn name(&self) -> &str {
        OwnerLoop::name(self)
    }

    fn pending_count(&self) -> usize {
        OwnerLoop::pending_count(self)
    }

    fn blocking_depth(&self) -> usize {
        OwnerLoop::blocking_depth(self)
    }
}

impl<M> fmt::Debug for OwnerLoop<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerLoop")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("pending", &self.queue.len())
            .field("blocking", &self.blocking.load(Ordering::Acquire))
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
