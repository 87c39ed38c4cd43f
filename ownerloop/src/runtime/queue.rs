use crate::runtime::task::Task;

use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::time::Duration;

/// The submission queue of a loop.
///
/// An unbounded FIFO shared by any number of producer threads and drained
/// by a single consumer, the loop's owner thread. Tasks leave the queue in
/// the order they entered it.
///
/// It also carries the owner's wake signal: pushing a task notifies the
/// condition variable the owner parks on while idle, so the owner does not
/// have to busy-poll.
pub(crate) struct SubmissionQueue<M> {
    /// Queued tasks, oldest first.
    queue: Mutex<VecDeque<Task<M>>>,

    /// Condition variable used to wake the parked owner thread.
    condvar: Condvar,
}

impl<M> SubmissionQueue<M> {
    /// Creates a new empty queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a task to the back of the queue and wakes the owner.
    pub(crate) fn push(&self, task: Task<M>) {
        self.queue.lock().push_back(task);
        self.condvar.notify_all();
    }

    /// Removes the head of the queue if `eligible` accepts it.
    ///
    /// The head is inspected in place with the lock held, so a concurrent
    /// `clear` cannot race with the check and an ineligible or panicking
    /// check leaves the head where it was. `eligible` must not call back
    /// into the queue.
    pub(crate) fn pop_if(&self, eligible: impl FnOnce(&Task<M>) -> bool) -> Option<Task<M>> {
        let mut queue = self.queue.lock();

        if eligible(queue.front()?) {
            queue.pop_front()
        } else {
            None
        }
    }

    /// Parks the calling thread until a task is pushed or `timeout`
    /// elapses.
    ///
    /// Returns immediately if the queue is not empty.
    pub(crate) fn park(&self, timeout: Duration) {
        let mut queue = self.queue.lock();

        if !queue.is_empty() {
            return;
        }

        let _ = self.condvar.wait_for(&mut queue, timeout);
    }

    /// Returns the number of queued tasks.
    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Removes every queued task and returns how many were discarded.
    ///
    /// The tasks are dropped after the lock is released, since dropping a
    /// job may run arbitrary destructors that schedule more work.
    pub(crate) fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.queue.lock());
        let count = drained.len();

        drop(drained);
        count
    }
}
