use parking_lot::{Condvar, Mutex};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll, Waker};

/// Shared single-resolution cell behind a [`TaskHandle`].
struct ResultCell<T> {
    /// The result, written at most once.
    value: OnceLock<T>,

    /// Wakers of futures awaiting the result.
    ///
    /// The same mutex also backs `condvar`, so a reader that re-checks the
    /// value under this lock cannot miss the completion signal.
    waiters: Mutex<Vec<Waker>>,

    /// Wakes threads blocked in [`TaskHandle::wait`].
    condvar: Condvar,
}

impl<T> ResultCell<T> {
    fn new() -> Self {
        Self {
            value: OnceLock::new(),
            waiters: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
        }
    }
}

/// A handle to the result of a submitted task.
///
/// A `TaskHandle` is resolved exactly once, by the task that produced it.
/// Handles are cheap to clone and any number of readers may observe the
/// result, either by polling ([`get`](Self::get)), by blocking a thread
/// ([`wait`](Self::wait)), or by awaiting the handle as a [`Future`].
///
/// If the task is dropped without running (the loop was closed, or its body
/// raised a fault) the handle is never resolved. Waiting on such a handle
/// blocks forever; callers that cannot rule this out should poll instead.
pub struct TaskHandle<T> {
    cell: Arc<ResultCell<T>>,
}

/// The write side of a [`TaskHandle`].
///
/// Consumed on completion, so a result can only be written once. Dropping a
/// `Completer` without completing it leaves the handle unresolved.
pub struct Completer<T> {
    cell: Arc<ResultCell<T>>,
}

impl<T> TaskHandle<T> {
    /// Creates an unresolved handle together with its completer.
    pub fn pending() -> (Self, Completer<T>) {
        let cell = Arc::new(ResultCell::new());

        (Self { cell: cell.clone() }, Completer { cell })
    }

    /// Creates a handle that already holds `value`.
    pub fn ready(value: T) -> Self {
        let (handle, completer) = Self::pending();
        completer.complete(value);
        handle
    }

    /// Returns `true` once the result has been written.
    pub fn is_done(&self) -> bool {
        self.cell.value.get().is_some()
    }

    /// Returns the result if the task has completed.
    pub fn get(&self) -> Option<&T> {
        self.cell.value.get()
    }

    /// Blocks the current thread until the result is available.
    ///
    /// Do not call this on the owner thread of the loop that will produce
    /// the result: use [`OwnerLoop::join`](crate::OwnerLoop::join) there,
    /// which keeps draining the queue while it waits.
    pub fn wait(&self) -> &T {
        let mut waiters = self.cell.waiters.lock();

        loop {
            if let Some(value) = self.cell.value.get() {
                return value;
            }

            self.cell.condvar.wait(&mut waiters);
        }
    }
}

impl<T> Completer<T> {
    /// Resolves the associated handle and wakes everything waiting on it.
    pub fn complete(self, value: T) {
        if self.cell.value.set(value).is_err() {
            return;
        }

        let waiters = {
            let mut waiters = self.cell.waiters.lock();
            self.cell.condvar.notify_all();
            std::mem::take(&mut *waiters)
        };

        for waker in waiters {
            waker.wake();
        }
    }
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone> Future for TaskHandle<T> {
    /// A copy of the task's result.
    type Output = T;

    /// Polls the handle.
    ///
    /// The waker is registered **before** re-checking the cell to avoid
    /// missed wake-ups.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(value) = self.cell.value.get() {
            return Poll::Ready(value.clone());
        }

        let mut waiters = self.cell.waiters.lock();

        if let Some(value) = self.cell.value.get() {
            return Poll::Ready(value.clone());
        }

        if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
            waiters.push(cx.waker().clone());
        }

        Poll::Pending
    }
}

impl<T: fmt::Debug> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("value", &self.cell.value.get())
            .finish()
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("resolved", &self.cell.value.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;
    use std::thread;
    use std::time::Duration;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_ready_handle_is_done() {
        let handle = TaskHandle::ready(42);

        assert!(handle.is_done());
        assert_eq!(handle.get(), Some(&42));
        assert_eq!(*handle.wait(), 42);
    }

    #[test]
    fn test_pending_handle_resolves_once() {
        let (handle, completer) = TaskHandle::pending();
        assert!(!handle.is_done());
        assert_eq!(handle.get(), None);

        completer.complete("x");
        assert_eq!(handle.get(), Some(&"x"));
    }

    #[test]
    fn test_clones_observe_same_result() {
        let (handle, completer) = TaskHandle::pending();
        let other = handle.clone();

        completer.complete(String::from("shared"));

        assert_eq!(handle.get().map(String::as_str), Some("shared"));
        assert_eq!(other.get().map(String::as_str), Some("shared"));
    }

    #[test]
    fn test_dropped_completer_leaves_handle_unresolved() {
        let (handle, completer) = TaskHandle::<u32>::pending();
        drop(completer);

        assert!(!handle.is_done());
    }

    #[test]
    fn test_wait_blocks_until_completed_from_other_thread() {
        let (handle, completer) = TaskHandle::pending();

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.complete(7usize);
        });

        assert_eq!(*handle.wait(), 7);
        writer.join().unwrap();
    }

    #[test]
    fn test_future_wakes_registered_waker() {
        let (mut handle, completer) = TaskHandle::pending();
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut handle).poll(&mut cx).is_pending());

        completer.complete(5u8);

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(Pin::new(&mut handle).poll(&mut cx), Poll::Ready(5));
    }
}
