/// Runs a closure when it goes out of scope.
///
/// The closure runs on every exit path of the enclosing scope: normal
/// return, early return, or a panic unwinding through it.
pub(crate) struct ScopeGuard<F: FnOnce()> {
    // Taken on drop so the closure runs at most once.
    closure: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    pub(crate) fn new(closure: F) -> Self {
        ScopeGuard {
            closure: Some(closure),
        }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(closure) = self.closure.take() {
            closure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_guard_runs_on_scope_exit() {
        let fired = Cell::new(0);
        {
            let _guard = ScopeGuard::new(|| fired.set(fired.get() + 1));
            assert_eq!(fired.get(), 0);
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_guard_runs_on_unwind() {
        let fired = Cell::new(false);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = ScopeGuard::new(|| fired.set(true));
            panic!("unwinding");
        }));

        assert!(result.is_err());
        assert!(fired.get());
    }
}
