use super::core::{EligibilityPolicy, OwnerLoop, WrapHook};
use super::fault::{self, Classifier};
use super::registry::{LoopDiagnostics, LoopRegistry};
use super::task::{Job, Task};
use super::tick::TickGate;

use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Default upper bound on one idle wait inside a managed block.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_micros(100);

fn always_eligible<M>(_: &Task<M>) -> bool {
    true
}

/// Builder for configuring and creating an [`OwnerLoop`].
///
/// By default a loop wraps jobs as plain tasks, considers every task
/// eligible, classifies faults with [`fault::classify`], idles for
/// [`DEFAULT_IDLE_WAIT`] at a time, and is owned by the thread that calls
/// [`build`](Self::build).
///
/// # Examples
///
/// ```rust
/// use ownerloop::{LoopBuilder, LoopRegistry};
/// use std::time::Duration;
///
/// let registry = LoopRegistry::new();
/// let server = LoopBuilder::new("server")
///     .idle_wait(Duration::from_millis(1))
///     .registry(&registry)
///     .build();
///
/// assert_eq!(server.name(), "server");
/// assert_eq!(registry.len(), 1);
/// ```
pub struct LoopBuilder<M = ()> {
    /// Name used in logs and diagnostics.
    name: String,

    /// Converts jobs into tasks.
    wrap: WrapHook<M>,

    /// Eligibility outside managed blocks.
    should_run: EligibilityPolicy<M>,

    /// Fault classification strategy.
    classifier: Classifier,

    /// Upper bound on one idle wait.
    idle_wait: Duration,

    /// Owner thread; the building thread when unset.
    owner: Option<ThreadId>,

    /// Diagnostics registry to join, if any.
    registry: Option<LoopRegistry>,
}

impl LoopBuilder<()> {
    /// Creates a builder for a loop named `name` with default
    /// configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wrap: Box::new(Task::plain),
            should_run: Box::new(always_eligible::<()>),
            classifier: fault::classify,
            idle_wait: DEFAULT_IDLE_WAIT,
            owner: None,
            registry: None,
        }
    }
}

impl<M: Send + 'static> LoopBuilder<M> {
    /// Installs a wrap hook that attaches metadata to every task.
    ///
    /// The eligibility policy is reset to "always eligible", since a policy
    /// written for the previous metadata type no longer applies.
    pub fn wrap_with<N, W>(self, wrap: W) -> LoopBuilder<N>
    where
        N: Send + 'static,
        W: Fn(Job) -> Task<N> + Send + Sync + 'static,
    {
        LoopBuilder {
            name: self.name,
            wrap: Box::new(wrap),
            should_run: Box::new(always_eligible::<N>),
            classifier: self.classifier,
            idle_wait: self.idle_wait,
            owner: self.owner,
            registry: self.registry,
        }
    }

    /// Sets the policy deciding which queued tasks may run outside a
    /// managed block.
    ///
    /// A task rejected by the policy stays at the head of the queue and
    /// blocks the tasks behind it until it becomes eligible. A policy that
    /// panics leaves the head in place. The policy runs while the queue is
    /// locked and must not call back into the loop.
    pub fn should_run<P>(mut self, policy: P) -> Self
    where
        P: Fn(&Task<M>) -> bool + Send + Sync + 'static,
    {
        self.should_run = Box::new(policy);
        self
    }

    /// Sets the upper bound on one idle wait inside a managed block.
    ///
    /// # Panics
    ///
    /// Panics if `wait` is zero.
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        assert!(!wait.is_zero(), "idle_wait must be > 0");

        self.idle_wait = wait;
        self
    }

    /// Replaces the fault classifier.
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Makes `owner` the loop's owner thread instead of the building
    /// thread.
    pub fn owner(mut self, owner: ThreadId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Registers the built loop in `registry`.
    pub fn registry(mut self, registry: &LoopRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Builds the loop.
    pub fn build(self) -> Arc<OwnerLoop<M>> {
        let owner = self.owner.unwrap_or_else(|| thread::current().id());

        let owner_loop = Arc::new(OwnerLoop::new(
            self.name,
            owner,
            self.wrap,
            self.should_run,
            self.classifier,
            self.idle_wait,
        ));

        if let Some(registry) = self.registry {
            registry.register(owner_loop.clone() as Arc<dyn LoopDiagnostics>);
        }

        owner_loop
    }

    /// Tags tasks with `gate`'s current tick and only runs them once the
    /// gate admits them.
    pub fn tick_gated(self, gate: &TickGate) -> LoopBuilder<u64> {
        let tagger = gate.clone();
        let admitter = gate.clone();

        self.wrap_with(move |job| tagger.tag(job))
            .should_run(move |task| admitter.admits(task))
    }
}
