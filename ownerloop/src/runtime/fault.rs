//! Fault classification and containment.
//!
//! A fault is a panic raised by a task body while the owner thread runs
//! it. Every dequeued task runs inside [`contain`]: the panic payload is
//! handed to a [`Classifier`], recoverable faults are logged and swallowed,
//! and fatal ones are logged and resumed so they unwind out of the drain
//! loop.
//!
//! Rust aborts on real memory exhaustion and stack overflow, so the fatal
//! class is expressed with explicit marker payloads. Raise one with
//! [`std::panic::panic_any`]:
//!
//! ```rust
//! use ownerloop::fault::{self, FaultKind, Reported, ResourceExhausted};
//!
//! let payload = Reported::new(ResourceExhausted::new("chunk cache"));
//! assert_eq!(fault::classify(&payload), FaultKind::Fatal);
//!
//! // Raising it from a task: std::panic::panic_any(payload);
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// How a fault raised by a task is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Log, abandon the task and keep running the loop.
    Recoverable,

    /// Log and re-raise, terminating the drain loop.
    Fatal,
}

/// A fault classification strategy.
///
/// Receives the panic payload of a failed task.
pub type Classifier = fn(&(dyn Any + Send)) -> FaultKind;

/// Panic payload signalling that a resource ran out.
///
/// Classified [`FaultKind::Fatal`] by the default classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceExhausted {
    resource: String,
}

impl ResourceExhausted {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    /// The name of the exhausted resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Display for ResourceExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource exhausted: {}", self.resource)
    }
}

/// Marks a fault that has already been reported elsewhere.
///
/// The default classifier looks through exactly one layer of this wrapper
/// before classifying the inner payload.
pub struct Reported(Box<dyn Any + Send>);

impl Reported {
    /// Wraps a payload.
    pub fn new(payload: impl Any + Send) -> Self {
        Self(Box::new(payload))
    }

    /// Wraps an already boxed payload, such as one returned by
    /// [`std::panic::catch_unwind`].
    pub fn from_boxed(payload: Box<dyn Any + Send>) -> Self {
        Self(payload)
    }

    /// The wrapped payload.
    pub fn inner(&self) -> &(dyn Any + Send) {
        &*self.0
    }
}

impl fmt::Debug for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reported").field(&describe(self.inner())).finish()
    }
}

/// The default classifier.
///
/// [`ResourceExhausted`] payloads are fatal, whether raised directly or
/// wrapped once in [`Reported`]. Everything else is recoverable.
pub fn classify(payload: &(dyn Any + Send)) -> FaultKind {
    let payload = match payload.downcast_ref::<Reported>() {
        Some(reported) => reported.inner(),
        None => payload,
    };

    if payload.is::<ResourceExhausted>() {
        FaultKind::Fatal
    } else {
        FaultKind::Recoverable
    }
}

/// Renders a panic payload for log output.
pub(crate) fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(exhausted) = payload.downcast_ref::<ResourceExhausted>() {
        exhausted.to_string()
    } else if let Some(reported) = payload.downcast_ref::<Reported>() {
        format!("reported: {}", describe(reported.inner()))
    } else {
        String::from("unknown fault")
    }
}

/// Runs `job` inside the containment boundary of loop `name`.
///
/// Recoverable faults are logged and swallowed. Fatal faults are logged and
/// resumed.
pub(crate) fn contain<F: FnOnce()>(name: &str, classifier: Classifier, job: F) {
    let payload = match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => return,
        Err(payload) => payload,
    };

    match classifier(&*payload) {
        FaultKind::Recoverable => {
            tracing::error!(
                scheduler = name,
                fault = %describe(&*payload),
                "error executing task"
            );
        }
        FaultKind::Fatal => {
            tracing::error!(
                scheduler = name,
                fault = %describe(&*payload),
                "fatal error executing task, stopping"
            );
            panic::resume_unwind(payload)
        }
    }
}
