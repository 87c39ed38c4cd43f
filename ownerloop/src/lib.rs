//! # ownerloop
//!
//! **ownerloop** is a single-owner cooperative task loop. Any thread can hand
//! work to one designated owner thread; the owner decides when to run it.
//!
//! It is meant for programs built around one thread that owns most of the
//! state, such as a game server tick loop or a UI thread, where other
//! threads need to get work onto that thread without locking the state
//! themselves. It offers:
//!
//! - **Submission from any thread** with a result handle, running in place
//!   when called from the owner thread
//! - **Controlled draining**: the owner polls one task or drains the queue
//!   at points of its choosing, optionally gated by an eligibility policy
//! - **Managed blocking**: the owner waits on a condition while still
//!   running queued work, so tasks the condition depends on cannot deadlock
//! - **Fault containment**: panicking tasks are logged and skipped, unless
//!   classified fatal, in which case the fault stops the drain loop
//! - A minimal [`Executor`] trait, with an adapter over any
//!   "accept one job" function
//!
//! There is no thread pool, no cancellation and no built-in timeout.
//!
//! ## Quick Start
//!
//! ```rust
//! use ownerloop::LoopBuilder;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::thread;
//!
//! // The building thread owns the loop.
//! let server = LoopBuilder::new("server").build();
//! let saved = Arc::new(AtomicBool::new(false));
//!
//! let worker = {
//!     let server = server.clone();
//!     let saved = saved.clone();
//!     thread::spawn(move || {
//!         server
//!             .execute(move || saved.store(true, Ordering::SeqCst))
//!             .unwrap();
//!     })
//! };
//! worker.join().unwrap();
//!
//! // Keep running queued work until the save has happened.
//! server.managed_block(|| saved.load(Ordering::SeqCst));
//! ```
//!
//! ## Modules
//!
//! - [`fault`] — Fault classification and the fatal-fault markers
//! - [`task`] — Tasks, jobs and result handles

mod error;
mod runtime;
mod utils;

pub use error::LoopError;
pub use runtime::adapter::{ExecutorAdapter, wrap_executor};
pub use runtime::builder::{DEFAULT_IDLE_WAIT, LoopBuilder};
pub use runtime::core::OwnerLoop;
pub use runtime::executor::Executor;
pub use runtime::registry::{LoopDiagnostics, LoopRegistry, LoopSnapshot};
pub use runtime::task::{Completer, Job, Task, TaskHandle};
pub use runtime::tick::TickGate;
pub use runtime::{fault, task};
