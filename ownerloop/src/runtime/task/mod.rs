//! Task primitives.
//!
//! This module defines what travels through a loop's queue and how
//! results come back out:
//! - [`Job`]: a plain closure handed to a loop,
//! - [`Task`]: a job plus the metadata attached by the loop's wrap hook,
//! - [`TaskHandle`] / [`Completer`]: the single-resolution result cell
//!   returned by `submit`.

pub(crate) mod core;
pub(crate) mod handle;

pub use self::core::{Job, Task};
pub use handle::{Completer, TaskHandle};
