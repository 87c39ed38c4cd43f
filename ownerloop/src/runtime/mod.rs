//! Core loop components.
//!
//! This module contains the building blocks of an owner loop:
//! - the submission queue shared by producers and the owner thread,
//! - the loop itself, with its drain and managed-block operations,
//! - fault classification and containment,
//! - the minimal [`Executor`](executor::Executor) capability set and its
//!   adapter over plain acceptor functions,
//! - configuration, tick gating, and the diagnostics registry.
//!
//! Most users will interact with the re-exports at the crate root rather
//! than with this module directly.

mod queue;

pub(crate) mod adapter;
pub(crate) mod builder;
pub(crate) mod core;
pub(crate) mod executor;
pub(crate) mod registry;
pub(crate) mod tick;

pub mod fault;
pub mod task;
