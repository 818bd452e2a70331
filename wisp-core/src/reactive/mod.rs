//! Reactive Primitives
//!
//! This module implements the reactive engine the renderer runs on: signals,
//! memos, effects, scopes, and write batches.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking frame (such as a memo or effect), the signal registers
//! that computation as a dependent. When the signal is written, all
//! dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result and recomputes lazily
//! after one of its dependencies changes.
//!
//! ## Effects
//!
//! An Effect runs immediately and again whenever a value it read during its
//! latest run changes. Effects are how the renderer keeps host nodes in sync.
//!
//! ## Scopes
//!
//! A Scope collects the effects created while it is current so they can be
//! stopped together, including effects created by nested scopes.
//!
//! ## Batches
//!
//! Writes inside a batch defer their dependents until the outermost batch
//! closes, so each dependent re-runs at most once per batch.
//!
//! # Implementation Notes
//!
//! The engine is single-threaded. Tracking frames, the dependency edges, the
//! pending queue and the scope arena are all thread-local.

mod batch;
mod context;
mod effect;
mod memo;
mod runtime;
mod scope;
mod signal;
mod subscriber;

pub use batch::{batch, end_batch, start_batch, BatchGuard};
pub use context::{untrack, ReactiveContext};
pub use effect::Effect;
pub use memo::{Memo, MemoState};
pub use runtime::{Reactive, Runtime};
pub use scope::{on_cleanup, scope, OwnerKey, Scope};
pub use signal::Signal;
pub use subscriber::{SourceId, SubscriberId};
