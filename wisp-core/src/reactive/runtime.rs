//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the dependency edges and schedules updates when a source
//! changes.
//!
//! # How It Works
//!
//! 1. Memos and effects register with the runtime when created.
//!
//! 2. When a memo or effect reads a source inside its tracking frame, the
//!    runtime records an edge in both directions.
//!
//! 3. When a source is written, the runtime:
//!    a. Finds all subscribers of that source
//!    b. Marks lazy subscribers (memos) dirty, which propagates to *their*
//!       subscribers
//!    c. Queues eager subscribers (effects)
//!    d. Flushes the queue once the outermost batch closes
//!
//! Every write is an implicit batch of one, so without an explicit batch the
//! queue is flushed before the write returns.
//!
//! # Threading
//!
//! All state is thread-local. Reactive values are `Rc`-based and never leave
//! the thread that created them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::subscriber::{SourceId, SubscriberId};

/// A trait for types that can be notified when dependencies change.
pub trait Reactive {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this reactive value as potentially needing update.
    fn mark_maybe_dirty(&self);

    /// Run this reactive value now (effects only).
    fn schedule(&self);

    /// Check if this reactive value is an effect (eager) or memo (lazy).
    fn is_eager(&self) -> bool;

    /// Stop reacting for good. Called by the owning scope on disposal.
    fn stop(&self);
}

/// The reactive runtime.
///
/// A namespace over the thread-local runtime state.
pub struct Runtime;

#[derive(Default)]
struct RuntimeState {
    /// Registered reactive values, held weakly. Effects are kept alive by
    /// their owner node, memos by their handles.
    registry: HashMap<SubscriberId, Weak<dyn Reactive>>,
    /// Source -> subscribers, in subscription order.
    subscribers: HashMap<SourceId, IndexSet<SubscriberId>>,
    /// Subscriber -> sources, for clearing stale edges before a re-run.
    sources: HashMap<SubscriberId, SmallVec<[SourceId; 4]>>,
    batch_depth: usize,
    pending: IndexSet<SubscriberId>,
    flushing: bool,
}

thread_local! {
    static RUNTIME: RefCell<RuntimeState> = RefCell::new(RuntimeState::default());
}

fn with_state<R>(f: impl FnOnce(&mut RuntimeState) -> R) -> R {
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

/// Resets the flushing flag even if an effect panics mid-flush.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        with_state(|rt| rt.flushing = false);
    }
}

impl Runtime {
    /// Register a reactive value with the runtime.
    pub fn register(reactive: &Rc<dyn Reactive>) {
        let id = reactive.subscriber_id();
        with_state(|rt| rt.registry.insert(id, Rc::downgrade(reactive)));
    }

    /// Unregister a reactive value and drop all of its edges.
    pub fn unregister(id: SubscriberId) {
        // Drop impls may run during thread teardown.
        let _ = RUNTIME.try_with(|rt| {
            let mut rt = rt.borrow_mut();
            rt.registry.remove(&id);
            rt.pending.shift_remove(&id);
            clear_edges(&mut rt, id);
        });
    }

    /// Forget every edge pointing at a source that no longer exists.
    pub fn forget_source(source: SourceId) {
        let _ = RUNTIME.try_with(|rt| {
            let mut rt = rt.borrow_mut();
            if let Some(subs) = rt.subscribers.remove(&source) {
                for sub in subs {
                    if let Some(sources) = rt.sources.get_mut(&sub) {
                        sources.retain(|s| *s != source);
                    }
                }
            }
        });
    }

    /// Record that a subscriber depends on a source.
    pub fn add_dependency(source: SourceId, subscriber: SubscriberId) {
        with_state(|rt| {
            if rt.subscribers.entry(source).or_default().insert(subscriber) {
                rt.sources.entry(subscriber).or_default().push(source);
            }
        });
    }

    /// Record a read of `source` on behalf of the current computation, if any.
    pub fn track(source: SourceId) {
        if let Some(subscriber) = ReactiveContext::current_subscriber() {
            Self::add_dependency(source, subscriber);
        }
    }

    /// Remove all dependencies for a subscriber.
    ///
    /// Called before re-running a computation to clear stale dependencies.
    pub fn clear_dependencies(subscriber: SubscriberId) {
        with_state(|rt| clear_edges(rt, subscriber));
    }

    /// Number of subscribers currently depending on a source.
    pub fn subscriber_count(source: SourceId) -> usize {
        with_state(|rt| rt.subscribers.get(&source).map_or(0, IndexSet::len))
    }

    /// Number of sources a subscriber currently depends on.
    pub fn dependency_count(subscriber: SubscriberId) -> usize {
        with_state(|rt| rt.sources.get(&subscriber).map_or(0, SmallVec::len))
    }

    /// Notify all subscribers that a source changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn notify(source: SourceId) {
        let reactives: SmallVec<[Rc<dyn Reactive>; 4]> = with_state(|rt| {
            rt.subscribers
                .get(&source)
                .into_iter()
                .flatten()
                .filter_map(|id| rt.registry.get(id).and_then(Weak::upgrade))
                .collect()
        });

        if reactives.is_empty() {
            return;
        }

        Self::start_batch();
        for reactive in reactives {
            if reactive.is_eager() {
                let id = reactive.subscriber_id();
                with_state(|rt| rt.pending.insert(id));
            } else {
                // Lazy values propagate to their own subscribers.
                reactive.mark_maybe_dirty();
            }
        }
        Self::end_batch();
    }

    /// Open a write batch. Batches nest; only the outermost close flushes.
    pub fn start_batch() {
        with_state(|rt| rt.batch_depth += 1);
    }

    /// Close a write batch, flushing pending effects if it was the outermost.
    pub fn end_batch() {
        let depth = with_state(|rt| {
            if rt.batch_depth == 0 {
                None
            } else {
                rt.batch_depth -= 1;
                Some(rt.batch_depth)
            }
        });

        match depth {
            Some(0) => Self::flush(),
            Some(_) => {}
            None => tracing::warn!("end_batch called without a matching start_batch"),
        }
    }

    /// Current batch nesting depth.
    pub fn batch_depth() -> usize {
        with_state(|rt| rt.batch_depth)
    }

    /// Number of effects waiting for the current batch to close.
    pub fn pending_count() -> usize {
        with_state(|rt| rt.pending.len())
    }

    /// Run queued effects until the queue is empty.
    ///
    /// Effects queued by writes made during the flush join the same loop.
    fn flush() {
        let already_flushing = with_state(|rt| std::mem::replace(&mut rt.flushing, true));
        if already_flushing {
            return;
        }
        let _guard = FlushGuard;

        let mut ran = 0usize;
        loop {
            let next = with_state(|rt| {
                let id = rt.pending.shift_remove_index(0)?;
                Some(rt.registry.get(&id).and_then(Weak::upgrade))
            });

            match next {
                Some(Some(reactive)) => {
                    reactive.schedule();
                    ran += 1;
                }
                Some(None) => {}
                None => break,
            }
        }

        tracing::trace!(effects = ran, "flushed reactive queue");
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a tracking frame.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

fn clear_edges(rt: &mut RuntimeState, subscriber: SubscriberId) {
    if let Some(sources) = rt.sources.remove(&subscriber) {
        for source in sources {
            if let Some(subs) = rt.subscribers.get_mut(&source) {
                subs.shift_remove(&subscriber);
            }
        }
    }
}
