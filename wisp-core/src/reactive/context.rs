//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the runtime records the current computation as a dependent.
//!
//! # Implementation
//!
//! A thread-local stack of frames. Entering a memo or effect pushes a
//! tracking frame carrying its subscriber ID; [`untrack`] pushes a frame with
//! no subscriber, which hides every outer frame for its duration. Frames are
//! popped by guards, so the stack stays balanced when a computation panics.

use std::cell::RefCell;

use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<SubscriberId>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context frame when dropped.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking frame for the given subscriber.
    ///
    /// While this frame is on top, every source that is read registers the
    /// subscriber as a dependent.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(Some(subscriber_id))
    }

    /// Enter a frame in which reads are not tracked.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(subscriber_id: Option<SubscriberId>) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(subscriber_id));
        Self { subscriber_id }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the subscriber of the innermost frame, if it tracks.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().copied().flatten())
    }

    /// Number of frames currently on the stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched guards early.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry
                );
            }
        });
    }
}

/// Run `f` without registering any dependencies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}
