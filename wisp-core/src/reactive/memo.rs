//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result.
//!
//! 2. When accessed again, if no dependencies have changed, returns the cache.
//!
//! 3. When a dependency changes, the memo is marked dirty and notifies its
//!    own subscribers, so effects reading the memo are re-run.
//!
//! 4. On next access, a dirty memo recomputes.
//!
//! Memos are lazy: a memo that nobody reads never recomputes.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::subscriber::{SourceId, SubscriberId};

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// The memo needs to recompute before its next read.
    Dirty,
}

struct MemoInner<T> {
    /// Identity as a reader of other sources.
    subscriber_id: SubscriberId,
    /// Identity as a source for its own readers.
    source_id: SourceId,
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    state: Cell<MemoState>,
}

impl<T> Reactive for MemoInner<T> {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {
        // Already dirty means our readers were told already.
        if self.state.replace(MemoState::Dirty) == MemoState::Clean {
            Runtime::notify(self.source_id);
        }
    }

    fn schedule(&self) {}

    fn is_eager(&self) -> bool {
        false
    }

    fn stop(&self) {
        Runtime::unregister(self.subscriber_id);
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
        Runtime::forget_source(self.source_id);
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(2);
/// let c = count.clone();
/// let doubled = Memo::new(move || c.get() * 2);
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T> {
    inner: Rc<MemoInner<T>>,
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new(MemoInner {
            subscriber_id: SubscriberId::new(),
            source_id: SourceId::new(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            state: Cell::new(MemoState::Dirty),
        });

        let reactive: Rc<dyn Reactive> = inner.clone();
        Runtime::register(&reactive);

        Self { inner }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        Runtime::track(self.inner.source_id);

        if self.inner.state.get() == MemoState::Dirty {
            return self.recompute();
        }

        let cached = self.inner.value.borrow().clone();
        match cached {
            Some(value) => value,
            None => self.recompute(),
        }
    }

    /// Mark the memo as needing recomputation.
    pub fn mark_dirty(&self) {
        self.inner.mark_maybe_dirty();
    }

    /// Run the computation inside a tracking frame and cache the result.
    fn recompute(&self) -> T {
        Runtime::clear_dependencies(self.inner.subscriber_id);

        let new_value = {
            let _ctx = ReactiveContext::enter(self.inner.subscriber_id);
            (self.inner.compute)()
        };

        *self.inner.value.borrow_mut() = Some(new_value.clone());
        self.inner.state.set(MemoState::Clean);

        new_value
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        self.inner.state.get()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Get the number of computations reading this memo.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.source_id)
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.subscriber_id)
            .field("state", &self.inner.state.get())
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{batch, Effect, Signal};

    #[test]
    fn memo_computes_on_first_access() {
        let call_count = Rc::new(Cell::new(0));
        let calls = call_count.clone();

        let memo = Memo::new(move || {
            calls.set(calls.get() + 1);
            42
        });

        assert!(!memo.has_value());
        assert_eq!(call_count.get(), 0);

        assert_eq!(memo.get(), 42);
        assert_eq!(call_count.get(), 1);
        assert!(memo.has_value());
    }

    #[test]
    fn memo_caches_value_when_clean() {
        let call_count = Rc::new(Cell::new(0));
        let calls = call_count.clone();

        let memo = Memo::new(move || {
            calls.set(calls.get() + 1);
            42
        });

        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(call_count.get(), 1);
    }

    #[test]
    fn memo_tracks_signal_dependency() {
        let signal = Signal::new(10);
        let s = signal.clone();
        let memo = Memo::new(move || s.get() * 2);

        assert_eq!(memo.get(), 20);
        assert_eq!(memo.state(), MemoState::Clean);

        signal.set(5);
        assert_eq!(memo.state(), MemoState::Dirty);
        assert_eq!(memo.get(), 10);
    }

    #[test]
    fn memo_depends_on_memo() {
        let base = Signal::new(5);

        let b = base.clone();
        let doubled = Memo::new(move || b.get() * 2);
        let d = doubled.clone();
        let plus_ten = Memo::new(move || d.get() + 10);

        assert_eq!(plus_ten.get(), 20);

        base.set(10);
        assert_eq!(plus_ten.state(), MemoState::Dirty);
        assert_eq!(plus_ten.get(), 30);
    }

    #[test]
    fn effect_reruns_through_memo() {
        let base = Signal::new(1);
        let b = base.clone();
        let squared = Memo::new(move || b.get() * b.get());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let m = squared.clone();
        Effect::new(move || log.borrow_mut().push(m.get()));

        base.set(3);
        batch(|| {
            base.set(4);
            base.set(5);
        });

        assert_eq!(*seen.borrow(), vec![1, 9, 25]);
        assert_eq!(squared.subscriber_count(), 1);
    }

    #[test]
    fn memo_state_transitions() {
        let memo = Memo::new(|| 42);

        assert_eq!(memo.state(), MemoState::Dirty);

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);

        memo.mark_dirty();
        assert_eq!(memo.state(), MemoState::Dirty);

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);
    }
}
