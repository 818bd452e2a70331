//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is queued and re-run once the
//!    current batch closes.
//!
//! 3. Before re-running, the effect clears its old dependencies and tracks
//!    new ones during execution.
//!
//! # Ownership
//!
//! Every effect owns a node in the scope arena. Effects and scopes created
//! while it runs become children of that node and are disposed together with
//! the effect. The owner node also keeps the effect alive, so the handle
//! returned by [`Effect::new`] may be dropped freely.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::scope::{self, OwnerFrame, OwnerKey};
use super::subscriber::SubscriberId;

struct EffectInner {
    subscriber_id: SubscriberId,
    owner: OwnerKey,
    run: RefCell<Box<dyn FnMut()>>,
    disposed: Cell<bool>,
    /// Set when a dependency changed while this effect was running.
    stale: Cell<bool>,
    run_count: Cell<usize>,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.get() {
            return;
        }

        // A write that reaches this effect while it runs must not re-enter
        // it. The running call picks the change up once it returns.
        let Ok(mut run) = self.run.try_borrow_mut() else {
            tracing::trace!(effect = ?self.subscriber_id, "deferring re-entrant effect run");
            self.stale.set(true);
            return;
        };

        loop {
            self.stale.set(false);
            Runtime::clear_dependencies(self.subscriber_id);
            {
                let _ctx = ReactiveContext::enter(self.subscriber_id);
                let _owner = OwnerFrame::enter(self.owner);
                (*run)();
            }
            self.run_count.set(self.run_count.get() + 1);

            if !self.stale.get() || self.disposed.get() {
                break;
            }
        }
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {}

    fn schedule(&self) {
        self.execute();
    }

    fn is_eager(&self) -> bool {
        true
    }

    fn stop(&self) {
        self.disposed.set(true);
        Runtime::unregister(self.subscriber_id);
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let effect = Effect::new(move || {
///     println!("Count is: {}", count.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it.
    ///
    /// It has no dependencies until [`execute`](Self::execute) is called.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let owner = scope::create_owner();
        let inner = Rc::new(EffectInner {
            subscriber_id: SubscriberId::new(),
            owner,
            run: RefCell::new(Box::new(run)),
            disposed: Cell::new(false),
            stale: Cell::new(false),
            run_count: Cell::new(0),
        });

        let reactive: Rc<dyn Reactive> = inner.clone();
        Runtime::register(&reactive);
        scope::adopt(owner, reactive);

        Self { inner }
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Run the effect function now, re-tracking its dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect and everything created during its runs.
    ///
    /// After disposal, the effect will not run again.
    pub fn dispose(&self) {
        scope::Scope::from_key(self.inner.owner).dispose();
        // Effects orphaned by a disposed parent still need the flag.
        self.inner.stop();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of dependencies tracked by the latest run.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.inner.subscriber_id)
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.subscriber_id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
