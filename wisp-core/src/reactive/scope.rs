//! Reactive Scopes
//!
//! A scope groups reactive registrations so they can be disposed together.
//! Scopes form a tree: a scope created while another one is current becomes
//! its child, and every effect owns a scope node of its own, so anything
//! created during an effect run belongs to that effect.
//!
//! # Arena
//!
//! Owner nodes live in a thread-local slot map rather than in a tree of
//! closures. A [`Scope`] is just a versioned key into that arena, which makes
//! disposal explicit and idempotent: once a node is removed, every stale key
//! to it resolves to nothing.
//!
//! # Disposal Order
//!
//! Disposing a node:
//!
//! 1. detaches it from its parent,
//! 2. stops the reactive value it owns (if any),
//! 3. disposes its children, most recently created first,
//! 4. runs its cleanup callbacks, most recently registered first.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use super::runtime::Reactive;

new_key_type! {
    /// Key of an owner node in the scope arena.
    pub struct OwnerKey;
}

#[derive(Default)]
struct OwnerNode {
    parent: Option<OwnerKey>,
    children: SmallVec<[OwnerKey; 4]>,
    reactive: Option<Rc<dyn Reactive>>,
    cleanups: Vec<Box<dyn FnOnce()>>,
}

#[derive(Default)]
struct OwnerArena {
    nodes: SlotMap<OwnerKey, OwnerNode>,
    current: Option<OwnerKey>,
}

thread_local! {
    static OWNERS: RefCell<OwnerArena> = RefCell::new(OwnerArena::default());
}

fn with_arena<R>(f: impl FnOnce(&mut OwnerArena) -> R) -> R {
    OWNERS.with(|arena| f(&mut arena.borrow_mut()))
}

/// Restores the previously current owner when dropped.
pub(crate) struct OwnerFrame {
    previous: Option<OwnerKey>,
}

impl OwnerFrame {
    pub(crate) fn enter(key: OwnerKey) -> Self {
        let previous = with_arena(|arena| arena.current.replace(key));
        Self { previous }
    }
}

impl Drop for OwnerFrame {
    fn drop(&mut self) {
        let previous = self.previous;
        let _ = OWNERS.try_with(|arena| arena.borrow_mut().current = previous);
    }
}

/// Create an owner node as a child of the current owner.
pub(crate) fn create_owner() -> OwnerKey {
    with_arena(|arena| {
        let parent = arena
            .current
            .filter(|parent| arena.nodes.contains_key(*parent));
        let key = arena.nodes.insert(OwnerNode {
            parent,
            ..OwnerNode::default()
        });
        if let Some(parent) = parent {
            arena.nodes[parent].children.push(key);
        }
        key
    })
}

/// Hand a reactive value to an owner node, which keeps it alive.
pub(crate) fn adopt(key: OwnerKey, reactive: Rc<dyn Reactive>) {
    with_arena(|arena| {
        if let Some(node) = arena.nodes.get_mut(key) {
            node.reactive = Some(reactive);
        }
    });
}

fn dispose_owner(key: OwnerKey) {
    let node = with_arena(|arena| {
        let node = arena.nodes.remove(key)?;
        if let Some(parent) = node.parent.and_then(|p| arena.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != key);
        }
        Some(node)
    });

    // The arena borrow is released before any user code runs.
    let Some(node) = node else {
        return;
    };

    if let Some(reactive) = &node.reactive {
        reactive.stop();
    }
    for child in node.children.iter().rev() {
        dispose_owner(*child);
    }
    for cleanup in node.cleanups.into_iter().rev() {
        cleanup();
    }
}

/// A disposable group of reactive registrations.
///
/// # Example
///
/// ```rust,ignore
/// let scope = Scope::new();
/// scope.run(|| {
///     Effect::new(move || println!("{}", count.get()));
/// });
///
/// // The effect never runs again.
/// scope.dispose();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    key: OwnerKey,
}

impl Scope {
    /// Create a scope owned by the current scope, if any.
    pub fn new() -> Self {
        Self {
            key: create_owner(),
        }
    }

    pub(crate) fn from_key(key: OwnerKey) -> Self {
        Self { key }
    }

    /// Run `f` with this scope as the current owner.
    ///
    /// Effects and scopes created during `f` belong to this scope.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _frame = OwnerFrame::enter(self.key);
        f()
    }

    /// Stop every registration collected by this scope, transitively.
    ///
    /// Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        tracing::debug!(scope = ?self.key, "disposing scope");
        dispose_owner(self.key);
    }

    /// Check if the scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        with_arena(|arena| !arena.nodes.contains_key(self.key))
    }

    /// Number of live child scopes (including effects) owned by this scope.
    pub fn child_count(&self) -> usize {
        with_arena(|arena| arena.nodes.get(self.key).map_or(0, |node| node.children.len()))
    }

    /// The scope that is current right now, if any.
    pub fn current() -> Option<Scope> {
        with_arena(|arena| {
            arena
                .current
                .filter(|key| arena.nodes.contains_key(*key))
                .map(|key| Scope { key })
        })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` inside a fresh scope and return the scope's handle.
pub fn scope(f: impl FnOnce()) -> Scope {
    let scope = Scope::new();
    scope.run(f);
    scope
}

/// Register a callback to run when the current scope is disposed.
///
/// Outside of any scope the callback is dropped without running.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let rejected = with_arena(|arena| {
        let Some(node) = arena.current.and_then(|key| arena.nodes.get_mut(key)) else {
            return true;
        };
        node.cleanups.push(Box::new(f));
        false
    });

    if rejected {
        tracing::trace!("on_cleanup called outside of a scope");
    }
}
