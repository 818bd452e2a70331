//! Child Reconciliation
//!
//! [`insert`] mounts a child description into a parent node. Static shapes
//! are inserted once. A producer function gets a *region*: two empty text
//! nodes bracketing whatever the producer returned last. An effect re-runs
//! the producer when anything it read changes and swaps the region's content.
//!
//! # Region Re-runs
//!
//! Each run:
//!
//! 1. disposes the scope of the previous run, stopping every binding the old
//!    content created (nested regions included),
//! 2. opens a new scope and evaluates the producer inside it,
//! 3. removes everything strictly between the markers,
//! 4. inserts the new content before the end marker.
//!
//! Removal always completes before insertion starts. The producer is
//! evaluated before removal, so a producer that panics leaves the previous
//! content on screen (its bindings are already stopped).

use std::fmt;
use std::rc::Rc;

use crate::dom::Node;
use crate::error::DomError;
use crate::reactive::{Effect, Scope, Signal};
use crate::value::Value;

/// A zero-argument function producing children.
pub type Producer = Rc<dyn Fn() -> Child>;

/// A child description.
#[derive(Clone, Default)]
pub enum Child {
    /// Renders nothing.
    #[default]
    Empty,

    /// A primitive. Null and booleans render nothing; everything else becomes
    /// a text node.
    Value(Value),

    /// A host node, inserted as-is. Inserting the same node twice moves it.
    Node(Node),

    /// A sequence of children, rendered in order.
    List(Vec<Child>),

    /// A producer, re-run whenever anything it reads changes.
    Dynamic(Producer),
}

impl Child {
    /// Wrap a producer function.
    pub fn dynamic<C, F>(f: F) -> Self
    where
        F: Fn() -> C + 'static,
        C: Into<Child>,
    {
        Child::Dynamic(Rc::new(move || f().into()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }

    /// The node this child holds, if it is a node.
    pub fn into_node(self) -> Option<Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Append another child, turning this one into a list if needed.
    pub fn push(&mut self, child: impl Into<Child>) {
        let child = child.into();
        match self {
            Child::Empty => *self = child,
            Child::List(children) => children.push(child),
            _ => {
                let first = std::mem::take(self);
                *self = Child::List(vec![first, child]);
            }
        }
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Child::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Child::List(l) => f.debug_tuple("List").field(l).finish(),
            Child::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&Node> for Child {
    fn from(node: &Node) -> Self {
        Child::Node(node.clone())
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Value(value)
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

macro_rules! impl_child_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(v: $ty) -> Self {
                    Child::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_child_from_value!(&str, String, &String, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(v: Option<T>) -> Self {
        v.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(v: Vec<T>) -> Self {
        Child::List(v.into_iter().map(Into::into).collect())
    }
}

/// A signal used as a child renders its current value and follows it.
impl<T> From<Signal<T>> for Child
where
    T: Clone + Into<Child> + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        Child::dynamic(move || signal.get())
    }
}

/// Mount `child` into `parent` before `marker`, or at the end.
///
/// Errors come from the host tree, e.g. a `marker` that is not a child of
/// `parent`. Content inserted before the error stays in place.
pub fn insert(parent: &Node, child: impl Into<Child>, marker: Option<&Node>) -> Result<(), DomError> {
    match child.into() {
        Child::Empty => Ok(()),
        Child::Value(value) if !value.is_renderable() => Ok(()),
        Child::Value(value) => parent.insert_before(&Node::text(value.to_string()), marker),
        Child::Node(node) => parent.insert_before(&node, marker),
        Child::List(children) => {
            for child in children {
                insert(parent, child, marker)?;
            }
            Ok(())
        }
        Child::Dynamic(producer) => {
            let region = Region::open(parent, marker)?;
            mount_region(region, producer);
            Ok(())
        }
    }
}

/// The marker-delimited span owned by one producer.
///
/// The parent is looked up through the markers on every run: a region opened
/// inside a fragment lives on in whatever node the fragment was inserted into.
struct Region {
    start: Node,
    end: Node,
}

impl Region {
    /// Insert the start and end markers before `marker`.
    fn open(parent: &Node, marker: Option<&Node>) -> Result<Self, DomError> {
        let start = Node::text("");
        let end = Node::text("");
        parent.insert_before(&end, marker)?;
        parent.insert_before(&start, Some(&end))?;
        Ok(Self { start, end })
    }

    fn parent(&self) -> Option<Node> {
        self.end.parent()
    }

    /// Remove every node strictly between the markers, front to back.
    fn clear(&self, parent: &Node) -> Result<usize, DomError> {
        let mut removed = 0;
        while let Some(next) = self.start.next_sibling() {
            if next == self.end {
                break;
            }
            parent.remove_child(&next)?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn mount_region(region: Region, producer: Producer) {
    let mut current: Option<Scope> = None;

    Effect::new(move || {
        if let Some(previous) = current.take() {
            previous.dispose();
        }

        let scope = Scope::new();
        current = Some(scope);

        let result = scope.run(|| {
            let content = producer();
            let Some(parent) = region.parent() else {
                tracing::warn!("region markers were detached, dropping update");
                return Ok(());
            };
            let removed = region.clear(&parent)?;
            tracing::trace!(removed, "re-rendering region");
            insert(&parent, content, Some(&region.end))
        });

        if let Err(err) = result {
            tracing::error!(error = %err, "failed to update dynamic region");
        }
    });
}
