//! Host Tree
//!
//! An in-memory mutable tree of elements, text nodes and fragments. It is the
//! surface the renderer writes into and stands in for a browser document:
//!
//! - ordered insertion before a reference sibling (or at the end)
//! - removal that detaches without invalidating outstanding handles
//! - attributes (strings) and properties ([`Value`](crate::value::Value)s)
//! - event listeners, dispatched synchronously on the target node
//!
//! Structural mistakes (inserting a node into its own subtree, using a
//! reference that is not a child) are reported as [`DomError`](crate::error::DomError)s.

mod event;
mod node;

pub use event::{Event, Listener};
pub use node::{Node, NodeId, NodeKind, NodeSnapshot};
