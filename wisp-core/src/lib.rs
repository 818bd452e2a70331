//! Wisp Core
//!
//! This crate provides the runtime for the Wisp fine-grained reactive
//! renderer. It implements:
//!
//! - Reactive primitives (signals, memos, effects, scopes, batches)
//! - An in-memory host tree of elements, text nodes and fragments
//! - Element construction with attribute directives
//! - Child reconciliation with marker-delimited dynamic regions
//!
//! There is no virtual tree. Every reactive binding is an effect that writes
//! directly into the host node it belongs to, so a change re-runs only the
//! bindings that read it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Reactive primitives and dependency tracking
//! - `dom`: The host tree the renderer mutates
//! - `render`: `jsx`, directive dispatch, `insert` and `Fragment`
//! - `value`: Primitive values shared by attributes, properties and text
//! - `config`: Directive naming conventions
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use wisp_core::prelude::*;
//!
//! let items = Signal::new(Vec::<String>::new());
//!
//! let list = {
//!     let items = items.clone();
//!     jsx(
//!         "ul",
//!         Props::new().child(Child::dynamic(move || {
//!             items
//!                 .get()
//!                 .into_iter()
//!                 .map(|item| jsx("li", Props::new().child(item)))
//!                 .collect::<Vec<_>>()
//!         })),
//!     )
//! }
//! .into_node()
//! .unwrap();
//!
//! items.set(vec!["a".into(), "b".into()]);
//! assert_eq!(list.to_html(), "<ul><li>a</li><li>b</li></ul>");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod prelude;
pub mod reactive;
pub mod render;
pub mod value;
