//! Everything an application needs to build and drive a UI.

pub use crate::config::RenderConfig;
pub use crate::dom::{Event, Node};
pub use crate::error::DomError;
pub use crate::reactive::{batch, on_cleanup, scope, untrack, BatchGuard, Effect, Memo, Scope, Signal};
pub use crate::render::{
    fragment, insert, jsx, jsx_dev, jsxs, AttrValue, Child, Component, ElementType, Fragment, Props,
};
pub use crate::value::Value;
