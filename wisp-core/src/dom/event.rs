//! Events dispatched to host nodes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::value::Value;

use super::Node;

/// A listener registered on a host node.
pub type Listener = Rc<dyn Fn(&Event)>;

/// An event delivered to the listeners of one node.
#[derive(Debug)]
pub struct Event {
    name: String,
    detail: Value,
    target: RefCell<Option<Node>>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_detail(name, Value::Null)
    }

    /// Create an event carrying a payload (an input's new text, a key code).
    pub fn with_detail(name: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
            target: RefCell::new(None),
            default_prevented: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }

    /// The node the event was dispatched to. `None` before dispatch.
    pub fn target(&self) -> Option<Node> {
        self.target.borrow().clone()
    }

    pub(crate) fn set_target(&self, node: &Node) {
        *self.target.borrow_mut() = Some(node.clone());
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}
