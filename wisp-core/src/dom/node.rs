//! Host Nodes
//!
//! This module defines the mutable tree the renderer writes into.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::DomError;
use crate::value::Value;

use super::event::{Event, Listener};

/// Unique identifier for a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of a host node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name. Holds attributes, properties, listeners
    /// and children.
    Element(String),

    /// A text node. Leaf; holds character data only.
    Text,

    /// A detached container. Inserting it moves its children instead.
    Fragment,
}

struct NodeData {
    id: NodeId,
    kind: NodeKind,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    text: RefCell<String>,
    attributes: RefCell<IndexMap<String, String>>,
    properties: RefCell<IndexMap<String, Value>>,
    listeners: RefCell<Vec<(String, Listener)>>,
}

/// A shared handle to a host node.
///
/// Cloning the handle does not clone the node; equality is identity. A node
/// removed from its parent stays valid for as long as any handle to it
/// exists, and can be inserted again.
#[derive(Clone)]
pub struct Node {
    data: Rc<NodeData>,
}

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Node {
    fn with_kind(kind: NodeKind, text: String) -> Self {
        Self {
            data: Rc::new(NodeData {
                id: NodeId::new(),
                kind,
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                text: RefCell::new(text),
                attributes: RefCell::new(IndexMap::new()),
                properties: RefCell::new(IndexMap::new()),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a detached element.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into()), String::new())
    }

    /// Create a detached text node.
    pub fn text(data: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text, data.into())
    }

    /// Create an empty fragment.
    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment, String::new())
    }

    pub fn id(&self) -> NodeId {
        self.data.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.data.kind
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.data.kind {
            NodeKind::Element(tag) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        self.data.kind == NodeKind::Text
    }

    pub fn is_fragment(&self) -> bool {
        self.data.kind == NodeKind::Fragment
    }

    // ------------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.data.parent.borrow().upgrade().map(|data| Node { data })
    }

    /// A snapshot of the children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.data.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.data.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.data.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.data.children.borrow().last().cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.data.children.borrow();
        let index = siblings.iter().position(|n| n == self)?;
        siblings.get(index + 1).cloned()
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let siblings = parent.data.children.borrow();
        let index = siblings.iter().position(|n| n == self)?;
        index.checked_sub(1).and_then(|i| siblings.get(i)).cloned()
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Insert `node` before `reference`, or at the end when `reference` is
    /// `None`.
    ///
    /// An attached node is moved, not copied. A fragment contributes its
    /// children, in order, and is left empty.
    pub fn insert_before(&self, node: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        if self.is_text() {
            return Err(DomError::HierarchyRequest {
                parent: self.id(),
                node: node.id(),
                reason: "text nodes cannot have children",
            });
        }
        if node.contains(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.id(),
                node: node.id(),
                reason: "a node cannot be inserted into itself or its descendants",
            });
        }
        if let Some(reference) = reference {
            if reference.parent().as_ref() != Some(self) {
                return Err(DomError::NotAChild {
                    parent: self.id(),
                    child: reference.id(),
                });
            }
        }

        if node.is_fragment() {
            let moved = node.data.children.take();
            for child in &moved {
                *child.data.parent.borrow_mut() = Weak::new();
                self.attach(child, reference);
            }
            return Ok(());
        }

        // Inserting a node before itself leaves it where it is.
        let reference = match reference {
            Some(r) if r == node => node.next_sibling(),
            other => other.cloned(),
        };

        node.detach();
        self.attach(node, reference.as_ref());
        Ok(())
    }

    pub fn append_child(&self, node: &Node) -> Result<(), DomError> {
        self.insert_before(node, None)
    }

    /// Detach `child` from this node. The returned handle stays valid.
    pub fn remove_child(&self, child: &Node) -> Result<Node, DomError> {
        if child.parent().as_ref() != Some(self) {
            return Err(DomError::NotAChild {
                parent: self.id(),
                child: child.id(),
            });
        }
        child.detach();
        Ok(child.clone())
    }

    /// Detach this node from its parent, if it has one.
    pub fn remove(&self) {
        self.detach();
    }

    fn attach(&self, node: &Node, reference: Option<&Node>) {
        let mut children = self.data.children.borrow_mut();
        let index = reference
            .and_then(|r| children.iter().position(|n| n == r))
            .unwrap_or(children.len());
        children.insert(index, node.clone());
        *node.data.parent.borrow_mut() = Rc::downgrade(&self.data);
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.data.children.borrow_mut().retain(|n| n != self);
        }
        *self.data.parent.borrow_mut() = Weak::new();
    }

    // ------------------------------------------------------------------------
    // Attributes and properties
    // ------------------------------------------------------------------------

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.data
            .attributes
            .borrow_mut()
            .insert(name.to_owned(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.data.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.data.attributes.borrow().contains_key(name)
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.data.attributes.borrow_mut().shift_remove(name)
    }

    /// All attributes, in the order they were first set.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data
            .attributes
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        self.data
            .properties
            .borrow_mut()
            .insert(name.to_owned(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.data.properties.borrow().get(name).cloned()
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn add_event_listener(&self, name: impl Into<String>, listener: impl Fn(&Event) + 'static) {
        self.add_listener(name, Rc::new(listener));
    }

    pub fn add_listener(&self, name: impl Into<String>, listener: Listener) {
        self.data
            .listeners
            .borrow_mut()
            .push((name.into(), listener));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.data
            .listeners
            .borrow()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }

    /// Run this node's listeners for the event, in registration order.
    ///
    /// Events do not bubble. Returns `false` if a listener prevented the
    /// default action. A panicking listener propagates to the caller.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        event.set_target(self);

        let listeners: SmallVec<[Listener; 2]> = self
            .data
            .listeners
            .borrow()
            .iter()
            .filter(|(n, _)| n == event.name())
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }

        !event.default_prevented()
    }

    /// Dispatch a fresh event with no payload.
    pub fn emit(&self, name: &str) -> bool {
        self.dispatch_event(&Event::new(name))
    }

    // ------------------------------------------------------------------------
    // Text and serialization
    // ------------------------------------------------------------------------

    /// Concatenated character data of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.is_text() {
            out.push_str(&self.data.text.borrow());
            return;
        }
        for child in self.data.children.borrow().iter() {
            child.collect_text(out);
        }
    }

    /// Replace the character data of a text node, or all children of any
    /// other node with a single text node.
    pub fn set_text(&self, data: impl Into<String>) {
        let data = data.into();
        if self.is_text() {
            *self.data.text.borrow_mut() = data;
            return;
        }

        for child in self.data.children.take() {
            *child.data.parent.borrow_mut() = Weak::new();
        }
        if !data.is_empty() {
            self.attach(&Node::text(data), None);
        }
    }

    /// Serialize the subtree as HTML. Empty text nodes (region markers)
    /// produce no output.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.data.kind {
            NodeKind::Text => escape_into(&self.data.text.borrow(), false, out),
            NodeKind::Fragment => self.write_children_html(out),
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in self.data.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }

                self.write_children_html(out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn write_children_html(&self, out: &mut String) {
        for child in self.data.children.borrow().iter() {
            child.write_html(out);
        }
    }

    /// A serializable copy of the subtree.
    pub fn snapshot(&self) -> NodeSnapshot {
        let children = || -> Vec<NodeSnapshot> {
            self.data.children.borrow().iter().map(Node::snapshot).collect()
        };
        match &self.data.kind {
            NodeKind::Element(tag) => NodeSnapshot::Element {
                tag: tag.clone(),
                attributes: self.data.attributes.borrow().clone(),
                children: children(),
            },
            NodeKind::Text => NodeSnapshot::Text {
                data: self.data.text.borrow().clone(),
            },
            NodeKind::Fragment => NodeSnapshot::Fragment {
                children: children(),
            },
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.data.id)
            .field("kind", &self.data.kind)
            .field("child_count", &self.child_count())
            .finish()
    }
}

/// A serializable copy of a host subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "IndexMap::is_empty")]
        attributes: IndexMap<String, String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeSnapshot>,
    },
    Text {
        data: String,
    },
    Fragment {
        children: Vec<NodeSnapshot>,
    },
}
