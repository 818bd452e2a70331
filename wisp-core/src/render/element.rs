//! Element construction.
//!
//! [`jsx`] is the one entry point generated code calls. A component type is
//! invoked with the props and its result is returned as-is. A tag creates a
//! host element, binds every attribute through the directive dispatcher and
//! mounts the children.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::RenderConfig;
use crate::dom::{Event, Node};
use crate::error::DomError;

use super::child::{insert, Child};
use super::directive::{apply_attribute, AttrValue};

/// Attributes plus children, as handed to an element or a component.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub attrs: IndexMap<String, AttrValue>,
    pub children: Child,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute. Setting a key twice keeps its first position.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Bind an event handler under `key` (the full key, e.g. `onClick`).
    pub fn on(self, key: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.attr(key, AttrValue::handler(handler))
    }

    /// Bind an attribute or property under `key` to a producer.
    pub fn dynamic<V, F>(self, key: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<crate::value::Value>,
    {
        self.attr(key, AttrValue::dynamic(producer))
    }

    /// Register a reference callback under the configured reference key.
    pub fn node_ref(self, callback: impl Fn(&Node) + 'static) -> Self {
        let key = RenderConfig::current().ref_key.clone();
        self.attr(key, AttrValue::node_ref(callback))
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child);
        self
    }

    /// Replace all children.
    pub fn children(mut self, children: impl Into<Child>) -> Self {
        self.children = children.into();
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.attrs.shift_remove(key)
    }

    /// The literal value of an attribute, if it is one.
    pub fn value(&self, key: &str) -> Option<&crate::value::Value> {
        match self.attrs.get(key)? {
            AttrValue::Static(value) => Some(value),
            _ => None,
        }
    }
}

/// A function component: props in, children out.
#[derive(Clone)]
pub struct Component(Rc<dyn Fn(Props) -> Child>);

impl Component {
    pub fn new<C, F>(f: F) -> Self
    where
        F: Fn(Props) -> C + 'static,
        C: Into<Child>,
    {
        Self(Rc::new(move |props| f(props).into()))
    }

    pub fn call(&self, props: Props) -> Child {
        (self.0)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Component(..)")
    }
}

/// What [`jsx`] constructs.
#[derive(Debug, Clone)]
pub enum ElementType {
    Tag(Cow<'static, str>),
    Component(Component),
}

impl ElementType {
    /// The built-in fragment component.
    pub fn fragment() -> Self {
        ElementType::Component(Component::new(Fragment))
    }
}

impl From<&'static str> for ElementType {
    fn from(tag: &'static str) -> Self {
        ElementType::Tag(Cow::Borrowed(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Tag(Cow::Owned(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

/// Construct an element or invoke a component.
///
/// Components get `props` unchanged and may return anything that renders.
/// Tags always produce a [`Child::Node`].
pub fn jsx(ty: impl Into<ElementType>, props: Props) -> Child {
    match ty.into() {
        ElementType::Component(component) => component.call(props),
        ElementType::Tag(tag) => Child::Node(create_element(&tag, props)),
    }
}

/// Same as [`jsx`]; emitted for elements with static child lists.
pub fn jsxs(ty: impl Into<ElementType>, props: Props) -> Child {
    jsx(ty, props)
}

/// [`jsx`] inside a span carrying the caller's source location.
#[track_caller]
pub fn jsx_dev(ty: impl Into<ElementType>, props: Props) -> Child {
    let location = std::panic::Location::caller();
    let span = tracing::debug_span!("jsx", file = location.file(), line = location.line());
    let _enter = span.enter();
    jsx(ty, props)
}

/// Create a host element, logging instead of returning host-tree errors.
pub fn create_element(tag: &str, props: Props) -> Node {
    let (el, result) = build_element(tag, props);
    if let Err(err) = result {
        tracing::error!(tag, error = %err, "failed to mount children");
    }
    el
}

/// Create a host element, reporting the first host-tree error.
///
/// Children inserted before the error stay mounted.
pub fn try_create_element(tag: &str, props: Props) -> Result<Node, DomError> {
    let (el, result) = build_element(tag, props);
    result.map(|()| el)
}

fn build_element(tag: &str, props: Props) -> (Node, Result<(), DomError>) {
    let Props { attrs, children } = props;
    let config = RenderConfig::current();
    let el = Node::element(tag);

    tracing::debug!(tag, id = el.id().raw(), attrs = attrs.len(), "creating element");

    for (key, value) in attrs {
        apply_attribute(&el, &key, value, &config);
    }

    let result = insert(&el, children, None);
    (el, result)
}

/// Mount children into a new fragment node.
pub fn fragment(children: impl Into<Child>) -> Node {
    let node = Node::fragment();
    if let Err(err) = insert(&node, children, None) {
        tracing::error!(error = %err, "failed to mount fragment children");
    }
    node
}

/// The fragment component. Fragments have no attributes of their own.
#[allow(non_snake_case)]
pub fn Fragment(props: Props) -> Child {
    if !props.attrs.is_empty() {
        let keys: Vec<&str> = props.attrs.keys().map(String::as_str).collect();
        tracing::warn!(?keys, "fragments take no attributes, ignoring");
    }
    Child::Node(fragment(props.children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use crate::value::Value;
    use std::cell::{Cell, RefCell};

    fn node(child: Child) -> Node {
        child.into_node().expect("expected a node")
    }

    #[test]
    fn tag_builds_element_with_children() {
        let el = node(jsx(
            "p",
            Props::new()
                .attr("class", "greeting")
                .child("hello, ")
                .child(jsx("b", Props::new().child("world"))),
        ));

        assert_eq!(el.tag_name(), Some("p"));
        assert_eq!(el.to_html(), "<p class=\"greeting\">hello, <b>world</b></p>");
    }

    #[test]
    fn component_receives_props_and_children() {
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let card = Component::new(move |props: Props| {
            *s.borrow_mut() = props.value("title").cloned();
            jsx("section", Props::new().children(props.children))
        });

        let el = node(jsx(card, Props::new().attr("title", "Inbox").child("3 new")));

        assert_eq!(seen.borrow().clone(), Some(Value::from("Inbox")));
        assert_eq!(el.to_html(), "<section>3 new</section>");
    }

    #[test]
    fn component_result_is_returned_verbatim() {
        let label = Component::new(|_| "just text");
        match jsx(label, Props::new()) {
            Child::Value(v) => assert_eq!(v.as_str(), Some("just text")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn components_are_called_every_time() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let counted = Component::new(move |_| {
            c.set(c.get() + 1);
            Node::element("i")
        });

        jsx(counted.clone(), Props::new());
        jsx(counted, Props::new());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn jsx_and_jsxs_agree() {
        let props = || {
            Props::new().children(vec![
                jsx("li", Props::new().child("a")),
                jsx("li", Props::new().child("b")),
            ])
        };

        let a = node(jsx("ul", props())).to_html();
        let b = node(jsxs("ul", props())).to_html();
        let c = node(jsx_dev("ul", props())).to_html();

        assert_eq!(a, "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn ref_runs_before_children_mount() {
        let children_at_ref = Rc::new(Cell::new(usize::MAX));
        let c = children_at_ref.clone();

        let el = node(jsx(
            "div",
            Props::new()
                .node_ref(move |n| c.set(n.child_count()))
                .child("x"),
        ));

        assert_eq!(children_at_ref.get(), 0);
        assert_eq!(el.child_count(), 1);
    }

    #[test]
    fn fragment_collects_children() {
        let count = Signal::new(1);
        let frag = node(jsx(
            ElementType::fragment(),
            Props::new().child("a").child(count.clone()).child("c"),
        ));

        assert!(frag.is_fragment());
        assert_eq!(frag.text_content(), "a1c");

        let div = Node::element("div");
        div.append_child(&frag).unwrap();
        count.set(2);
        assert_eq!(div.to_html(), "<div>a2c</div>");
    }

    #[test]
    fn fragment_ignores_attributes() {
        let frag = node(Fragment(Props::new().attr("class", "x").child("y")));
        assert_eq!(frag.to_html(), "y");
    }

    #[test]
    fn try_create_element_reports_hierarchy_errors() {
        let holder = Node::element("div");
        let h = holder.clone();
        let result = try_create_element(
            "span",
            Props::new()
                .node_ref(move |el| h.append_child(el).unwrap())
                .child(&holder),
        );

        assert!(matches!(result, Err(DomError::HierarchyRequest { .. })));
    }
}
