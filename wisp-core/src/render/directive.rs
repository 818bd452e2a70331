//! Directive Dispatch
//!
//! Decides, per attribute key, how a value is bound to a freshly created
//! element. First match wins:
//!
//! | key / value                 | binding                                        |
//! |-----------------------------|------------------------------------------------|
//! | event prefix + callable     | listener wrapped in a write batch              |
//! | property prefix             | property, static or re-set on every change     |
//! | reference key + callable    | invoked once, with the element if it takes one |
//! | any other key + callable    | attribute re-set on every change               |
//! | anything else               | attribute set once                             |
//!
//! The prefixes and the reference key come from the installed
//! [`RenderConfig`].

use std::fmt;
use std::rc::Rc;

use crate::config::RenderConfig;
use crate::dom::{Event, Node};
use crate::reactive::{BatchGuard, Effect, Signal};
use crate::value::Value;

/// An attribute value.
#[derive(Clone)]
pub enum AttrValue {
    /// A literal.
    Static(Value),

    /// An event handler.
    Handler(Rc<dyn Fn(&Event)>),

    /// A reference callback, handed the element it is attached to.
    Ref(Rc<dyn Fn(&Node)>),

    /// A producer, re-evaluated whenever anything it reads changes.
    Dynamic(Rc<dyn Fn() -> Value>),
}

impl AttrValue {
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        AttrValue::Handler(Rc::new(f))
    }

    pub fn node_ref(f: impl Fn(&Node) + 'static) -> Self {
        AttrValue::Ref(Rc::new(f))
    }

    pub fn dynamic<V, F>(f: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<Value>,
    {
        AttrValue::Dynamic(Rc::new(move || f().into()))
    }

    /// Everything but a literal counts as callable.
    pub fn is_callable(&self) -> bool {
        !matches!(self, AttrValue::Static(_))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            AttrValue::Handler(_) => f.write_str("Handler(..)"),
            AttrValue::Ref(_) => f.write_str("Ref(..)"),
            AttrValue::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

macro_rules! impl_attr_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(v: $ty) -> Self {
                    AttrValue::Static(Value::from(v))
                }
            }
        )*
    };
}

impl_attr_from_value!(Value, &str, String, &String, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<Value>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        AttrValue::Static(v.into())
    }
}

impl<T> From<Signal<T>> for AttrValue
where
    T: Clone + Into<Value> + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        AttrValue::dynamic(move || signal.get())
    }
}

/// How an attribute key binds to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Listen for the named event.
    Event(String),
    /// Write the named host property.
    Property(String),
    /// Hand the element to a callback.
    Ref,
    /// Keep an attribute in sync with a producer.
    Reactive,
    /// Set an attribute once.
    Static,
}

impl Directive {
    pub fn classify(key: &str, value: &AttrValue, config: &RenderConfig) -> Self {
        if value.is_callable() {
            if let Some(event) = config.event_name(key) {
                return Directive::Event(event);
            }
        }
        if let Some(property) = config.property_name(key) {
            return Directive::Property(property.to_owned());
        }
        if key == config.ref_key {
            return Directive::Ref;
        }
        if value.is_callable() {
            Directive::Reactive
        } else {
            Directive::Static
        }
    }
}

/// Bind one attribute to `el`.
pub fn apply_attribute(el: &Node, key: &str, value: AttrValue, config: &RenderConfig) {
    match Directive::classify(key, &value, config) {
        Directive::Event(name) => bind_event(el, name, value),
        Directive::Property(name) => bind_property(el, key, name, value),
        Directive::Ref => match value {
            AttrValue::Ref(callback) => callback(el),
            AttrValue::Dynamic(producer) => {
                producer();
            }
            AttrValue::Static(_) => {}
            other => skip(key, &other),
        },
        Directive::Reactive => match value {
            AttrValue::Dynamic(producer) => {
                let el = el.clone();
                let name = key.to_owned();
                Effect::new(move || el.set_attribute(&name, producer().to_string()));
            }
            other => skip(key, &other),
        },
        Directive::Static => {
            if let AttrValue::Static(value) = value {
                el.set_attribute(key, value.to_string());
            }
        }
    }
}

fn bind_event(el: &Node, name: String, value: AttrValue) {
    let call: Rc<dyn Fn(&Event)> = match value {
        AttrValue::Handler(handler) => handler,
        AttrValue::Dynamic(producer) => Rc::new(move |_: &Event| {
            producer();
        }),
        AttrValue::Ref(callback) => Rc::new(move |event: &Event| {
            if let Some(target) = event.target() {
                callback(&target);
            }
        }),
        AttrValue::Static(_) => return,
    };

    el.add_event_listener(name, move |event| {
        let _batch = BatchGuard::new();
        call(event);
    });
}

fn bind_property(el: &Node, key: &str, name: String, value: AttrValue) {
    match value {
        AttrValue::Static(value) => el.set_property(&name, value),
        AttrValue::Dynamic(producer) => {
            let el = el.clone();
            Effect::new(move || el.set_property(&name, producer()));
        }
        other => skip(key, &other),
    }
}

fn skip(key: &str, value: &AttrValue) {
    tracing::warn!(key, ?value, "callback cannot be bound under this key, skipping");
}
