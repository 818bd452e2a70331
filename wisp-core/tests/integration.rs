//! Integration Tests for the Renderer
//!
//! These tests drive `jsx`, `insert` and the directive dispatcher together
//! with the reactive engine and check the host tree they produce.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use wisp_core::prelude::*;
use wisp_core::reactive::Runtime;

fn node(child: Child) -> Node {
    child.into_node().expect("tag elements render to nodes")
}

/// Text of every non-marker text child, in order.
fn visible_texts(parent: &Node) -> Vec<String> {
    parent
        .children()
        .iter()
        .map(Node::text_content)
        .filter(|t| !t.is_empty())
        .collect()
}

fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let c = Rc::new(Cell::new(0));
    (c.clone(), c)
}

/// Test that static attributes come out the same on every construction.
#[test]
fn static_attribute_is_idempotent() {
    for _ in 0..3 {
        let el = node(jsx("div", Props::new().attr("x", "v")));
        assert_eq!(el.attribute("x").as_deref(), Some("v"));
    }
}

/// Test that a reactive attribute updates in place.
#[test]
fn reactive_attribute_updates_same_node() {
    let count = Signal::new(1);
    let c = count.clone();
    let el = node(jsx(
        "span",
        Props::new().dynamic("title", move || format!("count is {}", c.get())),
    ));
    let id = el.id();

    count.set(2);

    // Same node, new attribute value
    assert_eq!(el.id(), id);
    assert_eq!(el.attribute("title").as_deref(), Some("count is 2"));
}

/// Test that a handler writing two cells re-runs each dependent region once.
#[test]
fn handler_writes_are_coalesced() {
    let first = Signal::new(0);
    let second = Signal::new(0);
    let (first_runs, fr) = counter();
    let (second_runs, sr) = counter();

    let (f, s) = (first.clone(), second.clone());
    let (f2, s2) = (first.clone(), second.clone());
    let button = node(jsx(
        "button",
        Props::new()
            .on("onClick", move |_| {
                f.set(1);
                s.set(2);
                f.set(3);
            })
            .child(Child::dynamic(move || {
                fr.set(fr.get() + 1);
                f2.get()
            }))
            .child(Child::dynamic(move || {
                sr.set(sr.get() + 1);
                s2.get()
            })),
    ));

    assert_eq!((first_runs.get(), second_runs.get()), (1, 1));

    button.emit("click");

    // One re-run each, despite three writes
    assert_eq!((first_runs.get(), second_runs.get()), (2, 2));
    assert_eq!(visible_texts(&button), ["3", "2"]);
}

/// Test that a region holds only the latest output and leaves siblings alone.
#[test]
fn region_holds_only_latest_output() {
    let n = Signal::new(3usize);
    let n2 = n.clone();
    let list = node(jsx(
        "ol",
        Props::new()
            .child(jsx("li", Props::new().child("head")))
            .child(Child::dynamic(move || {
                (0..n2.get())
                    .map(|i| jsx("li", Props::new().child(i)))
                    .collect::<Vec<_>>()
            }))
            .child(jsx("li", Props::new().child("tail"))),
    ));
    let head = list.first_child();
    let tail = list.last_child();

    n.set(1);
    assert_eq!(visible_texts(&list), ["head", "0", "tail"]);

    n.set(2);
    assert_eq!(visible_texts(&list), ["head", "0", "1", "tail"]);
    assert_eq!(list.first_child(), head);
    assert_eq!(list.last_child(), tail);
}

/// Test that disposing a scope stops every binding created in it.
#[test]
fn scope_disposal_stops_bindings() {
    let label = Signal::new("a".to_owned());
    let mut el = None;

    let (l, l2) = (label.clone(), label.clone());
    let owner = scope(|| {
        el = Some(node(jsx(
            "p",
            Props::new()
                .dynamic("data-label", move || l.get())
                .child(Child::dynamic(move || l2.get())),
        )));
    });
    let el = el.unwrap();
    assert_eq!(label.subscriber_count(), 2);

    owner.dispose();
    label.set("b".into());

    // No mutation after disposal
    assert_eq!(label.subscriber_count(), 0);
    assert_eq!(el.to_html(), "<p data-label=\"a\">a</p>");
}

/// Test that replaced nested regions never react again.
#[test]
fn nested_regions_are_disposed_on_rerun() {
    let outer = Signal::new(0);
    let inner = Signal::new(0);
    let (inner_runs, ir) = counter();

    let (o, i) = (outer.clone(), inner.clone());
    let root = node(jsx(
        "div",
        Props::new().child(Child::dynamic(move || {
            let (i, ir) = (i.clone(), ir.clone());
            jsx(
                "section",
                Props::new().child(o.get()).child(Child::dynamic(move || {
                    ir.set(ir.get() + 1);
                    i.get()
                })),
            )
        })),
    ));

    for k in 1..=5 {
        outer.set(k);
        // Exactly one live inner binding at any time
        assert_eq!(inner.subscriber_count(), 1);
    }
    assert_eq!(inner_runs.get(), 6);

    inner.set(7);
    assert_eq!(inner_runs.get(), 7);
    assert_eq!(root.to_html(), "<div><section>57</section></div>");
}

/// Test that null, booleans and empty options render nothing.
#[test]
fn null_and_boolean_children_are_invisible() {
    let el = node(jsx(
        "div",
        Props::new()
            .child(Value::Null)
            .child(true)
            .child(false)
            .child(None::<&str>)
            .child(()),
    ));

    assert_eq!(el.child_count(), 0);
}

/// Test that nested sequences flatten in order.
#[test]
fn sequence_order_is_preserved() {
    let el = node(jsx(
        "div",
        Props::new().children(vec![
            Child::from("a"),
            Child::List(vec![Child::from("b"), Child::List(vec![Child::from("c")])]),
            Child::List(vec![]),
            Child::from("d"),
        ]),
    ));

    assert_eq!(visible_texts(&el), ["a", "b", "c", "d"]);
}

/// Test the list scenario: empty, two items, then one.
#[test]
fn list_region_end_to_end() {
    let items: Signal<Vec<&'static str>> = Signal::new(vec![]);
    let i = items.clone();
    let list = node(jsx(
        "list",
        Props::new().child(Child::dynamic(move || i.get())),
    ));

    // Only the two markers
    assert_eq!(list.child_count(), 2);
    assert!(visible_texts(&list).is_empty());

    items.set(vec!["a", "b"]);
    assert_eq!(visible_texts(&list), ["a", "b"]);
    let previous: Vec<Node> = list
        .children()
        .into_iter()
        .filter(|n| !n.text_content().is_empty())
        .collect();

    items.set(vec!["b"]);
    assert_eq!(visible_texts(&list), ["b"]);
    assert_eq!(list.child_count(), 3);
    assert!(previous.iter().all(|n| n.parent().is_none()));
}

/// Test that writes made before a handler panics are still rendered.
#[test]
fn handler_panic_still_flushes_writes() {
    let value = Signal::new(0);
    let v = value.clone();
    let v2 = value.clone();
    let button = node(jsx(
        "button",
        Props::new()
            .on("onClick", move |_| {
                v.set(5);
                panic!("handler failed");
            })
            .child(Child::dynamic(move || v2.get())),
    ));

    let result = catch_unwind(AssertUnwindSafe(|| button.emit("click")));

    assert!(result.is_err());
    assert_eq!(Runtime::batch_depth(), 0);
    assert_eq!(visible_texts(&button), ["5"]);
}

/// Test that a failing producer leaves the last good content in place.
#[test]
fn producer_panic_keeps_last_content() {
    let n = Signal::new(1);
    let n2 = n.clone();
    let el = node(jsx(
        "div",
        Props::new().child(Child::dynamic(move || {
            let value = n2.get();
            if value == 0 {
                panic!("division by zero");
            }
            100 / value
        })),
    ));

    let writer = n.clone();
    assert!(catch_unwind(AssertUnwindSafe(|| writer.set(0))).is_err());
    assert_eq!(visible_texts(&el), ["100"]);

    // Next good run recovers
    n.set(4);
    assert_eq!(visible_texts(&el), ["25"]);
}

/// Test that a node inserted in two places ends up in the last one.
#[test]
fn node_inserted_twice_is_moved() {
    let badge = Node::element("em");
    let (b1, b2) = (badge.clone(), badge.clone());

    let el = node(jsx(
        "div",
        Props::new()
            .child(jsx("p", Props::new().child(Child::dynamic(move || b1.clone()))))
            .child(jsx("p", Props::new().child(Child::dynamic(move || b2.clone())))),
    ));

    assert_eq!(el.to_html(), "<div><p></p><p><em></em></p></div>");
    assert_eq!(badge.parent(), el.last_child());
}

/// Test that a caller's node handle outlives its removal from a region.
#[test]
fn removed_nodes_remain_usable() {
    let show = Signal::new(true);
    let panel = Node::element("aside");
    let (s, p) = (show.clone(), panel.clone());

    let el = node(jsx(
        "main",
        Props::new().child(Child::dynamic(move || s.get().then(|| p.clone()))),
    ));
    assert_eq!(panel.parent(), Some(el.clone()));

    show.set(false);
    assert!(panel.parent().is_none());
    panel.set_attribute("hidden", "");

    show.set(true);
    assert_eq!(el.to_html(), "<main><aside hidden=\"\"></aside></main>");
}

/// Test that directives follow an installed configuration.
#[test]
fn custom_render_config() {
    let config = RenderConfig::from_json(
        r#"{ "event_prefix": "on:", "property_prefix": "prop:", "ref_key": "bind" }"#,
    )
    .unwrap();
    let previous = config.install().unwrap();

    let (hits, h) = counter();
    let bound = Rc::new(Cell::new(false));
    let b = bound.clone();
    let el = node(jsx(
        "input",
        Props::new()
            .on("on:input", move |_| h.set(h.get() + 1))
            .attr("prop:value", "typed")
            .attr("$value", "kept")
            .node_ref(move |_| b.set(true)),
    ));

    el.emit("input");
    assert_eq!(hits.get(), 1);
    assert_eq!(el.property("value"), Some(Value::from("typed")));
    assert_eq!(el.attribute("$value").as_deref(), Some("kept"));
    assert!(bound.get());

    (*previous).clone().install().unwrap();
}

/// Test that snapshots serialize the rendered tree.
#[test]
fn snapshot_of_rendered_tree() {
    let el = node(jsx(
        "a",
        Props::new().attr("href", "/home").child("Home"),
    ));

    let json = serde_json::to_value(el.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "element",
            "tag": "a",
            "attributes": { "href": "/home" },
            "children": [{ "type": "text", "data": "Home" }]
        })
    );
}
