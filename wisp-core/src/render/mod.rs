//! Rendering
//!
//! Turns element descriptions into live host nodes and keeps them in sync with
//! reactive state. There is no virtual tree and no diffing: every binding is
//! an effect that writes straight into the node it was created for.
//!
//! - [`jsx`] creates elements and calls components.
//! - [`apply_attribute`] binds one attribute (event, property, ref, reactive
//!   or static attribute).
//! - [`insert`] mounts children; producer functions get a marker-delimited
//!   region that is cleared and refilled on every change.
//! - [`Fragment`] groups children without an element of its own.
//!
//! # Example
//!
//! ```
//! use wisp_core::prelude::*;
//!
//! let count = Signal::new(0);
//! let c = count.clone();
//! let button = jsx(
//!     "button",
//!     Props::new()
//!         .on("onClick", move |_| c.update(|n| n + 1))
//!         .child("clicked ")
//!         .child(count.clone())
//!         .child(" times"),
//! )
//! .into_node()
//! .unwrap();
//!
//! button.emit("click");
//! assert_eq!(button.text_content(), "clicked 1 times");
//! ```

mod child;
mod directive;
mod element;

pub use child::{insert, Child, Producer};
pub use directive::{apply_attribute, AttrValue, Directive};
pub use element::{
    create_element, fragment, jsx, jsx_dev, jsxs, try_create_element, Component, ElementType,
    Fragment, Props,
};
