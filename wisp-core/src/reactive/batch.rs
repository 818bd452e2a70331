//! Write batches.
//!
//! Writes made while a batch is open queue their dependent effects instead of
//! running them. The queue is flushed once, when the outermost batch closes,
//! so N writes inside one batch re-run each dependent at most once.

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::runtime::Runtime;

/// Open a write batch.
pub fn start_batch() {
    Runtime::start_batch();
}

/// Close a write batch. The outermost close flushes pending effects.
pub fn end_batch() {
    Runtime::end_batch();
}

/// Run `f` inside a write batch.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _guard = BatchGuard::new();
    f()
}

/// Keeps a write batch open until dropped.
///
/// The batch is closed on drop, including while unwinding from a panic, so
/// writes made before the panic are still flushed. A binding that panics
/// during that flush is logged and dropped, so the original panic keeps
/// unwinding.
#[must_use = "the batch closes as soon as the guard is dropped"]
pub struct BatchGuard {
    _private: (),
}

impl BatchGuard {
    pub fn new() -> Self {
        start_batch();
        Self { _private: () }
    }
}

impl Default for BatchGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            end_batch();
            return;
        }

        if let Err(payload) = catch_unwind(AssertUnwindSafe(end_batch)) {
            tracing::error!(
                panic = panic_message(payload.as_ref()),
                "binding panicked while flushing an unwinding batch"
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn nested_batches_collapse() {
        let signal = Signal::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = signal.clone();
        let log = seen.clone();
        Effect::new(move || log.borrow_mut().push(s.get()));

        batch(|| {
            signal.set(1);
            batch(|| signal.set(2));
            assert_eq!(Runtime::batch_depth(), 1);
            signal.set(3);
        });

        assert_eq!(*seen.borrow(), vec![0, 3]);
    }

    #[test]
    fn guard_flushes_on_panic() {
        let signal = Signal::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = signal.clone();
        let log = seen.clone();
        Effect::new(move || log.borrow_mut().push(s.get()));

        let writer = signal.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = BatchGuard::new();
            writer.set(7);
            panic!("handler failed");
        }));

        assert!(result.is_err());
        assert_eq!(Runtime::batch_depth(), 0);
        assert_eq!(*seen.borrow(), vec![0, 7]);
    }

    #[test]
    fn binding_panic_during_unwinding_flush_is_contained() {
        let signal = Signal::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = signal.clone();
        let log = seen.clone();
        Effect::new(move || {
            let n = s.get();
            assert!(n < 10, "value out of range");
            log.borrow_mut().push(n);
        });

        let writer = signal.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = BatchGuard::new();
            writer.set(99);
            panic!("handler failed");
        }));

        // The handler's own panic is the one that propagates
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"handler failed"));
        assert_eq!(Runtime::batch_depth(), 0);
        assert_eq!(*seen.borrow(), vec![0]);

        signal.set(3);
        assert_eq!(*seen.borrow(), vec![0, 3]);
    }

    #[test]
    fn batch_returns_value() {
        assert_eq!(batch(|| 42), 42);
    }
}
