use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

/// Accumulates a sequence of messages (e.g. validation failures).
#[derive(Default)]
pub struct MessageAccumulator {
    /// Accumulated messages.
    /// This is a `Rc<RefCell>` to support accumulators derived from `with_prefix()` accumulating to
    /// the same underlying collection.
    msgs: Rc<RefCell<Vec<String>>>,
    /// Optional prefix to all new messages, e.g. describing higher level context.
    prefix: String,
}

impl MessageAccumulator {
    /// Returns a new accumulator backed by the same collection, that will prefix each new message with
    /// a formatted string.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        MessageAccumulator { msgs: self.msgs.clone(), prefix: self.prefix.to_owned() + prefix }
    }

    pub fn is_empty(&self) -> bool {
        self.msgs.borrow().is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.msgs.borrow().to_owned()
    }

    /// Adds a message to the accumulator
    pub fn add(&self, msg: &str) {
        self.msgs.borrow_mut().push(format!("{}{msg}", self.prefix));
    }

    /// Adds a message if predicate is false
    pub fn require(&self, predicate: bool, msg: &str) {
        if !predicate {
            self.add(msg);
        }
    }

    /// Adds a message if result is `Err`. Underlying error must be `Display`.
    pub fn require_no_error<V, E: Display>(&self, result: Result<V, E>, msg: &str) {
        if let Err(e) = result {
            self.add(&format!("{msg}: {e}"));
        }
    }

    /// Panics if any messages were accumulated, listing all of them.
    pub fn assert_empty(&self) {
        assert!(self.is_empty(), "{}", self.messages().join("\n"));
    }
}
