//! Stack protocol
//!
//! Host functions called from script see their arguments on a call-scoped
//! LIFO stack (rightmost argument on top), pop what they need, push their
//! results in return order and report how many they pushed. The top `n`
//! slots then become the call's results.

use mlua::MultiValue;

use crate::value::Value;

/// Largest result count a call may request (Lua's own stack limit)
pub const MAX_RESULTS: usize = 1_000_000;

/// Call-scoped argument/result stack
#[derive(Debug, Default, Clone)]
pub struct CallStack {
    slots: Vec<Value>,
}

impl CallStack {
    /// Stack holding `args`, the last one on top
    pub fn new(args: Vec<Value>) -> Self {
        Self { slots: args }
    }

    pub(crate) fn from_multi(args: MultiValue) -> Self {
        Self {
            slots: args.into_iter().map(Value::from_raw).collect(),
        }
    }

    /// Remove the top slot; nil once the stack is empty
    pub fn pop(&mut self) -> Value {
        self.slots.pop().unwrap_or(Value::NIL)
    }

    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The top `count` slots, bottom first
    ///
    /// Slots requested below the bottom of the stack read as nil. `count` is
    /// capped at [`MAX_RESULTS`].
    pub fn results(mut self, count: usize) -> Vec<Value> {
        let count = count.min(MAX_RESULTS);
        let available = count.min(self.slots.len());
        let mut out = vec![Value::NIL; count - available];
        out.extend(self.slots.split_off(self.slots.len() - available));
        out
    }

    pub(crate) fn into_multi(self, count: usize) -> MultiValue {
        self.results(count).into_iter().map(Value::into_raw).collect()
    }
}
