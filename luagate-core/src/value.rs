//! Script-side values
//!
//! [`Value`] is an opaque handle to one datum living in the interpreter. It
//! never owns the datum (the Lua GC does) and never reports errors: every
//! accessor coerces with Lua's own rules and degrades to a zero value when
//! the datum has the wrong kind. Callers who want strict checking test with
//! the predicates first, or build a [`ValueError`] themselves.

use std::collections::{BTreeMap, HashSet};
use std::ffi::c_void;
use std::fmt;

use mlua::Value as LuaValue;
use thiserror::Error;

use crate::coerce;
use crate::marshal::HostValue;

/// Reports a type mismatch detected by a caller
///
/// `Value` itself never constructs this; host functions do when they want
/// to reject an argument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected}, found \"{found}\"")]
pub struct ValueError {
    /// What the caller wanted
    pub expected: String,
    /// Runtime type name of the value it got
    pub found: &'static str,
}

impl ValueError {
    pub fn new(expected: impl Into<String>, value: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: value.type_name(),
        }
    }
}

/// Kind discriminator of a [`Value`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Integer,
    Number,
    String,
    Table,
    Function,
    UserData,
    Thread,
    /// Light userdata and interpreter-internal kinds
    Other,
}

/// Handle to a single script datum
#[derive(Clone, Debug)]
pub struct Value {
    raw: LuaValue,
}

impl Value {
    /// The canonical nil
    pub const NIL: Value = Value { raw: LuaValue::Nil };

    pub fn nil() -> Self {
        Self::NIL
    }

    pub(crate) fn from_raw(raw: LuaValue) -> Self {
        Self { raw }
    }

    pub(crate) fn raw(&self) -> &LuaValue {
        &self.raw
    }

    pub(crate) fn into_raw(self) -> LuaValue {
        self.raw
    }

    pub fn kind(&self) -> ValueKind {
        match &self.raw {
            LuaValue::Nil => ValueKind::Nil,
            LuaValue::Boolean(_) => ValueKind::Boolean,
            LuaValue::Integer(_) => ValueKind::Integer,
            LuaValue::Number(_) => ValueKind::Number,
            LuaValue::String(_) => ValueKind::String,
            LuaValue::Table(_) => ValueKind::Table,
            LuaValue::Function(_) => ValueKind::Function,
            LuaValue::UserData(_) => ValueKind::UserData,
            LuaValue::Thread(_) => ValueKind::Thread,
            _ => ValueKind::Other,
        }
    }

    /// Lua type name (`"nil"`, `"number"`, `"table"`, ...)
    pub fn type_name(&self) -> &'static str {
        self.raw.type_name()
    }

    /// Whether both handles reference the same datum (raw equality)
    pub fn same(&self, other: &Value) -> bool {
        self.raw == other.raw
    }

    // ==================== 类型转换 ====================

    /// Coerce to a string
    ///
    /// Numbers are formatted as Lua would; non-string, non-number values
    /// yield an empty string.
    pub fn as_string(&self) -> String {
        match &self.raw {
            LuaValue::String(s) => s.to_string_lossy().to_string(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => coerce::number_to_string(*n),
            _ => String::new(),
        }
    }

    /// Coerce to a float
    ///
    /// Numeric strings are converted; anything else not numeric is `0.0`.
    pub fn as_float(&self) -> f64 {
        match &self.raw {
            LuaValue::Integer(i) => *i as f64,
            LuaValue::Number(n) => *n,
            LuaValue::String(s) => coerce::str_to_number(&s.to_string_lossy()).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Alias for [`as_float`](Self::as_float) (Lua calls them "numbers")
    pub fn as_number(&self) -> f64 {
        self.as_float()
    }

    /// Coerce to an integer, truncating floats toward zero
    pub fn as_integer(&self) -> i64 {
        match &self.raw {
            LuaValue::Integer(i) => *i,
            LuaValue::Number(n) => coerce::float_to_integer(*n),
            LuaValue::String(s) => {
                let s = s.to_string_lossy();
                coerce::str_to_integer(&s)
                    .or_else(|| coerce::str_to_number(&s).map(coerce::float_to_integer))
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Lua truthiness: only `nil` and `false` are false
    pub fn as_bool(&self) -> bool {
        !self.is_false()
    }

    /// Convert to a host-side value
    ///
    /// Tables whose keys are exactly `1..=n` become lists, other tables
    /// become maps keyed by the string coercion of each key. Functions,
    /// userdata and repeated table references are kept as
    /// [`HostValue::Script`].
    pub fn to_host(&self) -> HostValue {
        let mut seen = HashSet::new();
        self.to_host_inner(&mut seen)
    }

    fn to_host_inner(&self, seen: &mut HashSet<*const c_void>) -> HostValue {
        match &self.raw {
            LuaValue::Nil => HostValue::Nil,
            LuaValue::Boolean(b) => HostValue::Bool(*b),
            LuaValue::Integer(i) => HostValue::Int(*i),
            LuaValue::Number(n) => HostValue::Float(*n),
            LuaValue::String(s) => HostValue::Str(s.to_string_lossy().to_string()),
            LuaValue::Table(_) => {
                if !seen.insert(self.raw.to_pointer()) {
                    return HostValue::Script(self.clone());
                }
                let len = self.table_len().max(0);
                let mut entries = Vec::new();
                self.table_for_each(|k, v| entries.push((k, v)));

                let is_sequence = entries.len() as i64 == len
                    && entries
                        .iter()
                        .all(|(k, _)| matches!(k.raw, LuaValue::Integer(i) if i >= 1 && i <= len));
                let host = if is_sequence {
                    entries.sort_by_key(|(k, _)| k.as_integer());
                    HostValue::List(entries.iter().map(|(_, v)| v.to_host_inner(seen)).collect())
                } else {
                    let map: BTreeMap<String, HostValue> = entries
                        .iter()
                        .map(|(k, v)| (k.as_string(), v.to_host_inner(seen)))
                        .collect();
                    HostValue::Map(map)
                };
                seen.remove(&self.raw.to_pointer());
                host
            }
            _ => HostValue::Script(self.clone()),
        }
    }

    // ==================== 类型判断 ====================

    pub fn is_nil(&self) -> bool {
        matches!(self.raw, LuaValue::Nil)
    }

    /// Whether Lua would consider this value false
    pub fn is_false(&self) -> bool {
        matches!(self.raw, LuaValue::Nil | LuaValue::Boolean(false))
    }

    pub fn is_true(&self) -> bool {
        !self.is_false()
    }

    /// Integers and floats both count as numbers
    pub fn is_number(&self) -> bool {
        matches!(self.raw, LuaValue::Integer(_) | LuaValue::Number(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.raw, LuaValue::Boolean(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.raw, LuaValue::Function(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.raw, LuaValue::String(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self.raw, LuaValue::Table(_))
    }

    pub fn is_userdata(&self) -> bool {
        matches!(self.raw, LuaValue::UserData(_))
    }

    // ==================== 表操作 ====================
    //
    // All of these use raw access and are no-ops (or return a sentinel)
    // when the receiver is not a table. Interpreter failures are swallowed.

    fn as_table(&self) -> Option<&mlua::Table> {
        match &self.raw {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Append at `#t + 1`
    pub fn table_append(&self, value: &Value) {
        if let Some(t) = self.as_table() {
            let _ = t.raw_set(t.raw_len() + 1, value.raw.clone());
        }
    }

    /// Insert at `pos`, shifting later elements up
    ///
    /// Positions outside `1..=#t + 1` are plain raw sets: nothing shifts and
    /// the value is stored under `pos`.
    pub fn table_insert(&self, pos: i64, value: &Value) {
        if let Some(t) = self.as_table() {
            let len = t.raw_len() as i64;
            if (1..=len + 1).contains(&pos) {
                let _ = t.raw_insert(pos, value.raw.clone());
            } else {
                let _ = t.raw_set(pos, value.raw.clone());
            }
        }
    }

    /// Remove and return the element at `pos`, shifting later elements down
    ///
    /// `pos` beyond `#t` removes nothing and returns nil; `pos <= 0` removes
    /// the last element of the sequence.
    pub fn table_remove(&self, pos: i64) -> Value {
        let Some(t) = self.as_table() else {
            return Value::NIL;
        };
        let len = t.raw_len() as i64;
        if len == 0 || pos > len {
            return Value::NIL;
        }

        let pos = if pos <= 0 { len } else { pos };
        let removed = t.raw_get::<LuaValue>(pos).unwrap_or(LuaValue::Nil);
        match t.raw_remove(pos) {
            Ok(()) => Value::from_raw(removed),
            Err(_) => Value::NIL,
        }
    }

    /// Border length, or `-1` for non-tables
    pub fn table_len(&self) -> i64 {
        match self.as_table() {
            Some(t) => t.raw_len() as i64,
            None => -1,
        }
    }

    /// Largest positive integer key, `0` when there is none
    pub fn table_max_n(&self) -> i64 {
        let mut max = 0;
        self.table_for_each(|k, _| {
            if let LuaValue::Integer(i) = k.raw {
                max = max.max(i);
            }
        });
        max
    }

    /// Stateless cursor over the table
    ///
    /// A nil `key` starts the traversal. Returns the entry following `key`
    /// in `pairs` order, or `(nil, nil)` once exhausted (also for unknown
    /// keys and non-tables).
    pub fn table_next(&self, key: &Value) -> (Value, Value) {
        let Some(t) = self.as_table() else {
            return (Value::NIL, Value::NIL);
        };

        let mut found = key.is_nil();
        for pair in t.clone().pairs::<LuaValue, LuaValue>() {
            let Ok((k, v)) = pair else { break };
            if found {
                return (Value::from_raw(k), Value::from_raw(v));
            }
            if k == key.raw {
                found = true;
            }
        }
        (Value::NIL, Value::NIL)
    }

    /// Visit every entry once, in interpreter traversal order
    pub fn table_for_each<F>(&self, mut cb: F)
    where
        F: FnMut(Value, Value),
    {
        if let Some(t) = self.as_table() {
            for pair in t.clone().pairs::<LuaValue, LuaValue>() {
                match pair {
                    Ok((k, v)) => cb(Value::from_raw(k), Value::from_raw(v)),
                    Err(_) => break,
                }
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{b}"),
            LuaValue::Integer(_) | LuaValue::Number(_) | LuaValue::String(_) => {
                write!(f, "{}", self.as_string())
            }
            other => write!(f, "{}: {:p}", other.type_name(), other.to_pointer()),
        }
    }
}
