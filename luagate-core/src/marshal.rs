//! Host -> script marshalling
//!
//! Every value crossing into the interpreter goes through [`IntoScript`].
//! The supported host kinds are closed over by [`HostValue`]; anything else
//! is wrapped in a [`HostObject`] and handed to mlua's own conversion
//! (`IntoLua`, which covers every `UserData` type).
//!
//! | Rust type | Script type |
//! |-----------|-------------|
//! | `()` | `nil` |
//! | `bool` | `boolean` |
//! | `i8`..`i64`, `u8`..`u32`, `usize` | integer |
//! | `f32`, `f64` | float |
//! | `&str`, `String` | string |
//! | `Option<T>` | `T` or `nil` |
//! | `Vec<T>` | sequence table |
//! | `BTreeMap<String, T>`, `HashMap<String, T>` | table |
//! | `Value` | passed through unchanged |

use std::collections::{BTreeMap, HashMap};

use mlua::{IntoLua, Value as LuaValue};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::value::Value;

/// Supported host-side kinds
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<HostValue>),
    Map(BTreeMap<String, HostValue>),
    /// A datum with no host counterpart (function, userdata, cyclic table)
    Script(Value),
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Nil, HostValue::Nil) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::List(a), HostValue::List(b)) => a == b,
            (HostValue::Map(a), HostValue::Map(b)) => a == b,
            (HostValue::Script(a), HostValue::Script(b)) => a.same(b),
            _ => false,
        }
    }
}

impl HostValue {
    /// Kind name, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "string",
            HostValue::List(_) => "list",
            HostValue::Map(_) => "map",
            HostValue::Script(_) => "script",
        }
    }

    fn into_lua_value(self, engine: &Engine) -> Result<LuaValue, EngineError> {
        let lua = engine.lua();
        let raw = match self {
            HostValue::Nil => LuaValue::Nil,
            HostValue::Bool(b) => LuaValue::Boolean(b),
            HostValue::Int(i) => LuaValue::Integer(i),
            HostValue::Float(f) => LuaValue::Number(f),
            HostValue::Str(s) => LuaValue::String(lua.create_string(&s)?),
            HostValue::List(items) => {
                let table = lua.create_table_with_capacity(items.len(), 0)?;
                for (i, item) in items.into_iter().enumerate() {
                    table.raw_set(i + 1, item.into_lua_value(engine)?)?;
                }
                LuaValue::Table(table)
            }
            HostValue::Map(entries) => {
                let table = lua.create_table_with_capacity(0, entries.len())?;
                for (k, v) in entries {
                    table.raw_set(k, v.into_lua_value(engine)?)?;
                }
                LuaValue::Table(table)
            }
            HostValue::Script(v) => v.into_raw(),
        };
        Ok(raw)
    }
}

/// Marks a host value whose conversion is delegated to mlua
///
/// Use it for `UserData` types and anything else implementing `IntoLua`:
///
/// ```ignore
/// engine.set_global("origin", HostObject(Point { x: 0, y: 0 }))?;
/// ```
#[derive(Debug, Clone)]
pub struct HostObject<T>(pub T);

/// Conversion of a host value into a script [`Value`]
pub trait IntoScript {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError>;
}

impl IntoScript for Value {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(self)
    }
}

impl IntoScript for &Value {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(self.clone())
    }
}

impl IntoScript for HostValue {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        self.into_lua_value(engine).map(Value::from_raw)
    }
}

impl<T: IntoLua> IntoScript for HostObject<T> {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::from_raw(self.0.into_lua(engine.lua())?))
    }
}

impl IntoScript for () {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::NIL)
    }
}

impl IntoScript for bool {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::from_raw(LuaValue::Boolean(self)))
    }
}

macro_rules! impl_into_script_int {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
                    Ok(Value::from_raw(LuaValue::Integer(self as i64)))
                }
            }
        )*
    };
}

impl_into_script_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl IntoScript for f64 {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::from_raw(LuaValue::Number(self)))
    }
}

impl IntoScript for f32 {
    fn into_script(self, _engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::from_raw(LuaValue::Number(self as f64)))
    }
}

impl IntoScript for &str {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        Ok(Value::from_raw(LuaValue::String(engine.lua().create_string(self)?)))
    }
}

impl IntoScript for String {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        self.as_str().into_script(engine)
    }
}

impl IntoScript for &String {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        self.as_str().into_script(engine)
    }
}

impl<T: IntoScript> IntoScript for Option<T> {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        match self {
            Some(v) => v.into_script(engine),
            None => Ok(Value::NIL),
        }
    }
}

impl<T: IntoScript> IntoScript for Vec<T> {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        let table = engine.lua().create_table_with_capacity(self.len(), 0)?;
        for (i, item) in self.into_iter().enumerate() {
            table.raw_set(i + 1, item.into_script(engine)?.into_raw())?;
        }
        Ok(Value::from_raw(LuaValue::Table(table)))
    }
}

impl<T: IntoScript> IntoScript for BTreeMap<String, T> {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        map_into_script(self, engine)
    }
}

impl<T: IntoScript> IntoScript for HashMap<String, T> {
    fn into_script(self, engine: &Engine) -> Result<Value, EngineError> {
        map_into_script(self, engine)
    }
}

fn map_into_script<I, T>(entries: I, engine: &Engine) -> Result<Value, EngineError>
where
    I: IntoIterator<Item = (String, T)>,
    T: IntoScript,
{
    let table = engine.lua().create_table()?;
    for (k, v) in entries {
        table.raw_set(k, v.into_script(engine)?.into_raw())?;
    }
    Ok(Value::from_raw(LuaValue::Table(table)))
}

/// Conversion of a host argument list for [`Engine::call`]
pub trait IntoScriptArgs {
    fn into_script_args(self, engine: &Engine) -> Result<Vec<Value>, EngineError>;
}

impl IntoScriptArgs for () {
    fn into_script_args(self, _engine: &Engine) -> Result<Vec<Value>, EngineError> {
        Ok(Vec::new())
    }
}

impl<T: IntoScript> IntoScriptArgs for Vec<T> {
    fn into_script_args(self, engine: &Engine) -> Result<Vec<Value>, EngineError> {
        self.into_iter().map(|v| v.into_script(engine)).collect()
    }
}

impl IntoScriptArgs for &[Value] {
    fn into_script_args(self, _engine: &Engine) -> Result<Vec<Value>, EngineError> {
        Ok(self.to_vec())
    }
}

macro_rules! impl_into_script_args_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoScript),+> IntoScriptArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_script_args(self, engine: &Engine) -> Result<Vec<Value>, EngineError> {
                let ($($name,)+) = self;
                Ok(vec![$($name.into_script(engine)?),+])
            }
        }
    };
}

impl_into_script_args_tuple!(A);
impl_into_script_args_tuple!(A, B);
impl_into_script_args_tuple!(A, B, C);
impl_into_script_args_tuple!(A, B, C, D);
impl_into_script_args_tuple!(A, B, C, D, E);
impl_into_script_args_tuple!(A, B, C, D, E, F);
impl_into_script_args_tuple!(A, B, C, D, E, F, G);
impl_into_script_args_tuple!(A, B, C, D, E, F, G, H);
