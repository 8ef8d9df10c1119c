//! The Engine facade
//!
//! `Engine` owns one Lua interpreter and is the single entry and exit point
//! for everything crossing the host/script boundary: loading source,
//! reading and writing globals, calling script functions and marshalling
//! values. Function and module registration live in [`crate::module`].
//!
//! # Thread Safety
//!
//! **`Engine` is NOT thread-safe** and is `!Send`. The stack protocol has no
//! meaning under concurrent access; create one Engine per thread instead.

use std::path::Path;
use std::rc::Rc;

use luagate_config::{EngineConfig, StdLibSet};
use mlua::{Function, Lua, LuaOptions, MultiValue, StdLib, Value as LuaValue};
use tracing::{debug, info, instrument, warn};

use crate::error::EngineError;
use crate::marshal::{HostValue, IntoScript, IntoScriptArgs};
use crate::stack::{CallStack, MAX_RESULTS};
use crate::value::Value;

/// The Lua bridging engine
///
/// # Example
///
/// ```rust
/// use luagate_core::Engine;
///
/// let engine = Engine::new().unwrap();
/// engine.load_string("function double(x) return x * 2 end").unwrap();
/// let out = engine.call("double", 1, (21,)).unwrap();
/// assert_eq!(out[0].as_integer(), 42);
/// engine.close();
/// ```
pub struct Engine {
    pub(crate) lua: Lua,
    pub(crate) config: Rc<EngineConfig>,
    /// Arguments/results of the host-function invocation this facade is
    /// bound to; empty on the owning Engine
    pub(crate) stack: CallStack,
}

impl Engine {
    /// Create an Engine with the process-wide default configuration
    ///
    /// See [`crate::config::try_init`]; falls back to
    /// `EngineConfig::default()`.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(crate::config::current())
    }

    /// Create an Engine with explicit configuration
    #[instrument(target = "luagate::load", skip(config), fields(stdlib = ?config.loader.stdlib))]
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let libs = match config.loader.stdlib {
            StdLibSet::Safe => StdLib::ALL_SAFE,
            StdLibSet::Minimal => StdLib::PACKAGE | StdLib::TABLE | StdLib::STRING | StdLib::MATH,
            StdLibSet::Bare => StdLib::NONE,
        };
        let lua = Lua::new_with(libs, LuaOptions::default())?;

        if let Some(limit) = config.limits.memory_limit {
            lua.set_memory_limit(limit)?;
            debug!(target: "luagate::load", limit, "memory limit set");
        }

        info!(target: "luagate::load", "engine created");
        Ok(Self {
            lua,
            config: Rc::new(config),
            stack: CallStack::default(),
        })
    }

    /// Facade bound to one host-function invocation
    pub(crate) fn bound(lua: &Lua, config: Rc<EngineConfig>, stack: CallStack) -> Self {
        Self {
            lua: lua.clone(),
            config,
            stack,
        }
    }

    /// Release the interpreter
    ///
    /// Consumes the Engine, so nothing can be called on it afterwards.
    /// Dropping the Engine has the same effect.
    pub fn close(self) {
        info!(target: "luagate::load", "engine closed");
    }

    /// Configuration this Engine was created with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Direct access to the interpreter, for what the facade does not cover
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    // ==================== 加载 ====================

    /// Execute a script file
    ///
    /// # Errors
    /// - `EngineError::Io` if the file cannot be read
    /// - `EngineError::Syntax` if it does not parse
    /// - `EngineError::Runtime` if it raises an uncaught error
    #[instrument(target = "luagate::load", skip_all)]
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        debug!(target: "luagate::load", path = %path.display(), "reading script");

        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.exec_chunk(&source, &format!("@{}", path.display()))
    }

    /// Execute script source
    ///
    /// # Errors
    /// `EngineError::Syntax` or `EngineError::Runtime`
    #[instrument(target = "luagate::load", skip(self, source), fields(len = source.len()))]
    pub fn load_string(&self, source: &str) -> Result<(), EngineError> {
        self.exec_chunk(source, &self.config.loader.string_chunk_name)
    }

    /// Execute script source and return every value the chunk returns
    #[instrument(target = "luagate::load", skip(self, source), fields(len = source.len()))]
    pub fn eval(&self, source: &str) -> Result<Vec<Value>, EngineError> {
        let chunk = self.config.loader.string_chunk_name.as_str();
        let returned: MultiValue = self
            .lua
            .load(source)
            .set_name(chunk)
            .eval()
            .map_err(|e| self.script_failure(e, chunk))?;
        Ok(returned.into_iter().map(Value::from_raw).collect())
    }

    fn exec_chunk(&self, source: &str, chunk: &str) -> Result<(), EngineError> {
        self.lua
            .load(source)
            .set_name(chunk)
            .exec()
            .map_err(|e| self.script_failure(e, chunk))?;
        debug!(target: "luagate::load", chunk, "chunk executed");
        Ok(())
    }

    fn script_failure(&self, err: mlua::Error, chunk: &str) -> EngineError {
        let err = EngineError::from_script(err, chunk);
        warn!(target: "luagate::load", chunk, error = %err, "script failed");
        err
    }

    // ==================== 全局变量 ====================

    /// Install a global, marshalling `value` through [`value_for`](Self::value_for)
    pub fn set_global(&self, name: &str, value: impl IntoScript) -> Result<(), EngineError> {
        let value = self.value_for(value)?;
        self.lua.globals().set(name, value.into_raw())?;
        Ok(())
    }

    /// Read a global; absent names yield nil
    pub fn get_global(&self, name: &str) -> Value {
        match self.lua.globals().get::<LuaValue>(name) {
            Ok(v) => Value::from_raw(v),
            Err(err) => {
                debug!(target: "luagate::marshal", name, error = %err, "global lookup failed");
                Value::NIL
            }
        }
    }

    /// Set `table[key] = value`; no-op when `table` is not a table
    pub fn set_field(&self, table: &Value, key: &str, value: impl IntoScript) -> Result<(), EngineError> {
        let LuaValue::Table(t) = table.raw() else {
            debug!(target: "luagate::marshal", key, found = table.type_name(), "set_field on non-table ignored");
            return Ok(());
        };
        let value = self.value_for(value)?;
        t.set(key, value.into_raw())?;
        Ok(())
    }

    // ==================== 调用 ====================

    /// Call a global script function
    ///
    /// Returns exactly `result_count` values. When the function returns
    /// fewer, the rest are nil; extra results are dropped. Errors raised by
    /// the script are caught and returned.
    ///
    /// # Errors
    /// - `EngineError::UndefinedFunction` if `name` is not defined
    /// - `EngineError::NotCallable` if `name` is not a function
    /// - `EngineError::Runtime` if the script raises an error
    #[instrument(target = "luagate::call", skip(self, args))]
    pub fn call(
        &self,
        name: &str,
        result_count: usize,
        args: impl IntoScriptArgs,
    ) -> Result<Vec<Value>, EngineError> {
        let func = match self.lua.globals().get::<LuaValue>(name)? {
            LuaValue::Function(f) => f,
            LuaValue::Nil => return Err(EngineError::UndefinedFunction(name.to_string())),
            other => {
                return Err(EngineError::NotCallable {
                    name: name.to_string(),
                    found: other.type_name(),
                })
            }
        };
        self.invoke(&func, name, result_count, args)
    }

    /// Call a function value (e.g. a callback obtained with `pop_function`)
    ///
    /// Same result contract as [`call`](Self::call).
    pub fn call_value(
        &self,
        func: &Value,
        result_count: usize,
        args: impl IntoScriptArgs,
    ) -> Result<Vec<Value>, EngineError> {
        match func.raw() {
            LuaValue::Function(f) => self.invoke(f, "<function>", result_count, args),
            other => Err(EngineError::NotCallable {
                name: "<value>".to_string(),
                found: other.type_name(),
            }),
        }
    }

    fn invoke(
        &self,
        func: &Function,
        name: &str,
        result_count: usize,
        args: impl IntoScriptArgs,
    ) -> Result<Vec<Value>, EngineError> {
        check_result_count(result_count)?;
        let args: MultiValue = args
            .into_script_args(self)?
            .into_iter()
            .map(Value::into_raw)
            .collect();

        let returned: MultiValue = func.call(args).map_err(|e| {
            let err = EngineError::from_script(e, name);
            warn!(target: "luagate::call", function = name, error = %err, "call failed");
            err
        })?;

        // 返回值不足时用 nil 补齐
        if returned.len() < result_count {
            debug!(
                target: "luagate::call",
                function = name,
                returned = returned.len(),
                requested = result_count,
                "padding missing results with nil"
            );
        }
        let mut results: Vec<Value> = returned
            .into_iter()
            .take(result_count)
            .map(Value::from_raw)
            .collect();
        results.resize(result_count, Value::NIL);
        Ok(results)
    }

    // ==================== 值转换 ====================

    /// Marshal a host value into a script value
    ///
    /// Existing `Value`s pass through unchanged, so wrapping twice is
    /// harmless.
    pub fn value_for(&self, value: impl IntoScript) -> Result<Value, EngineError> {
        value.into_script(self)
    }

    /// New empty table
    pub fn lua_table(&self) -> Result<Value, EngineError> {
        Ok(Value::from_raw(LuaValue::Table(self.lua.create_table()?)))
    }

    // ==================== 栈协议 ====================

    /// Number of slots left on the invocation stack
    pub fn arg_count(&self) -> usize {
        self.stack.len()
    }

    /// Pop the top argument
    pub fn pop_arg(&mut self) -> Value {
        self.stack.pop()
    }

    pub fn pop_bool(&mut self) -> bool {
        self.pop_arg().as_bool()
    }

    /// Pop as `i32`, truncating and saturating
    pub fn pop_int(&mut self) -> i32 {
        let i = self.pop_arg().as_integer();
        i.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn pop_int64(&mut self) -> i64 {
        self.pop_arg().as_integer()
    }

    pub fn pop_float(&mut self) -> f64 {
        self.pop_arg().as_float()
    }

    pub fn pop_string(&mut self) -> String {
        self.pop_arg().as_string()
    }

    /// Alias for [`pop_arg`](Self::pop_arg), for readability
    pub fn pop_function(&mut self) -> Value {
        self.pop_arg()
    }

    /// Alias for [`pop_arg`](Self::pop_arg), for readability
    pub fn pop_number(&mut self) -> Value {
        self.pop_arg()
    }

    /// Alias for [`pop_arg`](Self::pop_arg), for readability
    pub fn pop_table(&mut self) -> Value {
        self.pop_arg()
    }

    /// Pop and convert to a host value
    pub fn pop_interface(&mut self) -> HostValue {
        self.pop_arg().to_host()
    }

    /// Push a result; the first push is the first return value
    pub fn push_ret(&mut self, value: impl IntoScript) -> Result<(), EngineError> {
        let value = self.value_for(value)?;
        self.stack.push(value);
        Ok(())
    }
}

pub(crate) fn check_result_count(count: usize) -> Result<(), EngineError> {
    if count > MAX_RESULTS {
        return Err(EngineError::TooManyResults {
            requested: count,
            max: MAX_RESULTS,
        });
    }
    Ok(())
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("stack_len", &self.stack.len())
            .finish()
    }
}
