//! Host functions, modules and script types
//!
//! Host functions follow the stack protocol: they receive a facade
//! [`Engine`] bound to the invocation, pop their arguments, push their
//! results and return how many results they pushed.
//!
//! Modules are registered lazily through `package.preload`, so their loader
//! runs on the first `require` only.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use mlua::{FromLuaMulti, Function, IntoLuaMulti, MultiValue, Table, UserData, Value as LuaValue};
use tracing::{debug, info, trace};

use crate::engine::{check_result_count, Engine};
use crate::error::EngineError;
use crate::marshal::HostObject;
use crate::stack::CallStack;
use crate::value::Value;

/// A host function callable from script
///
/// Returns the number of results it pushed with `push_ret`. An error is
/// raised inside the script at the call site.
pub type ScriptFunction = Rc<dyn Fn(&mut Engine) -> Result<usize, EngineError>>;

/// Named set of host functions, turned into a script table by
/// [`Engine::generate_module`]
#[derive(Clone, Default)]
pub struct ScriptFnMap {
    fns: HashMap<String, ScriptFunction>,
}

impl ScriptFnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, returning the one it replaced
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> Option<ScriptFunction>
    where
        F: Fn(&mut Engine) -> Result<usize, EngineError> + 'static,
    {
        self.fns.insert(name.into(), Rc::new(f))
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Engine) -> Result<usize, EngineError> + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    /// Function names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.keys().map(String::as_str)
    }
}

impl fmt::Debug for ScriptFnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ScriptFnMap").field("fns", &names).finish()
    }
}

/// A host type constructible from script
///
/// `define_type::<T>("Name")` installs a global constructor `Name(...)`;
/// `construct` pops the constructor arguments from the stack. Methods and
/// fields come from the `UserData` impl.
pub trait ScriptType: UserData + Sized + 'static {
    fn construct(engine: &mut Engine) -> Result<Self, EngineError>;
}

impl Engine {
    /// Install a host function as a global
    ///
    /// # Example
    ///
    /// ```rust
    /// use luagate_core::Engine;
    ///
    /// let engine = Engine::new().unwrap();
    /// engine
    ///     .register_func("add", |e| {
    ///         let b = e.pop_int64();
    ///         let a = e.pop_int64();
    ///         e.push_ret(a + b)?;
    ///         Ok(1)
    ///     })
    ///     .unwrap();
    /// let out = engine.eval("return add(2, 3)").unwrap();
    /// assert_eq!(out[0].as_integer(), 5);
    /// ```
    pub fn register_func<F>(&self, name: &str, f: F) -> Result<(), EngineError>
    where
        F: Fn(&mut Engine) -> Result<usize, EngineError> + 'static,
    {
        let func = self.wrap_script_function(name, Rc::new(f))?;
        self.lua.globals().set(name, func)?;
        debug!(target: "luagate::module", name, "registered function");
        Ok(())
    }

    /// Install a typed host function as a global
    ///
    /// Arguments and results are marshalled by the interpreter's own
    /// conversions instead of the stack protocol: a tuple of arguments that
    /// do not convert raises a script error before `f` runs.
    ///
    /// ```rust
    /// use luagate_core::Engine;
    ///
    /// let engine = Engine::new().unwrap();
    /// engine
    ///     .register_host_fn("greet", |name: String| Ok(format!("hello, {name}")))
    ///     .unwrap();
    /// let out = engine.eval("return greet('lua')").unwrap();
    /// assert_eq!(out[0].as_string(), "hello, lua");
    /// ```
    pub fn register_host_fn<A, R, F>(&self, name: &str, f: F) -> Result<(), EngineError>
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(A) -> Result<R, EngineError> + 'static,
    {
        let fn_name = name.to_string();
        let func = self.lua.create_function(move |_, args: A| {
            trace!(target: "luagate::call", function = %fn_name, "typed host function invoked");
            f(args).map_err(EngineError::into_lua)
        })?;
        self.lua.globals().set(name, func)?;
        debug!(target: "luagate::module", name, "registered typed function");
        Ok(())
    }

    /// Register a module that is built on its first `require`
    ///
    /// The loader returns the module value (usually a table from
    /// [`generate_module`](Self::generate_module)); `require` caches it, so
    /// the loader runs at most once per Engine.
    ///
    /// # Errors
    /// `EngineError::Module` when the `package` library is not loaded.
    pub fn register_module<F>(&self, name: &str, loader: F) -> Result<(), EngineError>
    where
        F: Fn(&mut Engine) -> Result<Value, EngineError> + 'static,
    {
        let preload = self.preload_table()?;
        let config = Rc::clone(&self.config);
        let module_name = name.to_string();

        let loader_fn = self.lua.create_function(move |lua, _args: MultiValue| {
            info!(target: "luagate::module", module = %module_name, "loading module");
            let mut engine = Engine::bound(lua, Rc::clone(&config), CallStack::default());
            let module = loader(&mut engine).map_err(EngineError::into_lua)?;
            engine.push_ret(module).map_err(EngineError::into_lua)?;
            Ok(engine.stack.into_multi(1))
        })?;
        preload.set(name, loader_fn)?;

        debug!(target: "luagate::module", name, "registered module");
        Ok(())
    }

    /// Build a table with one entry per host function
    pub fn generate_module(&self, fns: &ScriptFnMap) -> Result<Value, EngineError> {
        let table = self.lua.create_table_with_capacity(0, fns.len())?;
        for (name, f) in &fns.fns {
            table.raw_set(name.as_str(), self.wrap_script_function(name, Rc::clone(f))?)?;
        }
        Ok(Value::from_raw(LuaValue::Table(table)))
    }

    /// Generate a module and install it as a global right away
    pub fn install_module(&self, name: &str, fns: &ScriptFnMap) -> Result<(), EngineError> {
        let module = self.generate_module(fns)?;
        self.set_global(name, module)
    }

    /// Install a global constructor for a host type
    pub fn define_type<T: ScriptType>(&self, name: &str) -> Result<(), EngineError> {
        self.register_func(name, |engine: &mut Engine| {
            let object = T::construct(engine)?;
            engine.push_ret(HostObject(object))?;
            Ok(1)
        })
    }

    fn wrap_script_function(&self, name: &str, f: ScriptFunction) -> Result<Function, EngineError> {
        let config = Rc::clone(&self.config);
        let name = name.to_string();

        let func = self.lua.create_function(move |lua, args: MultiValue| {
            trace!(target: "luagate::call", function = %name, args = args.len(), "host function invoked");
            let mut engine = Engine::bound(lua, Rc::clone(&config), CallStack::from_multi(args));
            let count = f(&mut engine).map_err(EngineError::into_lua)?;
            check_result_count(count).map_err(EngineError::into_lua)?;
            Ok(engine.stack.into_multi(count))
        })?;
        Ok(func)
    }

    fn preload_table(&self) -> Result<Table, EngineError> {
        let LuaValue::Table(package) = self.lua.globals().get::<LuaValue>("package")? else {
            return Err(EngineError::Module("package library is not loaded".to_string()));
        };
        match package.get::<LuaValue>("preload")? {
            LuaValue::Table(preload) => Ok(preload),
            _ => Err(EngineError::Module("package.preload is not a table".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luagate_config::{EngineConfig, StdLibSet};

    #[test]
    fn test_fn_map_builder() {
        let fns = ScriptFnMap::new()
            .with("a", |_e: &mut Engine| Ok(0))
            .with("b", |_e: &mut Engine| Ok(0));
        assert_eq!(fns.len(), 2);
        assert!(fns.contains("a"));
        assert!(!fns.contains("c"));
        assert_eq!(format!("{:?}", fns), "ScriptFnMap { fns: [\"a\", \"b\"] }");
    }

    #[test]
    fn test_insert_replaces() {
        let mut fns = ScriptFnMap::new();
        assert!(fns.insert("f", |_e: &mut Engine| Ok(0)).is_none());
        assert!(fns.insert("f", |_e: &mut Engine| Ok(1)).is_some());
        assert_eq!(fns.len(), 1);
    }

    #[test]
    fn test_register_module_without_package_library() {
        let mut config = EngineConfig::default();
        config.loader.stdlib = StdLibSet::Bare;
        let engine = Engine::with_config(config).unwrap();

        let err = engine.register_module("m", |e| e.lua_table()).unwrap_err();
        assert!(matches!(err, EngineError::Module(_)));
    }

    #[test]
    fn test_generate_module_entries_are_functions() {
        let engine = Engine::new().unwrap();
        let fns = ScriptFnMap::new().with("noop", |_e: &mut Engine| Ok(0));
        let module = engine.generate_module(&fns).unwrap();

        let (k, v) = module.table_next(&Value::nil());
        assert_eq!(k.as_string(), "noop");
        assert!(v.is_function());
    }
}
