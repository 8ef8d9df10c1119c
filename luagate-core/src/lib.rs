//! Luagate Core - host/Lua bridging layer
//!
//! Embeds a Lua 5.4 interpreter behind a small facade:
//! - `Engine`: load scripts, read/write globals, call script functions
//! - `Value`: total, never-failing coercions and table helpers
//! - Stack protocol: host functions pop arguments and push results
//! - Modules: host function tables, lazily loaded through `require`
//!
//! For CLI convenience, a process-wide default configuration can be
//! installed with [`config::try_init`]. For library use, prefer
//! `Engine::with_config`.

pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod module;
pub mod stack;
pub mod value;

pub use engine::Engine;
pub use error::{EngineError, ErrorReport};
pub use marshal::{HostObject, HostValue, IntoScript, IntoScriptArgs};
pub use module::{ScriptFnMap, ScriptFunction, ScriptType};
pub use stack::{CallStack, MAX_RESULTS};
pub use value::{Value, ValueError, ValueKind};

// Re-export config types from luagate_config
pub use luagate_config;
pub use luagate_config::{EngineConfig, LimitConfig, LoaderConfig, LogConfig, LogLevel, Phase, StdLibSet};

/// Re-exported for implementing [`ScriptType`] and [`HostObject`] payloads
pub use mlua;
