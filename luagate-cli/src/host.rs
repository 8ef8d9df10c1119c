//! The `host` module exposed to scripts run from the CLI

use luagate_core::{Engine, EngineError, ScriptFnMap};
use tracing::info;

use crate::logging::SCRIPT_TARGET;

/// Make `require('host')` available
pub fn register(engine: &Engine) -> Result<(), EngineError> {
    engine.register_module("host", |e| e.generate_module(&host_fns()))
}

fn host_fns() -> ScriptFnMap {
    ScriptFnMap::new()
        .with("version", |e| {
            e.push_ret(env!("CARGO_PKG_VERSION"))?;
            Ok(1)
        })
        .with("getenv", |e| {
            let name = e.pop_string();
            e.push_ret(std::env::var(name).ok())?;
            Ok(1)
        })
        .with("log", |e| {
            let mut parts = Vec::with_capacity(e.arg_count());
            while e.arg_count() > 0 {
                parts.push(e.pop_arg().to_string());
            }
            parts.reverse();
            info!(target: SCRIPT_TARGET, "{}", parts.join("\t"));
            Ok(0)
        })
}
