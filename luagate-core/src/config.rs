//! Process-wide default configuration
//!
//! `Engine::new()` picks up whatever was installed here, which is convenient
//! for CLIs and test harnesses. Library code should prefer
//! `Engine::with_config` and pass configuration explicitly.

use luagate_config::EngineConfig;
use once_cell::sync::OnceCell;

static GLOBAL_CONFIG: OnceCell<EngineConfig> = OnceCell::new();

/// Install the default configuration
///
/// Only the first call wins; returns `false` if a configuration was already
/// installed.
pub fn try_init(config: EngineConfig) -> bool {
    GLOBAL_CONFIG.set(config).is_ok()
}

/// The installed configuration, or `EngineConfig::default()`
pub fn current() -> EngineConfig {
    GLOBAL_CONFIG.get().cloned().unwrap_or_default()
}

/// Check if a default configuration was installed
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}
