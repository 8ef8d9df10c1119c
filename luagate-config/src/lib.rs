//! Luagate Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Luagate crates
//! and is what the CLI deserializes from its `--config` JSON file.

use serde::{Deserialize, Serialize};

/// Top-level configuration for one `Engine`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How script source is loaded
    pub loader: LoaderConfig,
    /// Runtime limits
    pub limits: LimitConfig,
    /// Logging levels per phase
    pub log: LogConfig,
}

/// Configuration for interpreter setup and chunk loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Which standard libraries are opened in a new interpreter
    pub stdlib: StdLibSet,
    /// Chunk name used for `load_string` (shows up in script diagnostics)
    pub string_chunk_name: String,
}

/// Standard library selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdLibSet {
    /// Every library that is memory-safe to expose (no `debug`, no C modules)
    #[default]
    Safe,
    /// `package`, `table`, `string` and `math` only
    Minimal,
    /// Base library only; `require` is unavailable
    Bare,
}

/// Configuration for runtime limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum interpreter heap in bytes (`None` means unlimited)
    pub memory_limit: Option<usize>,
}

/// Log verbosity, independent of any logging backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Global default level
    pub global: LogLevel,
    /// Script loading level (None falls back to global)
    pub load: Option<LogLevel>,
    /// Host -> script call level
    pub call: Option<LogLevel>,
    /// Value marshalling level
    pub marshal: Option<LogLevel>,
    /// Module registration and require level
    pub module: Option<LogLevel>,
}

/// Bridge phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Load,
    Call,
    Marshal,
    Module,
}

impl Phase {
    /// All phases, in declaration order
    pub const ALL: [Phase; 4] = [Phase::Load, Phase::Call, Phase::Marshal, Phase::Module];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Call => "call",
            Phase::Marshal => "marshal",
            Phase::Module => "module",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("luagate::{}", self.as_str())
    }
}

impl LogConfig {
    /// Effective level for a phase
    ///
    /// Returns the phase-specific level if set, otherwise the global one.
    pub fn level_for(&self, phase: Phase) -> LogLevel {
        let specific = match phase {
            Phase::Load => self.load,
            Phase::Call => self.call,
            Phase::Marshal => self.marshal,
            Phase::Module => self.module,
        };
        specific.unwrap_or(self.global)
    }
}

impl LogLevel {
    /// Parse a level name, case-insensitive. `"silent"` maps to `Error`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// One step more verbose, saturating at `Trace`
    pub fn raised(self) -> Self {
        match self {
            LogLevel::Error => LogLevel::Warn,
            LogLevel::Warn => LogLevel::Info,
            LogLevel::Info => LogLevel::Debug,
            LogLevel::Debug | LogLevel::Trace => LogLevel::Trace,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            stdlib: StdLibSet::Safe,
            string_chunk_name: "=string".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: LogLevel::Warn,
            load: None,
            call: None,
            marshal: None,
            module: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.loader.stdlib, StdLibSet::Safe);
        assert_eq!(cfg.loader.string_chunk_name, "=string");
        assert_eq!(cfg.limits.memory_limit, None);
        assert_eq!(cfg.log.global, LogLevel::Warn);
    }

    #[test]
    fn test_log_level_for() {
        let cfg = LogConfig {
            global: LogLevel::Warn,
            call: Some(LogLevel::Debug),
            ..Default::default()
        };

        assert_eq!(cfg.level_for(Phase::Call), LogLevel::Debug);
        assert_eq!(cfg.level_for(Phase::Load), LogLevel::Warn);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Load.as_str(), "load");
        assert_eq!(Phase::Module.target(), "luagate::module");
        assert_eq!(Phase::ALL.len(), 4);
    }

    #[test]
    fn test_log_level_parse_and_raise() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("silent"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::Warn.raised(), LogLevel::Info);
        assert_eq!(LogLevel::Trace.raised(), LogLevel::Trace);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "loader": { "stdlib": "minimal" }, "limits": { "memory_limit": 1048576 } }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.loader.stdlib, StdLibSet::Minimal);
        assert_eq!(cfg.loader.string_chunk_name, "=string");
        assert_eq!(cfg.limits.memory_limit, Some(1_048_576));
        assert_eq!(cfg.log, LogConfig::default());
    }
}
