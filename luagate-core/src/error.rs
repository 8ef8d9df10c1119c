//! Engine error types
//!
//! Provides the unified error type and a structured error report.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::value::ValueError;

/// Luagate error type
///
/// Diagnostics coming from the interpreter are carried verbatim.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed script source
    #[error("syntax error in {chunk}: {message}")]
    Syntax { chunk: String, message: String },

    /// Uncaught script error while loading or calling
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Script file could not be read
    #[error("cannot read script '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `call` on a global that does not exist
    #[error("attempt to call undefined global '{0}'")]
    UndefinedFunction(String),

    /// `call` on a global that is not a function
    #[error("attempt to call global '{name}' (a {found} value)")]
    NotCallable { name: String, found: &'static str },

    /// Result count beyond what the interpreter stack can hold
    #[error("requested {requested} results, at most {max} are supported")]
    TooManyResults { requested: usize, max: usize },

    /// Module registry unavailable
    #[error("module error: {0}")]
    Module(String),

    /// Type mismatch reported by a host function
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Any other interpreter failure (allocation, conversion, ...)
    #[error("interpreter error: {0}")]
    Lua(#[from] mlua::Error),
}

impl EngineError {
    /// Classify an error raised while executing `chunk`
    pub(crate) fn from_script(err: mlua::Error, chunk: &str) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => EngineError::Syntax {
                chunk: chunk.to_string(),
                message,
            },
            mlua::Error::RuntimeError(message) => EngineError::Runtime(message),
            other => EngineError::Runtime(other.to_string()),
        }
    }

    /// Turn a host-side failure into an error raised inside the script
    pub(crate) fn into_lua(self) -> mlua::Error {
        match self {
            EngineError::Lua(e) => e,
            other => mlua::Error::external(other),
        }
    }

    /// Error phase name
    pub fn phase(&self) -> &'static str {
        match self {
            EngineError::Syntax { .. } => "syntax",
            EngineError::Runtime(_) => "runtime",
            EngineError::Io { .. } => "io",
            EngineError::UndefinedFunction(_)
            | EngineError::NotCallable { .. }
            | EngineError::TooManyResults { .. } => "call",
            EngineError::Module(_) => "module",
            EngineError::Value(_) => "value",
            EngineError::Lua(_) => "interpreter",
        }
    }

    /// Variant name, for programmatic handling
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Syntax { .. } => "SyntaxError",
            EngineError::Runtime(_) => "RuntimeError",
            EngineError::Io { .. } => "IoError",
            EngineError::UndefinedFunction(_) => "UndefinedFunction",
            EngineError::NotCallable { .. } => "NotCallable",
            EngineError::TooManyResults { .. } => "TooManyResults",
            EngineError::Module(_) => "ModuleError",
            EngineError::Value(_) => "ValueError",
            EngineError::Lua(_) => "InterpreterError",
        }
    }

    /// Script line the diagnostic points at, if any
    ///
    /// Lua prefixes locations as `chunk:line:`; the first such location in
    /// the message is used.
    pub fn line(&self) -> Option<usize> {
        match self {
            EngineError::Syntax { message, .. } | EngineError::Runtime(message) => {
                first_line_ref(message)
            }
            _ => None,
        }
    }

    /// Convert to a structured error report
    ///
    /// Suitable for tools that want structured data; the CLI prints it
    /// directly or as JSON.
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            phase: self.phase(),
            line: self.line(),
            error_kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Find the first `:<digits>:` in a diagnostic
fn first_line_ref(message: &str) -> Option<usize> {
    let bytes = message.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let digits_end = bytes[i + 1..]
                .iter()
                .position(|b| !b.is_ascii_digit())
                .map(|p| i + 1 + p);
            if let Some(end) = digits_end {
                if end > i + 1 && bytes[end] == b':' {
                    return message[i + 1..end].parse().ok();
                }
            }
        }
        i += 1;
    }
    None
}

/// Structured error report
///
/// Upper layers (CLI, services) format it as they need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Error phase: syntax, runtime, io, call, module, value, interpreter
    pub phase: &'static str,
    /// Script line (1-based, if known)
    pub line: Option<usize>,
    /// Error kind
    pub error_kind: String,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] {} error: {}", line, self.phase, self.message),
            None => write!(f, "[{}] error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// JSON form
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::new())
    }

    /// Short form (terminal friendly)
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
