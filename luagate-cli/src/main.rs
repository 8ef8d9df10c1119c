//! Luagate CLI - Command line interface
//!
//! Loads a script, optionally calls one of its global functions and prints
//! the results, one per line.

use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::process;

mod host;
mod logging;
mod platform;

use crate::logging::LogFormat;
use crate::platform::{print_error_json, print_error_with_source};
use luagate_core::{Engine, EngineConfig, EngineError, HostValue};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "luagate", about = "Run Lua scripts through the luagate engine", version)]
struct Cli {
    /// Script to execute
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Global function to call once the script is loaded
    #[arg(long, value_name = "NAME")]
    call: Option<String>,

    /// Number of results to take from --call
    #[arg(long, value_name = "N", default_value_t = 1)]
    results: usize,

    /// Argument for --call (repeatable; bool, int and float are detected)
    #[arg(long = "arg", value_name = "VALUE")]
    args: Vec<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print errors as JSON reports
    #[arg(long)]
    json_errors: bool,
}

fn main() {
    let cli = Cli::parse();

    // Read engine configuration
    let mut config = match read_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    for _ in 0..cli.verbose {
        config.log.global = config.log.global.raised();
    }

    if let Err(e) = logging::init_with_file(&config.log, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: Cannot open log file: {}", e);
        process::exit(1);
    }

    // Global default, for anything creating engines with Engine::new()
    luagate_core::config::try_init(config.clone());

    match run(&cli, config) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(e) => {
            if cli.json_errors {
                print_error_json(&e);
            } else {
                print_error_with_source(&e, &cli.script);
            }
            process::exit(1);
        }
    }
}

/// Read and parse the configuration file
fn read_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Cannot parse '{}': {}", path.display(), e))
}

/// Load the script, call the requested function and render its results
fn run(cli: &Cli, config: EngineConfig) -> Result<Vec<String>, EngineError> {
    let engine = Engine::with_config(config)?;
    host::register(&engine)?;
    engine.load_file(&cli.script)?;

    let lines = match &cli.call {
        Some(name) => {
            let args: Vec<HostValue> = cli.args.iter().map(|a| parse_arg(a)).collect();
            debug!(target: "luagate::call", function = %name, args = args.len(), "calling from command line");
            engine
                .call(name, cli.results, args)?
                .iter()
                .map(ToString::to_string)
                .collect()
        }
        None => Vec::new(),
    };

    engine.close();
    Ok(lines)
}

/// Parse a command-line argument into the most specific host value
fn parse_arg(s: &str) -> HostValue {
    match s {
        "true" => return HostValue::Bool(true),
        "false" => return HostValue::Bool(false),
        "nil" => return HostValue::Nil,
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return HostValue::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return HostValue::Float(f);
        }
    }
    HostValue::Str(s.to_string())
}
