//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。

use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::ValueEnum;
use luagate_config::{LogConfig, LogLevel, Phase};
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Target used by `host.log` from scripts
pub const SCRIPT_TARGET: &str = "luagate::script";

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// Map a configured level onto `tracing`'s
pub fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// Build the per-phase filter
///
/// Script logs are kept at `info` or above so `host.log` is visible with
/// the default configuration.
pub fn build_targets(log_config: &LogConfig) -> Targets {
    let targets = Phase::ALL.iter().fold(
        Targets::new().with_default(to_level(log_config.global)),
        |targets, phase| targets.with_target(phase.target(), to_level(log_config.level_for(*phase))),
    );
    targets.with_target(SCRIPT_TARGET, to_level(log_config.global.max(LogLevel::Info)))
}

/// 使用指定格式和日志配置初始化日志系统
///
/// Logs go to stderr so that script results on stdout stay clean. With a
/// log file, events are written to both.
pub fn init_with_file(log_config: &LogConfig, format: LogFormat, file: Option<&Path>) -> io::Result<()> {
    let targets = build_targets(log_config);
    let console_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());

    match file {
        Some(path) => {
            let file_handle = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file_handle))
                .with_filter(targets);

            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(console_layer).init();
        }
    }
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
