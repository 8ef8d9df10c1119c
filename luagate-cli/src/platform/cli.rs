//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use std::path::Path;

use luagate_core::EngineError;

/// 错误行前后显示的上下文行数
const CONTEXT_LINES: usize = 5;

/// 打印错误并显示源代码上下文
///
/// Context is shown only when the diagnostic points into `script` itself.
pub fn print_error_with_source(e: &EngineError, script: &Path) {
    eprintln!("❌ {}", e);

    let Some(line) = e.line() else { return };
    let mentions_script = script
        .file_name()
        .map(|name| e.to_string().contains(&*name.to_string_lossy()))
        .unwrap_or(false);
    if !mentions_script {
        return;
    }

    if let Ok(source) = std::fs::read_to_string(script) {
        if let Some(context) = source_context(&source, line) {
            eprint!("{}", context);
        }
    }
}

/// 以 JSON 形式打印错误报告
pub fn print_error_json(e: &EngineError) {
    eprintln!("{}", e.to_report().to_json());
}

/// Render the lines around `error_line`, marking the failing one
///
/// Returns `None` when the line is outside the source.
pub fn source_context(source: &str, error_line: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return None;
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);
    let width = end_line.to_string().len();
    let separator = format!("{}|--\n", "-".repeat(width + 2));

    let mut out = separator.clone();
    for line_idx in start_line..=end_line {
        let marker = if line_idx == error_line { '>' } else { ' ' };
        out.push_str(&format!(
            "{} {:>width$} | {}\n",
            marker,
            line_idx,
            lines[line_idx - 1],
            width = width
        ));
    }
    out.push_str(&separator);
    Some(out)
}
