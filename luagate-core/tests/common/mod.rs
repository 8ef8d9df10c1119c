//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use luagate_core::{Engine, EngineConfig, EngineError, StdLibSet, Value};

/// 创建默认引擎并执行脚本
///
/// # Example
/// ```
/// let engine = engine_with("function f() return 1 end");
/// ```
pub fn engine_with(source: &str) -> Engine {
    let engine = Engine::new().expect("engine");
    engine.load_string(source).expect("script loads");
    engine
}

/// 使用指定标准库集合创建引擎
pub fn engine_with_stdlib(stdlib: StdLibSet) -> Engine {
    let mut config = EngineConfig::default();
    config.loader.stdlib = stdlib;
    Engine::with_config(config).expect("engine")
}

/// 执行表达式并返回第一个结果
pub fn eval_first(engine: &Engine, source: &str) -> Result<Value, EngineError> {
    Ok(engine.eval(source)?.into_iter().next().unwrap_or_default())
}

/// 获取整数结果列表
pub fn ints(values: &[Value]) -> Vec<i64> {
    values.iter().map(Value::as_integer).collect()
}

/// 获取字符串结果列表
pub fn strings(values: &[Value]) -> Vec<String> {
    values.iter().map(Value::as_string).collect()
}
