//! Value 测试
//!
//! 强制转换、表操作与宿主值转换

mod common;
use common::{engine_with, eval_first, ints};

use std::collections::BTreeMap;

use luagate_core::{Engine, HostValue, Value, ValueKind};

// ===== 类型转换 =====

#[test]
fn test_number_formatting_matches_tostring() {
    let engine = Engine::new().unwrap();
    for src in ["3.0", "0.1", "1e15", "-2.5", "1/3", "2^63", "7"] {
        let expected = eval_first(&engine, &format!("return tostring({src})")).unwrap();
        let value = eval_first(&engine, &format!("return {src}")).unwrap();
        assert_eq!(value.as_string(), expected.as_string(), "formatting {src}");
    }
}

#[test]
fn test_string_to_number_matches_tonumber() {
    let engine = Engine::new().unwrap();
    for src in ["'42'", "' 3.5 '", "'0x1F'", "'1e2'", "'abc'", "''", "'0x1p4'", "'0xA.8'", "'-0x.8p1'"] {
        let expected = eval_first(&engine, &format!("return tonumber({src}) or 0")).unwrap();
        let value = eval_first(&engine, &format!("return {src}")).unwrap();
        assert_eq!(value.as_number(), expected.as_number(), "coercing {src}");
    }
}

#[test]
fn test_integer_coercion_truncates() {
    let engine = Engine::new().unwrap();
    assert_eq!(eval_first(&engine, "return 3.9").unwrap().as_integer(), 3);
    assert_eq!(eval_first(&engine, "return -3.9").unwrap().as_integer(), -3);
    assert_eq!(eval_first(&engine, "return ' 7.2 '").unwrap().as_integer(), 7);
    assert_eq!(eval_first(&engine, "return {}").unwrap().as_integer(), 0);
}

#[test]
fn test_truthiness() {
    let engine = Engine::new().unwrap();
    let out = engine.eval("return nil, false, 0, '', {}").unwrap();
    let truth: Vec<bool> = out.iter().map(Value::as_bool).collect();
    assert_eq!(truth, vec![false, false, true, true, true]);
}

#[test]
fn test_kinds() {
    let engine = Engine::new().unwrap();
    let out = engine.eval("return 1, 1.5, 's', {}, print, true").unwrap();
    let kinds: Vec<ValueKind> = out.iter().map(Value::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ValueKind::Integer,
            ValueKind::Number,
            ValueKind::String,
            ValueKind::Table,
            ValueKind::Function,
            ValueKind::Boolean,
        ]
    );
}

// ===== value_for =====

#[test]
fn test_value_for_is_idempotent() {
    let engine = Engine::new().unwrap();
    let table = engine.lua_table().unwrap();

    let once = engine.value_for(&table).unwrap();
    let twice = engine.value_for(once.clone()).unwrap();
    assert!(once.same(&table));
    assert!(twice.same(&table));

    let n = engine.value_for(5).unwrap();
    assert!(engine.value_for(n.clone()).unwrap().same(&n));
}

#[test]
fn test_value_for_host_values() {
    let engine = Engine::new().unwrap();
    assert!(engine.value_for(()).unwrap().is_nil());
    assert!(engine.value_for(None::<i32>).unwrap().is_nil());
    assert_eq!(engine.value_for(Some("x")).unwrap().as_string(), "x");
    assert_eq!(engine.value_for(2.0f32).unwrap().as_float(), 2.0);

    let mut map = BTreeMap::new();
    map.insert("a".to_string(), 1);
    map.insert("b".to_string(), 2);
    let table = engine.value_for(map).unwrap();
    engine.set_global("t", table).unwrap();
    assert_eq!(eval_first(&engine, "return t.a + t.b").unwrap().as_integer(), 3);
}

#[test]
fn test_host_round_trip() {
    let engine = Engine::new().unwrap();
    let mut map = BTreeMap::new();
    map.insert("flag".to_string(), HostValue::Bool(true));
    map.insert("pi".to_string(), HostValue::Float(3.25));
    map.insert(
        "list".to_string(),
        HostValue::List(vec![HostValue::Int(1), HostValue::Str("two".into())]),
    );
    let host = HostValue::Map(map);

    let value = engine.value_for(host.clone()).unwrap();
    assert_eq!(value.to_host(), host);
}

#[test]
fn test_to_host_handles_cycles() {
    let engine = Engine::new().unwrap();
    let value = eval_first(&engine, "local t = {name = 'loop'} t.self = t return t").unwrap();

    let HostValue::Map(map) = value.to_host() else {
        panic!("expected a map");
    };
    assert_eq!(map["name"], HostValue::Str("loop".into()));
    assert!(matches!(map["self"], HostValue::Script(ref v) if v.same(&value)));
}

#[test]
fn test_sparse_table_is_a_map() {
    let engine = Engine::new().unwrap();
    let value = eval_first(&engine, "return {[1] = 'a', [3] = 'c'}").unwrap();
    let HostValue::Map(map) = value.to_host() else {
        panic!("expected a map");
    };
    assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["1", "3"]);
}

// ===== 表操作 =====

#[test]
fn test_table_len_and_remove() {
    let engine = engine_with("t = {10, 20, 30}");
    let t = engine.get_global("t");
    assert_eq!(t.table_len(), 3);

    let removed = t.table_remove(1);
    assert_eq!(removed.as_integer(), 10);
    assert_eq!(t.table_len(), 2);
    assert_eq!(ints(&engine.eval("return t[1], t[2], t[3]").unwrap()), vec![20, 30, 0]);
    assert!(engine.eval("return t[3]").unwrap()[0].is_nil());
}

#[test]
fn test_table_append_and_insert() {
    let engine = Engine::new().unwrap();
    let t = engine.lua_table().unwrap();
    let a = engine.value_for("a").unwrap();
    let b = engine.value_for("b").unwrap();
    let c = engine.value_for("c").unwrap();

    t.table_append(&b);
    t.table_append(&c);
    t.table_insert(1, &a);
    assert_eq!(t.table_len(), 3);

    engine.set_global("t", &t).unwrap();
    assert_eq!(eval_first(&engine, "return table.concat(t)").unwrap().as_string(), "abc");
}

#[test]
fn test_table_insert_out_of_range_sets_key() {
    let engine = Engine::new().unwrap();
    let t = engine.lua_table().unwrap();
    let a = engine.value_for("a").unwrap();
    let z = engine.value_for("z").unwrap();

    // 越界位置直接写入该键，不移动其他元素
    t.table_insert(5, &a);
    t.table_insert(0, &z);
    assert_eq!(t.table_len(), 0);

    engine.set_global("t", &t).unwrap();
    let out = engine.eval("return t[5], t[0]").unwrap();
    assert_eq!(out[0].as_string(), "a");
    assert_eq!(out[1].as_string(), "z");
}

#[test]
fn test_table_remove_beyond_length_keeps_entry() {
    let engine = engine_with("t = {1, 2, 3, [10] = 'x'}");
    let t = engine.get_global("t");

    assert!(t.table_remove(10).is_nil());
    assert!(t.table_remove(4).is_nil());
    assert_eq!(t.table_len(), 3);
    assert_eq!(eval_first(&engine, "return t[10]").unwrap().as_string(), "x");
}

#[test]
fn test_table_remove_non_positive_pops_last() {
    let engine = engine_with("t = {1, 2, 3}");
    let t = engine.get_global("t");

    assert_eq!(t.table_remove(0).as_integer(), 3);
    assert_eq!(t.table_remove(-5).as_integer(), 2);
    assert_eq!(t.table_len(), 1);

    let empty = engine.lua_table().unwrap();
    assert!(empty.table_remove(0).is_nil());
    assert!(empty.table_remove(1).is_nil());
}

#[test]
fn test_table_append_remove_round_trip() {
    let engine = Engine::new().unwrap();
    let t = engine.lua_table().unwrap();
    for i in 1..=3 {
        t.table_append(&engine.value_for(i).unwrap());
    }
    assert_eq!(t.table_len(), 3);

    let removed = t.table_remove(2);
    assert_eq!(removed.as_integer(), 2);
    assert_eq!(t.table_len(), 2);
    assert_eq!(t.to_host(), HostValue::List(vec![HostValue::Int(1), HostValue::Int(3)]));
}

#[test]
fn test_table_max_n() {
    let engine = Engine::new().unwrap();
    let t = eval_first(&engine, "return {[1] = 1, [5] = 5, x = 9, [-2] = 0}").unwrap();
    assert_eq!(t.table_max_n(), 5);

    let empty = engine.lua_table().unwrap();
    assert_eq!(empty.table_max_n(), 0);
}

#[test]
fn test_table_next_visits_every_entry() {
    let engine = Engine::new().unwrap();
    let t = eval_first(&engine, "return {1, 2, 3, a = 4, b = 5}").unwrap();

    let mut key = Value::nil();
    let mut sum = 0;
    let mut steps = 0;
    loop {
        let (k, v) = t.table_next(&key);
        if k.is_nil() {
            break;
        }
        sum += v.as_integer();
        steps += 1;
        key = k;
    }
    assert_eq!(steps, 5);
    assert_eq!(sum, 15);
}

#[test]
fn test_table_for_each() {
    let engine = Engine::new().unwrap();
    let t = eval_first(&engine, "return {x = 1, y = 2}").unwrap();

    let mut keys = Vec::new();
    t.table_for_each(|k, _| keys.push(k.as_string()));
    keys.sort();
    assert_eq!(keys, vec!["x", "y"]);
}

#[test]
fn test_table_ops_on_non_table() {
    let engine = Engine::new().unwrap();
    let s = engine.value_for("text").unwrap();
    let v = engine.value_for(1).unwrap();

    s.table_append(&v);
    s.table_insert(1, &v);
    assert_eq!(s.table_len(), -1);
    assert!(s.table_remove(1).is_nil());
    assert_eq!(s.as_string(), "text");

    let mut visited = 0;
    s.table_for_each(|_, _| visited += 1);
    assert_eq!(visited, 0);
}
