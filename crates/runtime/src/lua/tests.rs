use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

fn engine(source: &str) -> LuaEngine {
	let _ = tracing_subscriber::fmt::try_init();
	let mut engine = LuaEngine::new();
	engine.load_source("test.lua", source).expect("source should load");
	engine
}

fn write_script(dir: &Path, source: &str) -> PathBuf {
	let path = dir.join("config.lua");
	std::fs::write(&path, source).expect("config.lua should be writable");
	path
}

#[test]
fn load_script_and_read_globals() {
	let temp = tempfile::tempdir().expect("temp dir should exist");
	let path = write_script(temp.path(), "count = 5\nrate = 0.25\nname = 'hot'\nflags = {true, false}\n");

	let mut engine = LuaEngine::new();
	engine.load_script(&path).expect("script should load");

	assert_eq!(engine.get_global("count").unwrap(), Some(Value::Int(5)));
	assert_eq!(engine.get_global("rate").unwrap(), Some(Value::Double(0.25)));
	assert_eq!(engine.get_global("name").unwrap(), Some(Value::from("hot")));
	assert_eq!(engine.get_global("flags").unwrap(), Some(Value::List(vec![Value::Bool(true), Value::Bool(false)])));
	assert_eq!(engine.get_global("missing").unwrap(), None);
}

#[test]
fn nested_tables_become_nested_lists() {
	let engine = engine("grid = {{1, 2}, {3, 4}}\nmap = {a = 1}\nf = function() end");
	assert_eq!(engine.get_global("grid").unwrap(), Some(Value::List(vec![Value::from(vec![1i64, 2]), Value::from(vec![3i64, 4])])));
	assert_eq!(engine.get_global("map").unwrap(), Some(Value::Foreign("table")));
	assert_eq!(engine.get_global("f").unwrap(), Some(Value::Function));
}

#[test]
fn self_referencing_table_is_rejected() {
	let engine = engine("t = {}\nt[1] = t");
	let err = engine.get_global("t").expect_err("cyclic table should not convert");
	assert!(matches!(err, EngineError::Conversion { .. }), "got: {err:?}");
}

#[test]
fn syntax_error_keeps_engine_message() {
	let temp = tempfile::tempdir().expect("temp dir should exist");
	let path = write_script(temp.path(), "count = = 5\n");

	let err = LuaEngine::new().load_script(&path).expect_err("bad syntax should fail");
	assert_eq!(err.path, path);
	assert!(err.message.ends_with("config.lua:1: unexpected symbol near '='"), "got: {}", err.message);
	assert_eq!(err.to_string(), err.message);
}

#[test]
fn runtime_error_keeps_engine_message() {
	let err = LuaEngine::new().load_source("boom.lua", "error('boom')").expect_err("error() should fail");
	assert_eq!(err.message, "[string \"boom.lua\"]:1: boom");
}

#[test]
fn load_error_drops_traceback() {
	let err = LuaEngine::new().load_source("cfg.lua", "count = 1\nx.y = 1").expect_err("indexing nil should fail");
	assert_eq!(err.message, "[string \"cfg.lua\"]:2: attempt to index a nil value (global 'x')");
}

#[test]
fn missing_script_is_a_load_error() {
	let temp = tempfile::tempdir().expect("temp dir should exist");
	let err = LuaEngine::new().load_script(&temp.path().join("nope.lua")).expect_err("missing file should fail");
	assert!(err.message.contains("failed to read"), "got: {}", err.message);
}

#[test]
fn oversized_script_is_rejected() {
	let temp = tempfile::tempdir().expect("temp dir should exist");
	let limits = EngineLimits {
		max_script_bytes: 16,
		..EngineLimits::default()
	};
	let path = write_script(temp.path(), "count = 123456789012345");
	let err = LuaEngine::with_limits(limits).load_script(&path).expect_err("oversized script should be rejected");
	assert!(err.message.contains("exceeds 16 byte limit"), "got: {}", err.message);

	let err = LuaEngine::with_limits(limits).load_source("x.lua", &"x".repeat(17)).expect_err("oversized source should be rejected");
	assert!(err.message.contains("exceeds"), "got: {}", err.message);
}

#[test]
fn set_global_round_trips() {
	let mut engine = engine("");
	let value = Value::List(vec![Value::from("a"), Value::from("b")]);
	engine.set_global("names", &value).unwrap();
	assert_eq!(engine.get_global("names").unwrap(), Some(value));
	assert!(engine.set_global("f", &Value::Function).is_err());
}

#[test]
fn push_call_pop_sums_arguments() {
	let mut engine = engine("add = function(a, b) return a + b end");
	engine.push_scalar(&Value::Int(3)).unwrap();
	engine.push_scalar(&Value::Int(4)).unwrap();
	engine.call_named("add", 2, 1).unwrap();
	assert_eq!(engine.pop_scalar(ScalarKind::Int).unwrap(), Value::Int(7));
	assert_eq!(engine.stack_len(), 0);
}

#[test]
fn missing_results_are_nil_and_extras_dropped() {
	let mut engine = engine("two = function() return 1, 2 end\nnone = function() end");
	engine.call_named("two", 0, 1).unwrap();
	assert_eq!(engine.stack_len(), 1);
	assert_eq!(engine.pop_scalar(ScalarKind::Int).unwrap(), Value::Int(1));

	engine.call_named("none", 0, 2).unwrap();
	assert_eq!(engine.stack_len(), 2);
	let err = engine.pop_scalar(ScalarKind::Double).unwrap_err();
	assert_eq!(
		err,
		EngineError::ResultType(ResultTypeError {
			expected: "double".to_string(),
			actual: "nil".to_string(),
		})
	);
}

#[rstest]
#[case("return 3", ScalarKind::Double, Ok(Value::Double(3.0)))]
#[case("return 3.0", ScalarKind::Int, Ok(Value::Int(3)))]
#[case("return 3.5", ScalarKind::Int, Err("double"))]
#[case("return '3'", ScalarKind::Int, Err("string"))]
#[case("return 1", ScalarKind::Bool, Err("int"))]
#[case("return {}", ScalarKind::String, Err("table"))]
fn pop_scalar_checks_types(#[case] body: &str, #[case] expected: ScalarKind, #[case] outcome: Result<Value, &str>) {
	let mut engine = engine(&format!("f = function() {body} end"));
	engine.call_named("f", 0, 1).unwrap();
	match (engine.pop_scalar(expected), outcome) {
		(Ok(value), Ok(want)) => assert_eq!(value, want),
		(Err(EngineError::ResultType(err)), Err(actual)) => {
			assert_eq!(err.expected, expected.to_string());
			assert_eq!(err.actual, actual);
		}
		(got, want) => panic!("unexpected pop result {got:?}, wanted {want:?}"),
	}
}

#[test]
fn arrays_are_copied_in_and_out() {
	let mut engine = engine("scale = function(xs, k) local out = {} for i, x in ipairs(xs) do out[i] = x * k end return out end");
	engine.push_array(&[Value::Double(1.0), Value::Double(2.5)]).unwrap();
	engine.push_scalar(&Value::Int(2)).unwrap();
	engine.call_named("scale", 2, 1).unwrap();
	assert_eq!(engine.pop_array(ScalarKind::Double, Some(2)).unwrap(), vec![Value::Double(2.0), Value::Double(5.0)]);
}

#[test]
fn pop_array_checks_length_and_items() {
	let mut engine = engine("three = function() return {1, 2, 3} end\nmixed = function() return {1, 'x'} end");
	engine.call_named("three", 0, 1).unwrap();
	let err = engine.pop_array(ScalarKind::Int, Some(2)).unwrap_err();
	assert_eq!(err.to_string(), "expected array of 2 int, found array of 3 items");

	engine.call_named("mixed", 0, 1).unwrap();
	let err = engine.pop_array(ScalarKind::Int, None).unwrap_err();
	assert_eq!(err.to_string(), "expected array of int, found array containing string");
}

#[test]
fn execution_errors_are_verbatim() {
	let mut engine = engine("fail = function() error('bad input', 0) end");
	let err = engine.call_named("fail", 0, 0).unwrap_err();
	let EngineError::Execution(message) = &err else {
		panic!("expected execution error, got {err:?}");
	};
	assert_eq!(message, "bad input");
	assert_eq!(err.to_string(), *message);
}

#[test]
fn call_named_requires_a_function() {
	let mut engine = engine("x = 1");
	assert_eq!(engine.call_named("x", 0, 0), Err(EngineError::NotInvocable { name: "x".to_string() }));
	assert_eq!(engine.call_named("nope", 0, 0), Err(EngineError::NotInvocable { name: "nope".to_string() }));
}

#[test]
fn pinned_callable_survives_reassignment() {
	let mut engine = engine("f = function() return 1 end");
	let handle = engine.pin_callable("f").unwrap().expect("f should pin");
	engine.load_source("edit.lua", "f = function() return 2 end").unwrap();

	engine.call_pinned(handle, 0, 1).unwrap();
	assert_eq!(engine.pop_scalar(ScalarKind::Int).unwrap(), Value::Int(1));
	engine.call_named("f", 0, 1).unwrap();
	assert_eq!(engine.pop_scalar(ScalarKind::Int).unwrap(), Value::Int(2));

	engine.release_callable(handle);
	assert_eq!(engine.call_pinned(handle, 0, 0), Err(EngineError::Unpinned(handle)));
	assert_eq!(engine.pin_callable("missing").unwrap(), None);
}

#[test]
fn stack_limit_is_enforced() {
	let mut engine = LuaEngine::with_limits(EngineLimits {
		stack_slots: 2,
		..EngineLimits::default()
	});
	engine.push_scalar(&Value::Int(1)).unwrap();
	assert!(engine.ensure_stack(1).is_ok());
	assert_eq!(engine.ensure_stack(2), Err(EngineError::StackExhausted { limit: 2 }));
	engine.push_scalar(&Value::Int(2)).unwrap();
	assert_eq!(engine.push_scalar(&Value::Int(3)), Err(EngineError::StackExhausted { limit: 2 }));

	engine.truncate_stack(0);
	assert_eq!(engine.stack_len(), 0);
	assert_eq!(engine.pop_scalar(ScalarKind::Int), Err(EngineError::StackUnderflow { requested: 1, available: 0 }));
}
