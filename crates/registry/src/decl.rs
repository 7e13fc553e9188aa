//! Lua source text for parameter declarations.

use std::fmt::Write as _;

use hotparam_primitives::Value;

/// Renders `value` as a Lua expression, or `None` for engine-only values.
///
/// Doubles use the shortest text that reads back to the same bits and always
/// lex as floats; non-finite doubles become `math.huge`, `-math.huge` and `0/0`.
pub fn lua_literal(value: &Value) -> Option<String> {
	let mut out = String::new();
	write_literal(&mut out, value)?;
	Some(out)
}

fn write_literal(out: &mut String, value: &Value) -> Option<()> {
	match value {
		Value::Nil => out.push_str("nil"),
		// The positive half of i64::MIN does not lex as an integer.
		Value::Int(i64::MIN) => out.push_str("math.mininteger"),
		Value::Int(v) => {
			let _ = write!(out, "{v}");
		}
		Value::Double(v) => write_double(out, *v),
		Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
		Value::String(v) => write_string(out, v),
		Value::List(items) => {
			out.push('{');
			for (index, item) in items.iter().enumerate() {
				if index > 0 {
					out.push_str(", ");
				}
				write_literal(out, item)?;
			}
			out.push('}');
		}
		Value::Function | Value::Foreign(_) => return None,
	}
	Some(())
}

fn write_double(out: &mut String, v: f64) {
	if v.is_nan() {
		out.push_str("0/0");
	} else if v.is_infinite() {
		out.push_str(if v > 0.0 { "math.huge" } else { "-math.huge" });
	} else {
		// Debug output is the shortest round-trip form and keeps a `.0` or exponent.
		let _ = write!(out, "{v:?}");
	}
}

fn write_string(out: &mut String, s: &str) {
	out.push('"');
	for ch in s.chars() {
		match ch {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if c.is_ascii_control() => {
				let _ = write!(out, "\\{:03}", c as u32);
			}
			c => out.push(c),
		}
	}
	out.push('"');
}

/// Wraps `doc` in a Lua block comment, or returns an empty string for empty docs.
///
/// The comment level is raised until the closing bracket cannot occur in `doc`.
pub fn doc_block(doc: &str) -> String {
	if doc.is_empty() {
		return String::new();
	}
	let mut level = String::new();
	while doc.contains(&format!("]{level}]")) {
		level.push('=');
	}
	format!("--[{level}[\n{doc}\n--]{level}]\n")
}

/// `name = function(arg0, arg1)` header for a callable with `arity` inputs.
pub(crate) fn function_header(id: &str, arity: usize) -> String {
	let args: Vec<String> = (0..arity).map(|i| format!("arg{i}")).collect();
	format!("{id} = function({})\n", args.join(", "))
}
