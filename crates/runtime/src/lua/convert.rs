//! Conversions between [`Value`] and Lua values.

use hotparam_primitives::{ScalarKind, Value};
use mlua::{Lua, Table};

use crate::{EngineError, ResultTypeError};

/// Nesting limit for tables crossing the boundary; guards against cycles.
pub(super) const MAX_DEPTH: usize = 16;

pub(super) fn to_lua(lua: &Lua, value: &Value, depth: usize) -> Result<mlua::Value, EngineError> {
	Ok(match value {
		Value::Nil => mlua::Value::Nil,
		Value::Int(v) => mlua::Value::Integer(*v),
		Value::Double(v) => mlua::Value::Number(*v),
		Value::Bool(v) => mlua::Value::Boolean(*v),
		Value::String(v) => mlua::Value::String(lua.create_string(v).map_err(execution)?),
		Value::List(items) => {
			if depth >= MAX_DEPTH {
				return Err(too_deep("array"));
			}
			let table = lua.create_table_with_capacity(items.len(), 0).map_err(execution)?;
			for (index, item) in items.iter().enumerate() {
				table.raw_set(index + 1, to_lua(lua, item, depth + 1)?).map_err(execution)?;
			}
			mlua::Value::Table(table)
		}
		Value::Function | Value::Foreign(_) => {
			return Err(EngineError::Conversion {
				type_name: value.type_name(),
				reason: "engine objects cannot be created from the host".to_string(),
			});
		}
	})
}

pub(super) fn from_lua(value: &mlua::Value, depth: usize) -> Result<Value, EngineError> {
	Ok(match value {
		mlua::Value::Nil => Value::Nil,
		mlua::Value::Integer(v) => Value::Int(*v),
		mlua::Value::Number(v) => Value::Double(*v),
		mlua::Value::Boolean(v) => Value::Bool(*v),
		mlua::Value::String(s) => Value::String(s.to_str().map_err(|e| conversion("string", e))?.to_string()),
		mlua::Value::Table(table) => {
			if depth >= MAX_DEPTH {
				return Err(too_deep("table"));
			}
			match sequence(table)? {
				Some(items) => Value::List(items.iter().map(|item| from_lua(item, depth + 1)).collect::<Result<_, _>>()?),
				None => Value::Foreign("table"),
			}
		}
		mlua::Value::Function(_) => Value::Function,
		other => Value::Foreign(other.type_name()),
	})
}

/// Reads `table` as a sequence, or `None` if it has non-sequence keys.
pub(super) fn sequence(table: &Table) -> Result<Option<Vec<mlua::Value>>, EngineError> {
	let len = table.raw_len();
	let mut items = Vec::with_capacity(len);
	for index in 1..=len {
		items.push(table.raw_get::<mlua::Value>(index).map_err(execution)?);
	}
	let mut pairs = 0usize;
	for pair in table.clone().pairs::<mlua::Value, mlua::Value>() {
		pair.map_err(execution)?;
		pairs += 1;
	}
	Ok((pairs == len).then_some(items))
}

/// Converts a popped scalar, applying the numeric coercions of the Lua 5.4 number model.
pub(super) fn scalar(value: &mlua::Value, expected: ScalarKind) -> Result<Value, ResultTypeError> {
	let plain = match value {
		mlua::Value::Integer(v) => Value::Int(*v),
		mlua::Value::Number(v) => Value::Double(*v),
		mlua::Value::Boolean(v) => Value::Bool(*v),
		mlua::Value::String(s) => match s.to_str() {
			Ok(s) => Value::String(s.to_string()),
			Err(_) => Value::Foreign("non-UTF-8 string"),
		},
		mlua::Value::Table(_) => Value::Foreign("table"),
		other => Value::Foreign(other.type_name()),
	};
	plain.coerce_to(expected).ok_or_else(|| ResultTypeError {
		expected: expected.to_string(),
		actual: plain.type_name().to_string(),
	})
}

pub(super) fn execution(error: mlua::Error) -> EngineError {
	EngineError::Execution(diagnostic(&error))
}

/// The engine's own message, without mlua's category prefix or the
/// traceback its message handler appends.
pub(super) fn diagnostic(error: &mlua::Error) -> String {
	match error {
		mlua::Error::SyntaxError { message, .. } => without_traceback(message).to_string(),
		mlua::Error::RuntimeError(message) => without_traceback(message).to_string(),
		mlua::Error::CallbackError { cause, .. } => diagnostic(cause),
		other => other.to_string(),
	}
}

fn without_traceback(message: &str) -> &str {
	match message.find("\nstack traceback:") {
		Some(at) => &message[..at],
		None => message,
	}
}

fn conversion(type_name: &'static str, error: mlua::Error) -> EngineError {
	EngineError::Conversion {
		type_name,
		reason: diagnostic(&error),
	}
}

fn too_deep(type_name: &'static str) -> EngineError {
	EngineError::Conversion {
		type_name,
		reason: format!("nesting exceeds {MAX_DEPTH} levels"),
	}
}
