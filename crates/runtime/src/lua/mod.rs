//! Lua 5.4 implementation of [`Engine`].

mod convert;

use std::fmt;
use std::path::{Path, PathBuf};

use hotparam_primitives::{ScalarKind, Value};
use mlua::{Function, Lua, MultiValue, RegistryKey};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::{CallableHandle, Engine, EngineError, MAX_SCRIPT_BYTES, ResultTypeError, STACK_SLOTS, ScriptLoadError};

/// Resource limits of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
	/// Maximum number of values on the engine stack.
	pub stack_slots: usize,
	/// Scripts larger than this are rejected before parsing.
	pub max_script_bytes: usize,
}

impl Default for EngineLimits {
	fn default() -> Self {
		Self {
			stack_slots: STACK_SLOTS,
			max_script_bytes: MAX_SCRIPT_BYTES,
		}
	}
}

/// Embedded Lua state with a host-side value stack.
///
/// Arguments and results live on `stack` between the push, call and pop
/// steps of one marshalled call. Pinned callables are anchored in the Lua
/// registry so they survive reassignment of their global.
pub struct LuaEngine {
	lua: Lua,
	stack: Vec<mlua::Value>,
	pinned: FxHashMap<u64, RegistryKey>,
	next_pin: u64,
	limits: EngineLimits,
}

impl fmt::Debug for LuaEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LuaEngine")
			.field("stack", &self.stack.len())
			.field("pinned", &self.pinned.len())
			.field("limits", &self.limits)
			.finish_non_exhaustive()
	}
}

impl Default for LuaEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl LuaEngine {
	pub fn new() -> Self {
		Self::with_limits(EngineLimits::default())
	}

	pub fn with_limits(limits: EngineLimits) -> Self {
		Self {
			lua: Lua::new(),
			stack: Vec::new(),
			pinned: FxHashMap::default(),
			next_pin: 0,
			limits,
		}
	}

	pub fn limits(&self) -> EngineLimits {
		self.limits
	}

	fn pop(&mut self) -> Result<mlua::Value, EngineError> {
		self.stack.pop().ok_or(EngineError::StackUnderflow { requested: 1, available: 0 })
	}

	fn push(&mut self, value: mlua::Value) -> Result<(), EngineError> {
		if self.stack.len() >= self.limits.stack_slots {
			return Err(EngineError::StackExhausted {
				limit: self.limits.stack_slots,
			});
		}
		trace!(ty = value.type_name(), depth = self.stack.len(), "engine.push");
		self.stack.push(value);
		Ok(())
	}

	fn invoke(&mut self, function: &Function, n_in: usize, n_out: usize) -> Result<(), EngineError> {
		let available = self.stack.len();
		if available < n_in {
			return Err(EngineError::StackUnderflow { requested: n_in, available });
		}
		let args: MultiValue = self.stack.split_off(available - n_in).into_iter().collect();
		let results = function.call::<MultiValue>(args).map_err(convert::execution)?;

		let mut results: Vec<mlua::Value> = results.into_iter().collect();
		results.resize(n_out, mlua::Value::Nil);
		self.ensure_stack(n_out)?;
		self.stack.extend(results);
		Ok(())
	}
}

impl Engine for LuaEngine {
	fn load_script(&mut self, path: &Path) -> Result<(), ScriptLoadError> {
		let failure = |message: String| ScriptLoadError {
			path: path.to_path_buf(),
			message,
		};
		let metadata = std::fs::metadata(path).map_err(|error| failure(format!("failed to read {}: {error}", path.display())))?;
		if metadata.len() > self.limits.max_script_bytes as u64 {
			return Err(failure(format!("script exceeds {} byte limit", self.limits.max_script_bytes)));
		}
		let source = std::fs::read_to_string(path).map_err(|error| failure(format!("failed to read {}: {error}", path.display())))?;
		self.load_source(&format!("@{}", path.display()), &source).map_err(|error| ScriptLoadError {
			path: path.to_path_buf(),
			message: error.message,
		})
	}

	fn load_source(&mut self, name: &str, source: &str) -> Result<(), ScriptLoadError> {
		let path = PathBuf::from(name.strip_prefix('@').unwrap_or(name));
		if source.len() > self.limits.max_script_bytes {
			return Err(ScriptLoadError {
				path,
				message: format!("script exceeds {} byte limit", self.limits.max_script_bytes),
			});
		}
		debug!(script = name, bytes = source.len(), "engine.load");
		self.lua.load(source).set_name(name).exec().map_err(|error| ScriptLoadError {
			path,
			message: convert::diagnostic(&error),
		})
	}

	fn get_global(&self, name: &str) -> Result<Option<Value>, EngineError> {
		let value = self.lua.globals().raw_get::<mlua::Value>(name).map_err(convert::execution)?;
		match convert::from_lua(&value, 0)? {
			Value::Nil => Ok(None),
			value => Ok(Some(value)),
		}
	}

	fn set_global(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
		let value = convert::to_lua(&self.lua, value, 0)?;
		self.lua.globals().raw_set(name, value).map_err(convert::execution)
	}

	fn is_invocable(&self, name: &str) -> Result<bool, EngineError> {
		let value = self.lua.globals().raw_get::<mlua::Value>(name).map_err(convert::execution)?;
		Ok(matches!(value, mlua::Value::Function(_)))
	}

	fn pin_callable(&mut self, name: &str) -> Result<Option<CallableHandle>, EngineError> {
		let value = self.lua.globals().raw_get::<mlua::Value>(name).map_err(convert::execution)?;
		let mlua::Value::Function(function) = value else {
			return Ok(None);
		};
		let key = self.lua.create_registry_value(function).map_err(convert::execution)?;
		let handle = CallableHandle::from_raw(self.next_pin);
		self.next_pin += 1;
		self.pinned.insert(handle.raw(), key);
		trace!(callable = name, handle = handle.raw(), "engine.pin");
		Ok(Some(handle))
	}

	fn release_callable(&mut self, handle: CallableHandle) {
		let Some(key) = self.pinned.remove(&handle.raw()) else {
			return;
		};
		if let Err(error) = self.lua.remove_registry_value(key) {
			warn!(handle = handle.raw(), %error, "engine.release failed");
		}
	}

	fn ensure_stack(&mut self, extra: usize) -> Result<(), EngineError> {
		if self.stack.len().saturating_add(extra) > self.limits.stack_slots {
			return Err(EngineError::StackExhausted {
				limit: self.limits.stack_slots,
			});
		}
		Ok(())
	}

	fn stack_len(&self) -> usize {
		self.stack.len()
	}

	fn truncate_stack(&mut self, len: usize) {
		self.stack.truncate(len);
	}

	fn push_scalar(&mut self, value: &Value) -> Result<(), EngineError> {
		if matches!(value, Value::List(_)) {
			return Err(EngineError::Conversion {
				type_name: value.type_name(),
				reason: "arrays are pushed with push_array".to_string(),
			});
		}
		let value = convert::to_lua(&self.lua, value, 0)?;
		self.push(value)
	}

	fn push_array(&mut self, values: &[Value]) -> Result<(), EngineError> {
		let table = self.lua.create_table_with_capacity(values.len(), 0).map_err(convert::execution)?;
		for (index, value) in values.iter().enumerate() {
			table.raw_set(index + 1, convert::to_lua(&self.lua, value, 1)?).map_err(convert::execution)?;
		}
		self.push(mlua::Value::Table(table))
	}

	fn call_pinned(&mut self, handle: CallableHandle, n_in: usize, n_out: usize) -> Result<(), EngineError> {
		let key = self.pinned.get(&handle.raw()).ok_or(EngineError::Unpinned(handle))?;
		let function = self.lua.registry_value::<Function>(key).map_err(convert::execution)?;
		self.invoke(&function, n_in, n_out)
	}

	fn call_named(&mut self, name: &str, n_in: usize, n_out: usize) -> Result<(), EngineError> {
		let value = self.lua.globals().raw_get::<mlua::Value>(name).map_err(convert::execution)?;
		let mlua::Value::Function(function) = value else {
			return Err(EngineError::NotInvocable { name: name.to_string() });
		};
		self.invoke(&function, n_in, n_out)
	}

	fn pop_scalar(&mut self, expected: ScalarKind) -> Result<Value, EngineError> {
		let value = self.pop()?;
		trace!(ty = value.type_name(), %expected, "engine.pop");
		Ok(convert::scalar(&value, expected)?)
	}

	fn pop_array(&mut self, expected: ScalarKind, len: Option<usize>) -> Result<Vec<Value>, EngineError> {
		let value = self.pop()?;
		trace!(ty = value.type_name(), %expected, "engine.pop_array");
		let mismatch = |actual: String| ResultTypeError {
			expected: match len {
				Some(len) => format!("array of {len} {expected}"),
				None => format!("array of {expected}"),
			},
			actual,
		};

		let mlua::Value::Table(table) = value else {
			return Err(mismatch(value.type_name().to_string()).into());
		};
		let Some(items) = convert::sequence(&table)? else {
			return Err(mismatch("table with non-sequence keys".to_string()).into());
		};
		if let Some(len) = len
			&& items.len() != len
		{
			return Err(mismatch(format!("array of {} items", items.len())).into());
		}
		items
			.iter()
			.map(|item| convert::scalar(item, expected).map_err(|error| EngineError::from(mismatch(format!("array containing {}", error.actual)))))
			.collect()
	}
}

#[cfg(test)]
mod tests;
