//! Script engine boundary.
//!
//! The registry and the marshalling protocol talk to the embedded script
//! engine only through the [`Engine`] trait: load a script, read and write
//! globals, and drive a value stack with push, call and pop. [`LuaEngine`] is
//! the Lua 5.4 implementation.
//!
//! Engines are not reentrant. [`SharedEngine`] is the single handle every
//! registry and callable shares; each operation holds its lock for its whole
//! duration.

mod error;
mod lua;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use error::{EngineError, ResultTypeError, ScriptLoadError};
use hotparam_primitives::{ScalarKind, Value};
pub use lua::{EngineLimits, LuaEngine};
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

/// Default cap on script source size.
pub const MAX_SCRIPT_BYTES: usize = 512 * 1024;

/// Default cap on value stack slots.
pub const STACK_SLOTS: usize = 8000;

/// An engine-side callable kept alive outside the global scope.
///
/// Pinning captures the function object itself, so later reassignment of the
/// global it was read from does not affect the pinned target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallableHandle(u64);

impl CallableHandle {
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn raw(self) -> u64 {
		self.0
	}
}

/// The operations the core needs from an embedded script engine.
pub trait Engine {
	/// Parses and executes the script at `path` in the engine's global scope.
	fn load_script(&mut self, path: &Path) -> Result<(), ScriptLoadError>;

	/// Parses and executes `source`, reporting diagnostics against `name`.
	fn load_source(&mut self, name: &str, source: &str) -> Result<(), ScriptLoadError>;

	/// Reads a global. Absent globals are `None`.
	fn get_global(&self, name: &str) -> Result<Option<Value>, EngineError>;

	fn set_global(&mut self, name: &str, value: &Value) -> Result<(), EngineError>;

	/// Returns true if the global `name` currently holds something callable.
	fn is_invocable(&self, name: &str) -> Result<bool, EngineError> {
		Ok(matches!(self.get_global(name)?, Some(Value::Function)))
	}

	/// Captures the callable currently stored in the global `name`.
	///
	/// Returns `None` if the global is absent or not invocable.
	fn pin_callable(&mut self, name: &str) -> Result<Option<CallableHandle>, EngineError>;

	fn release_callable(&mut self, handle: CallableHandle);

	/// Fails with [`EngineError::StackExhausted`] unless `extra` more values fit on the stack.
	fn ensure_stack(&mut self, extra: usize) -> Result<(), EngineError>;

	fn stack_len(&self) -> usize;

	/// Drops values above `len`.
	fn truncate_stack(&mut self, len: usize);

	fn push_scalar(&mut self, value: &Value) -> Result<(), EngineError>;

	/// Pushes a copy of `values` as one engine-native sequence.
	fn push_array(&mut self, values: &[Value]) -> Result<(), EngineError>;

	/// Calls a pinned callable with the top `n_in` stack values as arguments,
	/// leaving exactly `n_out` results on the stack (missing results are nil).
	fn call_pinned(&mut self, handle: CallableHandle, n_in: usize, n_out: usize) -> Result<(), EngineError>;

	/// Like [`Engine::call_pinned`], resolving the global `name` at call time.
	fn call_named(&mut self, name: &str, n_in: usize, n_out: usize) -> Result<(), EngineError> {
		let handle = self.pin_callable(name)?.ok_or_else(|| EngineError::NotInvocable { name: name.to_string() })?;
		let result = self.call_pinned(handle, n_in, n_out);
		self.release_callable(handle);
		result
	}

	/// Pops the top value, checking it against `expected`.
	fn pop_scalar(&mut self, expected: ScalarKind) -> Result<Value, EngineError>;

	/// Pops the top value as a flat array of `expected` items.
	///
	/// With `len`, the array must hold exactly that many items.
	fn pop_array(&mut self, expected: ScalarKind, len: Option<usize>) -> Result<Vec<Value>, EngineError>;
}

struct Shared<E: ?Sized> {
	/// Handles whose release found the engine locked.
	deferred: Mutex<Vec<CallableHandle>>,
	engine: Mutex<E>,
}

/// Shared, lock-guarded handle to one engine instance.
///
/// Cloning shares the engine; it never copies it.
#[derive(Clone)]
pub struct SharedEngine(Arc<Shared<dyn Engine>>);

impl SharedEngine {
	pub fn new<E: Engine + 'static>(engine: E) -> Self {
		let inner: Arc<Shared<dyn Engine>> = Arc::new(Shared {
			deferred: Mutex::new(Vec::new()),
			engine: Mutex::new(engine),
		});
		Self(inner)
	}

	/// Locks the engine for the duration of one operation.
	///
	/// Deferred releases are applied before the guard is returned.
	pub fn lock(&self) -> MutexGuard<'_, dyn Engine> {
		let mut guard = self.0.engine.lock();
		self.drain(&mut *guard);
		guard
	}

	pub fn try_lock(&self) -> Option<MutexGuard<'_, dyn Engine>> {
		let mut guard = self.0.engine.try_lock()?;
		self.drain(&mut *guard);
		Some(guard)
	}

	/// Releases a pinned callable, or queues the release for the next lock
	/// if the engine is busy, including when the caller itself holds it.
	pub fn release(&self, handle: CallableHandle) {
		match self.0.engine.try_lock() {
			Some(mut engine) => {
				self.drain(&mut *engine);
				engine.release_callable(handle);
			}
			None => {
				debug!(handle = handle.raw(), "engine.release deferred");
				self.0.deferred.lock().push(handle);
			}
		}
	}

	/// Number of releases waiting for the engine lock.
	pub fn deferred_releases(&self) -> usize {
		self.0.deferred.lock().len()
	}

	/// Returns true if both handles refer to the same engine.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	fn drain(&self, engine: &mut dyn Engine) {
		let deferred = std::mem::take(&mut *self.0.deferred.lock());
		for handle in deferred {
			engine.release_callable(handle);
		}
	}
}

impl fmt::Debug for SharedEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedEngine")
			.field("handles", &Arc::strong_count(&self.0))
			.field("deferred", &self.deferred_releases())
			.finish_non_exhaustive()
	}
}
