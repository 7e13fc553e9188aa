use std::fmt;
use std::path::Path;
use std::sync::Arc;

use hotparam_invocation::MarshalError;
use hotparam_primitives::{Element, Value};
use hotparam_registry::{CallableDecl, InsertAction, Param, ParameterRecord, Rank, Registry, TypeTag, ValueError};
use hotparam_runtime::{LuaEngine, SharedEngine};
use hotparam_signature::{NativeSignature, Signature, SignatureError};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::hook::{BindingState, Hook, PinnedCallable};
use crate::settings::{ReaderSettings, ReloadPolicy};
use crate::{ConfigError, Result, script};

/// Anything a callable signature can be taken from.
pub trait SignatureSource {
	fn into_signature(self) -> std::result::Result<Signature, SignatureError>;
}

impl SignatureSource for &str {
	fn into_signature(self) -> std::result::Result<Signature, SignatureError> {
		Signature::parse(self)
	}
}

impl SignatureSource for Signature {
	fn into_signature(self) -> std::result::Result<Signature, SignatureError> {
		Ok(self)
	}
}

impl SignatureSource for &Signature {
	fn into_signature(self) -> std::result::Result<Signature, SignatureError> {
		Ok(self.clone())
	}
}

/// Typed parameters backed by an editable script.
///
/// Owns the [`Registry`] and shares one engine with every [`Hook`] it hands
/// out. The engine is only touched under its lock.
pub struct ConfigReader {
	settings: ReaderSettings,
	registry: Registry,
	engine: SharedEngine,
	/// Targets captured by the most recent explicit read of each callable.
	bindings: FxHashMap<String, Arc<PinnedCallable>>,
}

impl fmt::Debug for ConfigReader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConfigReader")
			.field("script", &self.settings.script)
			.field("params", &self.registry.len())
			.field("resolved", &self.bindings.len())
			.finish_non_exhaustive()
	}
}

impl ConfigReader {
	/// Creates a reader with its own Lua engine.
	pub fn new(settings: ReaderSettings) -> Self {
		let engine = SharedEngine::new(LuaEngine::with_limits(settings.engine_limits()));
		Self::with_engine(settings, engine)
	}

	/// Creates a reader over an existing engine.
	pub fn with_engine(settings: ReaderSettings, engine: SharedEngine) -> Self {
		Self {
			settings,
			registry: Registry::new(),
			engine,
			bindings: FxHashMap::default(),
		}
	}

	pub fn settings(&self) -> &ReaderSettings {
		&self.settings
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn engine(&self) -> &SharedEngine {
		&self.engine
	}

	pub fn script_path(&self) -> &Path {
		&self.settings.script
	}

	pub fn register<T: Param>(&mut self, id: &str, default: T) -> Result<InsertAction> {
		self.register_doc(id, default, "")
	}

	pub fn register_doc<T: Param>(&mut self, id: &str, default: T, doc: &str) -> Result<InsertAction> {
		Ok(self.registry.register_param(id, default, doc)?)
	}

	/// Registers a callable parameter from a signature string such as `"ii>i"`.
	pub fn register_callable(&mut self, id: &str, signature: impl SignatureSource, doc: &str) -> Result<InsertAction> {
		self.register_callable_decl(id, CallableDecl::new(signature.into_signature()?), doc)
	}

	/// Registers a callable parameter whose generated definition has `body`.
	pub fn register_callable_decl(&mut self, id: &str, decl: CallableDecl, doc: &str) -> Result<InsertAction> {
		Ok(self.registry.register_callable(id, decl, doc)?)
	}

	/// Registers a callable parameter with the signature of native type `F`.
	///
	/// Raw pointers and `&mut` scalars are ambiguous and fail with
	/// [`SignatureError::Ambiguous`]; use [`ConfigReader::register_callable`].
	pub fn register_native<F: NativeSignature<Args>, Args>(&mut self, id: &str, doc: &str) -> Result<InsertAction> {
		self.register_callable(id, F::signature()?, doc)
	}

	/// Writes the script with every registered default, unless it already exists.
	///
	/// Returns `false` when an existing script was left untouched.
	pub fn write_script(&self) -> Result<bool> {
		script::write_new(&self.settings.script, &self.settings.preamble, &self.registry)
	}

	/// Text [`ConfigReader::write_script`] would write.
	pub fn render_script(&self) -> String {
		script::render(&self.settings.preamble, &self.registry)
	}

	/// Loads (or reloads) the script into the engine.
	pub fn reload(&self) -> Result<()> {
		self.engine.lock().load_script(&self.settings.script)?;
		Ok(())
	}

	/// Reads a data parameter.
	///
	/// # Errors
	///
	/// Fails if `id` is unregistered or registered with another type, if the
	/// script fails to load, or if the script's value has the wrong type or
	/// dimensions.
	pub fn read<T: Param>(&self, id: &str) -> Result<T> {
		let record = self.registry.require(id, &T::type_tag())?;
		let value = self.fetch(id)?;
		let read = T::from_value(&value).map_err(|error| value_error(id, record, error))?;

		let dims = read.dims();
		if dims != record.dims() {
			return Err(ConfigError::ShapeMismatch {
				id: id.to_string(),
				expected: record.dims().to_vec(),
				actual: dims,
			});
		}
		Ok(read)
	}

	/// Reads a data parameter into an existing location.
	pub fn read_into<T: Param>(&self, id: &str, out: &mut T) -> Result<()> {
		*out = self.read(id)?;
		Ok(())
	}

	/// Reads a rank 1 array parameter into a caller buffer of `len` elements.
	///
	/// `len` must equal the array's registered length.
	///
	/// # Safety
	///
	/// Same contract as [`ConfigReader::read_into_raw_dims`] with `dims == [len]`.
	pub unsafe fn read_into_raw<T: Element>(&self, id: &str, ptr: *mut T, len: usize) -> Result<()>
	where
		Vec<T>: Param,
		Vec<Vec<T>>: Param,
		Vec<Vec<Vec<T>>>: Param,
	{
		// SAFETY: forwarded from this function's contract.
		unsafe { self.read_into_raw_dims(id, ptr, &[len]) }
	}

	/// Reads an array parameter of rank `dims.len()` into a caller buffer,
	/// row-major.
	///
	/// `dims` must equal the array's registered dimensions, so a 2 by 3 grid
	/// is read with `dims == [2, 3]` into six elements. Nothing is written
	/// unless the whole read succeeds.
	///
	/// # Safety
	///
	/// `ptr` must be valid for reads and writes of `dims.iter().product()`
	/// initialized `T`s and must not be aliased for the duration of the call.
	/// Null is accepted only when that product is zero.
	pub unsafe fn read_into_raw_dims<T: Element>(&self, id: &str, ptr: *mut T, dims: &[usize]) -> Result<()>
	where
		Vec<T>: Param,
		Vec<Vec<T>>: Param,
		Vec<Vec<Vec<T>>>: Param,
	{
		let (items, actual) = match Rank::from_usize(dims.len()) {
			Some(Rank::One) => {
				let items: Vec<T> = self.read(id)?;
				let actual = items.dims();
				(items, actual)
			}
			Some(Rank::Two) => {
				let rows: Vec<Vec<T>> = self.read(id)?;
				let actual = rows.dims();
				(rows.into_iter().flatten().collect(), actual)
			}
			Some(Rank::Three) => {
				let planes: Vec<Vec<Vec<T>>> = self.read(id)?;
				let actual = planes.dims();
				(planes.into_iter().flatten().flatten().collect::<Vec<T>>(), actual)
			}
			None => {
				return Err(ConfigError::ShapeMismatch {
					id: id.to_string(),
					expected: dims.to_vec(),
					actual: self.registry.get(id).map(|record| record.dims().to_vec()).unwrap_or_default(),
				});
			}
		};
		if actual != dims {
			return Err(ConfigError::ShapeMismatch {
				id: id.to_string(),
				expected: dims.to_vec(),
				actual,
			});
		}
		if items.is_empty() {
			return Ok(());
		}
		if ptr.is_null() {
			return Err(ConfigError::NullBuffer { id: id.to_string() });
		}
		// SAFETY: non-null and valid for `items.len()` (the product of `dims`)
		// initialized elements per the caller's contract.
		let out = unsafe { std::slice::from_raw_parts_mut(ptr, items.len()) };
		for (slot, item) in out.iter_mut().zip(items) {
			*slot = item;
		}
		Ok(())
	}

	/// Explicitly reads a callable parameter, capturing the function the
	/// script defines right now.
	///
	/// The returned hook keeps calling that function even if the script is
	/// edited; it also becomes the target of [`ConfigReader::cached`].
	pub fn read_callable(&mut self, id: &str, signature: impl SignatureSource) -> Result<Hook> {
		let signature = signature.into_signature()?;
		self.registry.require(id, &TypeTag::Callable(signature.clone()))?;
		if self.settings.reload == ReloadPolicy::EveryRead {
			self.reload()?;
		}
		let pinned = self.pin(id)?;
		Ok(Hook::pinned(id.to_string(), signature, self.engine.clone(), pinned))
	}

	/// Returns a hook that reloads the script and refetches `id` before
	/// every call, so the latest edit is always the one invoked.
	///
	/// Resolving also refreshes the target used by [`ConfigReader::cached`].
	pub fn resolve_now(&mut self, id: &str, signature: impl SignatureSource) -> Result<Hook> {
		let signature = signature.into_signature()?;
		self.registry.require(id, &TypeTag::Callable(signature.clone()))?;
		self.reload()?;
		self.pin(id)?;
		Ok(Hook::live(id.to_string(), signature, self.engine.clone(), self.settings.script.clone()))
	}

	/// Returns a hook on the target captured by the most recent explicit
	/// read of `id`, without touching the script.
	///
	/// An unresolved parameter is read first.
	pub fn cached(&mut self, id: &str, signature: impl SignatureSource) -> Result<Hook> {
		let signature = signature.into_signature()?;
		self.registry.require(id, &TypeTag::Callable(signature.clone()))?;
		if let Some(pinned) = self.bindings.get(id).cloned() {
			return Ok(Hook::pinned(id.to_string(), signature, self.engine.clone(), pinned));
		}
		self.read_callable(id, signature)
	}

	pub fn binding_state(&self, id: &str) -> BindingState {
		if self.bindings.contains_key(id) {
			BindingState::Resolved
		} else {
			BindingState::Unresolved
		}
	}

	fn fetch(&self, id: &str) -> Result<Value> {
		let mut engine = self.engine.lock();
		if self.settings.reload == ReloadPolicy::EveryRead {
			engine.load_script(&self.settings.script)?;
		}
		engine.get_global(id)?.ok_or_else(|| ConfigError::Missing { id: id.to_string() })
	}

	/// Pins the current definition of `id` and makes it the cached target.
	fn pin(&mut self, id: &str) -> Result<Arc<PinnedCallable>> {
		let handle = self
			.engine
			.lock()
			.pin_callable(id)?
			.ok_or_else(|| MarshalError::CallableNotFound { name: id.to_string() })?;
		let pinned = Arc::new(PinnedCallable::new(handle, self.engine.clone()));
		debug!(id = id, handle = handle.raw(), "reader.resolve");
		// The engine lock is released here, so a replaced binding can release its pin.
		self.bindings.insert(id.to_string(), Arc::clone(&pinned));
		Ok(pinned)
	}
}

fn value_error(id: &str, record: &ParameterRecord, error: ValueError) -> ConfigError {
	match error {
		ValueError::Type { expected, actual } => ConfigError::ValueType {
			id: id.to_string(),
			expected,
			actual,
		},
		ValueError::Shape { expected, actual } => ConfigError::ShapeMismatch {
			id: id.to_string(),
			expected,
			actual,
		},
		ValueError::Ragged { .. } => ConfigError::ValueType {
			id: id.to_string(),
			expected: format!("rectangular {}", record.tag()),
			actual: "ragged array".to_string(),
		},
	}
}

