use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use hotparam_invocation::{OutSlot, RawArg, RawOut, Target, call, call_into, call_raw};
use hotparam_primitives::Value;
use hotparam_runtime::{CallableHandle, SharedEngine};
use hotparam_signature::Signature;

use crate::Result;

/// Resolution state of a callable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
	/// No read has bound the parameter yet.
	Unresolved,
	/// A read captured a target; cached hooks call it.
	Resolved,
}

/// A script function captured at read time. Released when the last hook
/// drops, or on the engine's next lock if it is held at that moment.
pub(crate) struct PinnedCallable {
	handle: CallableHandle,
	engine: SharedEngine,
}

impl PinnedCallable {
	pub(crate) fn new(handle: CallableHandle, engine: SharedEngine) -> Self {
		Self { handle, engine }
	}
}

impl Drop for PinnedCallable {
	fn drop(&mut self) {
		self.engine.release(self.handle);
	}
}

#[derive(Clone)]
enum Binding {
	/// Reload `script` and refetch the global before every call.
	Live { script: PathBuf },
	Pinned(Arc<PinnedCallable>),
}

/// A native handle to a script callable.
///
/// Every call runs the full push, call and pop sequence under the engine
/// lock. Clones share the same binding.
#[derive(Clone)]
pub struct Hook {
	id: String,
	signature: Signature,
	engine: SharedEngine,
	binding: Binding,
}

impl fmt::Debug for Hook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hook")
			.field("id", &self.id)
			.field("signature", &self.signature.encode())
			.field("live", &self.is_live())
			.finish_non_exhaustive()
	}
}

impl Hook {
	pub(crate) fn live(id: String, signature: Signature, engine: SharedEngine, script: PathBuf) -> Self {
		Self {
			id,
			signature,
			engine,
			binding: Binding::Live { script },
		}
	}

	pub(crate) fn pinned(id: String, signature: Signature, engine: SharedEngine, pinned: Arc<PinnedCallable>) -> Self {
		Self {
			id,
			signature,
			engine,
			binding: Binding::Pinned(pinned),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	/// True for hooks that reload the script on every call.
	pub fn is_live(&self) -> bool {
		matches!(self.binding, Binding::Live { .. })
	}

	/// Calls the bound function, returning one value per signature output.
	pub fn call(&self, args: &[Value]) -> Result<Vec<Value>> {
		let mut engine = self.engine.lock();
		let target = self.target(&mut *engine)?;
		Ok(call(&mut *engine, target, &self.signature, args)?)
	}

	/// Calls the bound function, writing results through `outs`.
	pub fn call_into(&self, args: &[Value], outs: &mut [OutSlot<'_>]) -> Result<()> {
		let mut engine = self.engine.lock();
		let target = self.target(&mut *engine)?;
		Ok(call_into(&mut *engine, target, &self.signature, args, outs)?)
	}

	/// Calls the bound function over raw pointers.
	///
	/// # Safety
	///
	/// Same contract as [`hotparam_invocation::call_raw`]: every pointer must
	/// be valid for its stated length and outputs must not alias.
	pub unsafe fn call_raw(&self, args: &[RawArg<'_>], outs: &[RawOut]) -> Result<()> {
		let mut engine = self.engine.lock();
		let target = self.target(&mut *engine)?;
		// SAFETY: forwarded from this function's contract.
		Ok(unsafe { call_raw(&mut *engine, target, &self.signature, args, outs) }?)
	}

	fn target(&self, engine: &mut dyn hotparam_runtime::Engine) -> Result<Target<'_>> {
		match &self.binding {
			Binding::Live { script } => {
				engine.load_script(script)?;
				Ok(Target::Named(&self.id))
			}
			Binding::Pinned(pinned) => Ok(Target::Pinned {
				name: &self.id,
				handle: pinned.handle,
			}),
		}
	}
}
