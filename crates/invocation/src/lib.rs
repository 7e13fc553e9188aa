//! Marshalling protocol for script callables.
//!
//! One generic invoker drives every call, whatever its arity: resolve the
//! target, push each argument in signature order, call with
//! `(inputs, outputs)` counts, then pop and type check every result. The
//! signature is a runtime value, so no per-arity code exists.
//!
//! Three surfaces share the algorithm:
//! - [`call`] takes and returns [`Value`]s,
//! - [`call_into`] writes results through typed [`OutSlot`]s,
//! - [`call_raw`] takes raw pointers plus explicit lengths (unsafe).

mod raw;
mod slot;

use hotparam_primitives::Value;
use hotparam_runtime::{CallableHandle, Engine, EngineError};
use hotparam_signature::{SigType, Signature};
pub use raw::{RawArg, RawOut, call_raw};
pub use slot::OutSlot;
use tracing::debug;

/// What to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
	/// The global `name`, resolved when the call starts.
	Named(&'a str),
	/// A callable pinned earlier. `name` is only used for diagnostics.
	Pinned { name: &'a str, handle: CallableHandle },
}

impl<'a> Target<'a> {
	pub fn name(&self) -> &'a str {
		match self {
			Target::Named(name) | Target::Pinned { name, .. } => name,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
	#[error("callable '{name}' is not defined or is not invocable")]
	CallableNotFound { name: String },
	#[error("cannot push argument {position} of '{name}': {reason}")]
	ArgumentPush { name: String, position: usize, reason: String },
	/// `message` is the engine's diagnostic, unmodified.
	#[error("call to '{name}' failed: {message}")]
	CallExecution { name: String, message: String },
	#[error("result {position} of '{name}': expected {expected}, found {actual}")]
	ResultType {
		name: String,
		position: usize,
		expected: String,
		actual: String,
	},
	#[error("'{name}' returns {expected} values but {actual} output slots were given")]
	SlotCount { name: String, expected: usize, actual: usize },
	#[error("output slot {position} of '{name}' cannot hold {expected}")]
	SlotMismatch { name: String, position: usize, expected: SigType },
	#[error("output {position} of '{name}' is a null pointer")]
	NullOutput { name: String, position: usize },
	#[error(transparent)]
	Engine(#[from] EngineError),
}

/// Calls `target` with `args`, returning one value per signature output.
///
/// Array results are returned as [`Value::List`].
pub fn call(engine: &mut dyn Engine, target: Target<'_>, signature: &Signature, args: &[Value]) -> Result<Vec<Value>, MarshalError> {
	let lengths = vec![None; signature.outputs().len()];
	marshal(engine, target, signature, args, &lengths)
}

/// Calls `target`, writing each result through the matching slot.
///
/// Array slots fix the expected result length; a result of any other
/// length is a [`MarshalError::ResultType`]. Slots are only written once
/// every result has been checked.
pub fn call_into(engine: &mut dyn Engine, target: Target<'_>, signature: &Signature, args: &[Value], outs: &mut [OutSlot<'_>]) -> Result<(), MarshalError> {
	let name = target.name();
	if outs.len() != signature.outputs().len() {
		return Err(MarshalError::SlotCount {
			name: name.to_string(),
			expected: signature.outputs().len(),
			actual: outs.len(),
		});
	}
	for (position, (slot, expected)) in outs.iter().zip(signature.outputs()).enumerate() {
		if slot.sig_type() != *expected {
			return Err(MarshalError::SlotMismatch {
				name: name.to_string(),
				position,
				expected: *expected,
			});
		}
	}

	let lengths: Vec<Option<usize>> = outs.iter().map(OutSlot::array_len).collect();
	let values = marshal(engine, target, signature, args, &lengths)?;
	for (slot, value) in outs.iter_mut().zip(values) {
		slot.write(value);
	}
	Ok(())
}

fn marshal(engine: &mut dyn Engine, target: Target<'_>, signature: &Signature, args: &[Value], lengths: &[Option<usize>]) -> Result<Vec<Value>, MarshalError> {
	let name = target.name();
	debug!(callable = name, signature = %signature, "invocation.call");

	if let Target::Named(name) = target
		&& !engine.is_invocable(name)?
	{
		return Err(MarshalError::CallableNotFound { name: name.to_string() });
	}

	let base = engine.stack_len();
	let result = push_call_pop(engine, target, signature, args, lengths);
	if result.is_err() {
		engine.truncate_stack(base);
	}
	result
}

fn push_call_pop(engine: &mut dyn Engine, target: Target<'_>, signature: &Signature, args: &[Value], lengths: &[Option<usize>]) -> Result<Vec<Value>, MarshalError> {
	let name = target.name();
	let push_error = |position: usize, reason: String| MarshalError::ArgumentPush {
		name: name.to_string(),
		position,
		reason,
	};

	let inputs = signature.inputs();
	if args.len() != inputs.len() {
		return Err(push_error(args.len().min(inputs.len()), format!("expected {} arguments, got {}", inputs.len(), args.len())));
	}
	engine.ensure_stack(inputs.len()).map_err(|error| push_error(0, error.to_string()))?;

	for (position, (ty, arg)) in inputs.iter().zip(args).enumerate() {
		match ty {
			SigType::Scalar(kind) => {
				let value = arg.coerce_to(*kind).ok_or_else(|| push_error(position, format!("expected {kind}, found {}", arg.type_name())))?;
				engine.push_scalar(&value).map_err(|error| push_error(position, error.to_string()))?;
			}
			SigType::Array(kind) => {
				let items = arg.as_list().ok_or_else(|| push_error(position, format!("expected {ty}, found {}", arg.type_name())))?;
				let items = items
					.iter()
					.map(|item| item.coerce_to(*kind).ok_or_else(|| push_error(position, format!("expected {ty}, found array containing {}", item.type_name()))))
					.collect::<Result<Vec<_>, _>>()?;
				engine.push_array(&items).map_err(|error| push_error(position, error.to_string()))?;
			}
		}
	}

	let outputs = signature.outputs();
	let called = match target {
		Target::Named(name) => engine.call_named(name, inputs.len(), outputs.len()),
		Target::Pinned { handle, .. } => engine.call_pinned(handle, inputs.len(), outputs.len()),
	};
	called.map_err(|error| match error {
		EngineError::Execution(message) => MarshalError::CallExecution { name: name.to_string(), message },
		EngineError::NotInvocable { .. } | EngineError::Unpinned(_) => MarshalError::CallableNotFound { name: name.to_string() },
		other => MarshalError::Engine(other),
	})?;

	// Results come off the stack last first.
	let mut results = Vec::with_capacity(outputs.len());
	for position in (0..outputs.len()).rev() {
		let popped = match outputs[position] {
			SigType::Scalar(kind) => engine.pop_scalar(kind),
			SigType::Array(kind) => engine.pop_array(kind, lengths.get(position).copied().flatten()).map(Value::List),
		};
		let value = popped.map_err(|error| match error {
			EngineError::ResultType(mismatch) => MarshalError::ResultType {
				name: name.to_string(),
				position,
				expected: mismatch.expected,
				actual: mismatch.actual,
			},
			other => MarshalError::Engine(other),
		})?;
		results.push(value);
	}
	results.reverse();
	Ok(results)
}
