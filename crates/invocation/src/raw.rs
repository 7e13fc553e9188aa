//! Raw-pointer calling convention.
//!
//! Arrays cross this surface as a pointer plus an explicit length. Nothing
//! here infers a size from a pointer or checks that a buffer is as long as
//! its caller claims; that is the caller's contract.

use hotparam_primitives::{Element, Value};
use hotparam_signature::Signature;

use crate::{MarshalError, OutSlot, Target, call_into};

/// An input argument in raw form.
#[derive(Debug, Clone, Copy)]
pub enum RawArg<'a> {
	Int(i64),
	Double(f64),
	Bool(bool),
	String(&'a str),
	IntArray { ptr: *const i64, len: usize },
	DoubleArray { ptr: *const f64, len: usize },
	BoolArray { ptr: *const bool, len: usize },
	StringArray { ptr: *const String, len: usize },
}

/// An output location in raw form.
#[derive(Debug, Clone, Copy)]
pub enum RawOut {
	Int(*mut i64),
	Double(*mut f64),
	Bool(*mut bool),
	String(*mut String),
	IntArray { ptr: *mut i64, len: usize },
	DoubleArray { ptr: *mut f64, len: usize },
	BoolArray { ptr: *mut bool, len: usize },
	StringArray { ptr: *mut String, len: usize },
}

/// [`call_into`] over raw pointers.
///
/// # Safety
///
/// Every array pointer must be valid for reads (inputs) or writes (outputs)
/// of `len` initialized elements, and every scalar output pointer must be
/// valid for a write. Output locations must not alias each other or any
/// input for the duration of the call. Null is accepted only for `len == 0`.
pub unsafe fn call_raw(engine: &mut dyn hotparam_runtime::Engine, target: Target<'_>, signature: &Signature, args: &[RawArg<'_>], outs: &[RawOut]) -> Result<(), MarshalError> {
	let name = target.name();
	let null = |position: usize| MarshalError::ArgumentPush {
		name: name.to_string(),
		position,
		reason: "null pointer with non-zero length".to_string(),
	};

	let mut values = Vec::with_capacity(args.len());
	for (position, arg) in args.iter().enumerate() {
		// SAFETY: upheld by the caller per this function's contract.
		let value = unsafe {
			match *arg {
				RawArg::Int(v) => Value::Int(v),
				RawArg::Double(v) => Value::Double(v),
				RawArg::Bool(v) => Value::Bool(v),
				RawArg::String(v) => Value::from(v),
				RawArg::IntArray { ptr, len } => list(ptr, len).ok_or_else(|| null(position))?,
				RawArg::DoubleArray { ptr, len } => list(ptr, len).ok_or_else(|| null(position))?,
				RawArg::BoolArray { ptr, len } => list(ptr, len).ok_or_else(|| null(position))?,
				RawArg::StringArray { ptr, len } => list(ptr, len).ok_or_else(|| null(position))?,
			}
		};
		values.push(value);
	}

	let mut slots = Vec::with_capacity(outs.len());
	for (position, out) in outs.iter().enumerate() {
		let null_out = || MarshalError::NullOutput {
			name: name.to_string(),
			position,
		};
		// SAFETY: upheld by the caller per this function's contract.
		let slot = unsafe {
			match *out {
				RawOut::Int(ptr) => OutSlot::Int(ptr.as_mut().ok_or_else(null_out)?),
				RawOut::Double(ptr) => OutSlot::Double(ptr.as_mut().ok_or_else(null_out)?),
				RawOut::Bool(ptr) => OutSlot::Bool(ptr.as_mut().ok_or_else(null_out)?),
				RawOut::String(ptr) => OutSlot::String(ptr.as_mut().ok_or_else(null_out)?),
				RawOut::IntArray { ptr, len } => OutSlot::IntArray(slice_mut(ptr, len).ok_or_else(null_out)?),
				RawOut::DoubleArray { ptr, len } => OutSlot::DoubleArray(slice_mut(ptr, len).ok_or_else(null_out)?),
				RawOut::BoolArray { ptr, len } => OutSlot::BoolArray(slice_mut(ptr, len).ok_or_else(null_out)?),
				RawOut::StringArray { ptr, len } => OutSlot::StringArray(slice_mut(ptr, len).ok_or_else(null_out)?),
			}
		};
		slots.push(slot);
	}

	call_into(engine, target, signature, &values, &mut slots)
}

unsafe fn list<T: Element>(ptr: *const T, len: usize) -> Option<Value> {
	if len == 0 {
		return Some(Value::List(Vec::new()));
	}
	if ptr.is_null() {
		return None;
	}
	// SAFETY: non-null, and valid for `len` reads per the caller's contract.
	let items = unsafe { std::slice::from_raw_parts(ptr, len) };
	Some(Value::List(items.iter().cloned().map(Element::into_value).collect()))
}

unsafe fn slice_mut<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
	if len == 0 {
		return Some(&mut []);
	}
	if ptr.is_null() {
		return None;
	}
	// SAFETY: non-null, and valid for `len` writes per the caller's contract.
	Some(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}
