use hotparam_primitives::{Element, ScalarKind, Value};
use hotparam_signature::SigType;

/// A typed, caller-owned location a call result is written to.
#[derive(Debug)]
pub enum OutSlot<'a> {
	Int(&'a mut i64),
	Double(&'a mut f64),
	Bool(&'a mut bool),
	String(&'a mut String),
	IntArray(&'a mut [i64]),
	DoubleArray(&'a mut [f64]),
	BoolArray(&'a mut [bool]),
	StringArray(&'a mut [String]),
}

impl OutSlot<'_> {
	/// The signature element this slot can receive.
	pub fn sig_type(&self) -> SigType {
		match self {
			OutSlot::Int(_) => SigType::Scalar(ScalarKind::Int),
			OutSlot::Double(_) => SigType::Scalar(ScalarKind::Double),
			OutSlot::Bool(_) => SigType::Scalar(ScalarKind::Bool),
			OutSlot::String(_) => SigType::Scalar(ScalarKind::String),
			OutSlot::IntArray(_) => SigType::Array(ScalarKind::Int),
			OutSlot::DoubleArray(_) => SigType::Array(ScalarKind::Double),
			OutSlot::BoolArray(_) => SigType::Array(ScalarKind::Bool),
			OutSlot::StringArray(_) => SigType::Array(ScalarKind::String),
		}
	}

	/// The fixed length of an array slot.
	pub fn array_len(&self) -> Option<usize> {
		match self {
			OutSlot::IntArray(items) => Some(items.len()),
			OutSlot::DoubleArray(items) => Some(items.len()),
			OutSlot::BoolArray(items) => Some(items.len()),
			OutSlot::StringArray(items) => Some(items.len()),
			_ => None,
		}
	}

	/// Writes an already type checked result.
	pub(crate) fn write(&mut self, value: Value) {
		match self {
			OutSlot::Int(out) => assign(&mut **out, &value),
			OutSlot::Double(out) => assign(&mut **out, &value),
			OutSlot::Bool(out) => assign(&mut **out, &value),
			OutSlot::String(out) => assign(&mut **out, &value),
			OutSlot::IntArray(out) => assign_all(&mut **out, &value),
			OutSlot::DoubleArray(out) => assign_all(&mut **out, &value),
			OutSlot::BoolArray(out) => assign_all(&mut **out, &value),
			OutSlot::StringArray(out) => assign_all(&mut **out, &value),
		}
	}
}

fn assign<T: Element>(out: &mut T, value: &Value) {
	if let Some(v) = T::from_value(value) {
		*out = v;
	}
}

fn assign_all<T: Element>(out: &mut [T], value: &Value) {
	let Some(items) = value.as_list() else {
		return;
	};
	for (slot, item) in out.iter_mut().zip(items) {
		assign(slot, item);
	}
}
