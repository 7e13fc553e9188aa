use crate::ScalarKind;

/// A dynamically typed value as seen on the engine side of the boundary.
///
/// Tables read back from the engine become [`Value::List`] when they are
/// sequences; functions and other engine-owned objects are opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Nil,
	Int(i64),
	Double(f64),
	Bool(bool),
	String(String),
	List(Vec<Value>),
	/// An invocable engine object. The object itself stays inside the engine.
	Function,
	/// Any other engine object, carrying the engine's type name.
	Foreign(&'static str),
}

impl Value {
	/// Returns the type name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Nil => "nil",
			Value::Int(_) => "int",
			Value::Double(_) => "double",
			Value::Bool(_) => "bool",
			Value::String(_) => "string",
			Value::List(_) => "array",
			Value::Function => "function",
			Value::Foreign(name) => name,
		}
	}

	/// Returns the scalar kind of this value, if it is a scalar.
	pub fn kind(&self) -> Option<ScalarKind> {
		match self {
			Value::Int(_) => Some(ScalarKind::Int),
			Value::Double(_) => Some(ScalarKind::Double),
			Value::Bool(_) => Some(ScalarKind::Bool),
			Value::String(_) => Some(ScalarKind::String),
			_ => None,
		}
	}

	pub fn is_nil(&self) -> bool {
		matches!(self, Value::Nil)
	}

	/// Returns the integer value, accepting doubles with no fractional part.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(v) => Some(*v),
			Value::Double(v) => integral(*v),
			_ => None,
		}
	}

	/// Returns the numeric value as a double, widening integers.
	pub fn as_double(&self) -> Option<f64> {
		match self {
			Value::Double(v) => Some(*v),
			Value::Int(v) => Some(*v as f64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	/// Converts this value to `kind`, applying the numeric coercions the
	/// engine's number model allows (int to double, integral double to int).
	///
	/// Strings and booleans are never coerced.
	pub fn coerce_to(&self, kind: ScalarKind) -> Option<Value> {
		match kind {
			ScalarKind::Int => self.as_int().map(Value::Int),
			ScalarKind::Double => self.as_double().map(Value::Double),
			ScalarKind::Bool => self.as_bool().map(Value::Bool),
			ScalarKind::String => self.as_str().map(|s| Value::String(s.to_string())),
		}
	}

	/// Returns true if [`Value::coerce_to`] would succeed for `kind`.
	pub fn fits(&self, kind: ScalarKind) -> bool {
		match kind {
			ScalarKind::Int => self.as_int().is_some(),
			ScalarKind::Double => self.as_double().is_some(),
			ScalarKind::Bool => matches!(self, Value::Bool(_)),
			ScalarKind::String => matches!(self, Value::String(_)),
		}
	}
}

fn integral(v: f64) -> Option<i64> {
	// 2^63 is exactly representable; i64::MAX is not.
	const LIMIT: f64 = 9_223_372_036_854_775_808.0;
	(v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v)).then_some(v as i64)
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Int(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int(v.into())
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Double(v)
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::String(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::String(v.to_string())
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Value::List(items.into_iter().map(Into::into).collect())
	}
}

mod sealed {
	pub trait Sealed {}
	impl Sealed for i64 {}
	impl Sealed for f64 {}
	impl Sealed for bool {}
	impl Sealed for String {}
}

/// A native scalar that has a [`ScalarKind`].
///
/// Sealed: the set of scalar kinds is closed.
pub trait Element: sealed::Sealed + Clone + Sized {
	const KIND: ScalarKind;

	/// Extracts `Self` from a dynamic value, applying numeric coercions.
	fn from_value(value: &Value) -> Option<Self>;

	fn into_value(self) -> Value;
}

impl Element for i64 {
	const KIND: ScalarKind = ScalarKind::Int;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_int()
	}

	fn into_value(self) -> Value {
		Value::Int(self)
	}
}

impl Element for f64 {
	const KIND: ScalarKind = ScalarKind::Double;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_double()
	}

	fn into_value(self) -> Value {
		Value::Double(self)
	}
}

impl Element for bool {
	const KIND: ScalarKind = ScalarKind::Bool;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_bool()
	}

	fn into_value(self) -> Value {
		Value::Bool(self)
	}
}

impl Element for String {
	const KIND: ScalarKind = ScalarKind::String;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_str().map(str::to_string)
	}

	fn into_value(self) -> Value {
		Value::String(self)
	}
}
