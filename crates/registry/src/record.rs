use hotparam_primitives::Value;
use hotparam_signature::Signature;

use crate::decl::{doc_block, function_header, lua_literal};
use crate::tag::TypeTag;

/// Default of an array parameter: the nested list and its fixed dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDefault {
	dims: Vec<usize>,
	value: Value,
}

impl ArrayDefault {
	/// `value` is a nested [`Value::List`]; registration checks it against `dims`.
	pub fn new(dims: Vec<usize>, value: Value) -> Self {
		Self { dims, value }
	}

	pub fn dims(&self) -> &[usize] {
		&self.dims
	}

	pub fn value(&self) -> &Value {
		&self.value
	}
}

/// A callable declaration and the body written for it when the script is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableDecl {
	signature: Signature,
	body: Option<String>,
}

impl CallableDecl {
	pub fn new(signature: Signature) -> Self {
		Self { signature, body: None }
	}

	/// Default Lua body, arguments are in scope as `arg0`, `arg1`, ...
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn body(&self) -> Option<&str> {
		self.body.as_deref()
	}
}

/// Registered default of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Scalar(Value),
	Array(ArrayDefault),
	Callable(CallableDecl),
}

/// One registered parameter. Immutable after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
	id: String,
	tag: TypeTag,
	doc: String,
	payload: Payload,
}

impl ParameterRecord {
	pub(crate) fn new(id: String, tag: TypeTag, doc: String, payload: Payload) -> Self {
		Self { id, tag, doc, payload }
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn tag(&self) -> &TypeTag {
		&self.tag
	}

	pub fn doc(&self) -> &str {
		&self.doc
	}

	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	/// Registered dimensions for arrays, empty otherwise.
	pub fn dims(&self) -> &[usize] {
		match &self.payload {
			Payload::Array(array) => array.dims(),
			_ => &[],
		}
	}

	/// Lua source declaring this parameter with its default.
	pub fn declaration_text(&self) -> String {
		let mut out = doc_block(&self.doc);
		match &self.payload {
			Payload::Scalar(value) => push_assignment(&mut out, &self.id, value),
			Payload::Array(array) => push_assignment(&mut out, &self.id, array.value()),
			Payload::Callable(decl) => {
				out.push_str(&function_header(&self.id, decl.signature().inputs().len()));
				match decl.body() {
					Some(body) => {
						for line in body.lines() {
							out.push('\t');
							out.push_str(line);
							out.push('\n');
						}
					}
					None => {
						out.push_str(&format!("\t-- Define '{}' here. Signature: \"{}\"\n", self.id, decl.signature()));
					}
				}
				out.push_str("end\n");
			}
		}
		out
	}
}

fn push_assignment(out: &mut String, id: &str, value: &Value) {
	// Payloads are validated on registration, so every value has a literal.
	let literal = lua_literal(value).unwrap_or_else(|| "nil".to_string());
	out.push_str(id);
	out.push_str(" = ");
	out.push_str(&literal);
	out.push('\n');
}
