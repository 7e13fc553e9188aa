use hotparam_primitives::{IdentifierError, Value, validate_identifier};
use indexmap::IndexMap;
use tracing::debug;

use crate::decl::lua_literal;
use crate::param::{Param, ValueError};
use crate::record::{CallableDecl, ParameterRecord, Payload};
use crate::tag::{Rank, TypeTag};

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAction {
	/// Identifier was new; record inserted.
	InsertedNew,
	/// Identifier existed with the same tag; the first registration stands.
	KeptExisting,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("invalid parameter identifier: {0}")]
	InvalidIdentifier(#[from] IdentifierError),
	#[error("parameter '{id}' is registered as {registered}, not {requested}")]
	TypeConflict { id: String, registered: TypeTag, requested: TypeTag },
	#[error("parameter '{id}' is not registered; register it before reading it")]
	Unregistered { id: String },
	#[error("default for parameter '{id}' does not fit {tag}: {reason}")]
	DefaultMismatch { id: String, tag: TypeTag, reason: String },
}

/// Identifier to record map, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
	records: IndexMap<String, ParameterRecord>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `id` with `tag` and its default.
	///
	/// Registering an identifier again with the same tag keeps the first
	/// record untouched, default and documentation included.
	pub fn register(&mut self, id: &str, tag: TypeTag, default: Payload, doc: &str) -> Result<InsertAction, RegistryError> {
		validate_identifier(id)?;
		if let Some(existing) = self.records.get(id) {
			if existing.tag() != &tag {
				return Err(RegistryError::TypeConflict {
					id: id.to_string(),
					registered: existing.tag().clone(),
					requested: tag,
				});
			}
			return Ok(InsertAction::KeptExisting);
		}

		check_payload(&tag, &default).map_err(|reason| RegistryError::DefaultMismatch {
			id: id.to_string(),
			tag: tag.clone(),
			reason,
		})?;
		debug!(id = id, %tag, "registry.register");
		self.records.insert(id.to_string(), ParameterRecord::new(id.to_string(), tag, doc.to_string(), default));
		Ok(InsertAction::InsertedNew)
	}

	/// Registers a data parameter from a native default.
	pub fn register_param<T: Param>(&mut self, id: &str, default: T, doc: &str) -> Result<InsertAction, RegistryError> {
		let tag = T::type_tag();
		let payload = default.into_payload().map_err(|error| RegistryError::DefaultMismatch {
			id: id.to_string(),
			tag: tag.clone(),
			reason: error.to_string(),
		})?;
		self.register(id, tag, payload, doc)
	}

	/// Registers a callable parameter.
	pub fn register_callable(&mut self, id: &str, decl: CallableDecl, doc: &str) -> Result<InsertAction, RegistryError> {
		self.register(id, TypeTag::Callable(decl.signature().clone()), Payload::Callable(decl), doc)
	}

	/// Returns the record for `id` if it exists with `tag`.
	pub fn lookup(&self, id: &str, tag: &TypeTag) -> Option<&ParameterRecord> {
		self.records.get(id).filter(|record| record.tag() == tag)
	}

	/// Like [`Registry::lookup`], failing if `id` is absent or has another tag.
	pub fn require(&self, id: &str, tag: &TypeTag) -> Result<&ParameterRecord, RegistryError> {
		let record = self.records.get(id).ok_or_else(|| RegistryError::Unregistered { id: id.to_string() })?;
		if record.tag() != tag {
			return Err(RegistryError::TypeConflict {
				id: id.to_string(),
				registered: record.tag().clone(),
				requested: tag.clone(),
			});
		}
		Ok(record)
	}

	pub fn get(&self, id: &str) -> Option<&ParameterRecord> {
		self.records.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.records.contains_key(id)
	}

	/// Records in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &ParameterRecord> {
		self.records.values()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Declaration text of every record, separated by blank lines.
	pub fn declarations(&self) -> String {
		let mut out = String::new();
		for record in self.iter() {
			out.push_str(&record.declaration_text());
			out.push('\n');
		}
		out
	}
}

fn check_payload(tag: &TypeTag, payload: &Payload) -> Result<(), String> {
	match (tag, payload) {
		(TypeTag::Scalar(kind), Payload::Scalar(value)) => {
			if value.kind() != Some(*kind) {
				return Err(format!("expected {kind}, found {}", value.type_name()));
			}
			Ok(())
		}
		(TypeTag::Array { element, rank }, Payload::Array(array)) => {
			if array.dims().len() != rank.get() {
				return Err(format!("expected {} dimensions, found {}", rank.get(), array.dims().len()));
			}
			let dims = measure(array.value(), *element, *rank).map_err(|error| error.to_string())?;
			if dims != array.dims() {
				return Err(ValueError::Shape {
					expected: array.dims().to_vec(),
					actual: dims,
				}
				.to_string());
			}
			if lua_literal(array.value()).is_none() {
				return Err("array holds engine objects".to_string());
			}
			Ok(())
		}
		(TypeTag::Callable(signature), Payload::Callable(decl)) => {
			if decl.signature() != signature {
				return Err(format!("declared signature \"{}\" differs from \"{signature}\"", decl.signature()));
			}
			Ok(())
		}
		(_, payload) => Err(format!("{} payload", payload_kind(payload))),
	}
}

fn payload_kind(payload: &Payload) -> &'static str {
	match payload {
		Payload::Scalar(_) => "scalar",
		Payload::Array(_) => "array",
		Payload::Callable(_) => "callable",
	}
}

/// Dimensions of a rectangular nested list whose leaves are all `element`.
fn measure(value: &Value, element: hotparam_primitives::ScalarKind, rank: Rank) -> Result<Vec<usize>, ValueError> {
	fn walk(value: &Value, element: hotparam_primitives::ScalarKind, depth: usize, dims: &mut Vec<Option<usize>>, rank: usize) -> Result<(), ValueError> {
		if depth == rank {
			if value.kind() != Some(element) {
				return Err(ValueError::Type {
					expected: element.to_string(),
					actual: value.type_name().to_string(),
				});
			}
			return Ok(());
		}
		let items = value.as_list().ok_or_else(|| ValueError::Type {
			expected: "array".to_string(),
			actual: value.type_name().to_string(),
		})?;
		match dims[depth] {
			None => dims[depth] = Some(items.len()),
			Some(len) if len != items.len() => {
				return Err(ValueError::Ragged {
					row: depth,
					expected: vec![len],
					actual: vec![items.len()],
				});
			}
			Some(_) => {}
		}
		items.iter().try_for_each(|item| walk(item, element, depth + 1, dims, rank))
	}

	let mut dims = vec![None; rank.get()];
	walk(value, element, 0, &mut dims, rank.get())?;
	Ok(dims.into_iter().map(|len| len.unwrap_or(0)).collect())
}
