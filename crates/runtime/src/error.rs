use std::path::PathBuf;

use crate::CallableHandle;

/// A script failed to read, parse or execute.
///
/// `message` is the engine's diagnostic, unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScriptLoadError {
	pub path: PathBuf,
	pub message: String,
}

/// A popped value did not have the expected type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {actual}")]
pub struct ResultTypeError {
	pub expected: String,
	pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
	/// The engine reported a failure while running script code. Verbatim.
	#[error("{0}")]
	Execution(String),
	#[error("engine stack limit of {limit} slots exceeded")]
	StackExhausted { limit: usize },
	#[error("engine stack holds {available} values, {requested} requested")]
	StackUnderflow { requested: usize, available: usize },
	#[error("callable handle {} is not pinned", .0.raw())]
	Unpinned(CallableHandle),
	#[error("global '{name}' is not invocable")]
	NotInvocable { name: String },
	#[error("cannot convert {type_name} value: {reason}")]
	Conversion { type_name: &'static str, reason: String },
	#[error(transparent)]
	ResultType(#[from] ResultTypeError),
}
