use std::path::PathBuf;

use hotparam_invocation::MarshalError;
use hotparam_registry::RegistryError;
use hotparam_runtime::{EngineError, ScriptLoadError};
use hotparam_signature::SignatureError;

/// Errors surfaced by [`ConfigReader`](crate::ConfigReader) and [`Hook`](crate::Hook).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error(transparent)]
	Registry(#[from] RegistryError),
	#[error(transparent)]
	Signature(#[from] SignatureError),
	#[error(transparent)]
	Call(#[from] MarshalError),
	#[error(transparent)]
	ScriptLoad(#[from] ScriptLoadError),
	#[error(transparent)]
	Engine(#[from] EngineError),
	/// The script does not assign the parameter at all.
	#[error("parameter '{id}' is not defined by the script")]
	Missing { id: String },
	#[error("parameter '{id}' should be {expected}, found {actual}")]
	ValueType { id: String, expected: String, actual: String },
	#[error("parameter '{id}' has dimensions {actual:?}, expected {expected:?}")]
	ShapeMismatch { id: String, expected: Vec<usize>, actual: Vec<usize> },
	#[error("output buffer for parameter '{id}' is null")]
	NullBuffer { id: String },
	#[error("failed to write script {}: {source}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to read settings {}: {source}", path.display())]
	SettingsRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse settings: {0}")]
	Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
