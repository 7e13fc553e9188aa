use std::path::{Path, PathBuf};

use hotparam_runtime::{EngineLimits, MAX_SCRIPT_BYTES, STACK_SLOTS};
use serde::Deserialize;

use crate::{ConfigError, Result};

/// When data reads go back to the script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReloadPolicy {
	/// Reload the script before every data read and every explicit callable read.
	#[default]
	EveryRead,
	/// Read the engine's current state; the host calls `reload` itself.
	Manual,
}

/// Reader configuration, usually loaded from a TOML file.
///
/// ```toml
/// script = "tuning.lua"
/// preamble = ["local util = require('util')"]
/// reload = "manual"
/// stack_limit = 4000
/// max_script_bytes = 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderSettings {
	/// Path of the generated and edited script.
	pub script: PathBuf,
	/// Lines written after the header of a generated script.
	pub preamble: Vec<String>,
	pub reload: ReloadPolicy,
	/// Maximum number of engine stack slots.
	pub stack_limit: usize,
	/// Scripts larger than this are refused.
	pub max_script_bytes: usize,
}

impl Default for ReaderSettings {
	fn default() -> Self {
		Self {
			script: PathBuf::from("config.lua"),
			preamble: Vec::new(),
			reload: ReloadPolicy::EveryRead,
			stack_limit: STACK_SLOTS,
			max_script_bytes: MAX_SCRIPT_BYTES,
		}
	}
}

impl ReaderSettings {
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let source = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsRead {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
		self.script = script.into();
		self
	}

	pub fn with_reload(mut self, reload: ReloadPolicy) -> Self {
		self.reload = reload;
		self
	}

	pub fn engine_limits(&self) -> EngineLimits {
		EngineLimits {
			stack_slots: self.stack_limit,
			max_script_bytes: self.max_script_bytes,
		}
	}
}
