//! Generation of the editable script.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use hotparam_registry::Registry;
use tracing::{debug, info};

use crate::{ConfigError, Result};

pub(crate) const HEADER: &str = "--[[
\tGenerated parameter script.
\tEdit any value or function below and rerun the program to pick up the
\tchange; no recompilation is needed.
--]]

";

/// Full text of a freshly generated script.
pub(crate) fn render(preamble: &[String], registry: &Registry) -> String {
	let mut out = String::from(HEADER);
	for line in preamble {
		out.push_str(line);
		out.push('\n');
	}
	if !preamble.is_empty() {
		out.push('\n');
	}
	out.push_str(&registry.declarations());
	out
}

/// Writes the script at `path` unless a file already exists there.
///
/// Returns `false` if the file existed; it is never modified.
pub(crate) fn write_new(path: &Path, preamble: &[String], registry: &Registry) -> Result<bool> {
	let failure = |source| ConfigError::Write {
		path: path.to_path_buf(),
		source,
	};
	let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
		Ok(file) => file,
		Err(error) if error.kind() == ErrorKind::AlreadyExists => {
			debug!(path = %path.display(), "script.exists");
			return Ok(false);
		}
		Err(error) => return Err(failure(error)),
	};
	file.write_all(render(preamble, registry).as_bytes()).map_err(failure)?;
	info!(path = %path.display(), params = registry.len(), "script.written");
	Ok(true)
}
