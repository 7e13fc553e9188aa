use std::fmt;

/// The primitive types that can cross the host/engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
	/// 64-bit signed integer.
	Int,
	/// 64-bit float.
	Double,
	/// Boolean.
	Bool,
	/// UTF-8 string.
	String,
}

impl ScalarKind {
	pub const ALL: [ScalarKind; 4] = [ScalarKind::Int, ScalarKind::Double, ScalarKind::Bool, ScalarKind::String];

	/// Returns the single-character signature token for this kind.
	pub const fn token(self) -> char {
		match self {
			ScalarKind::Int => 'i',
			ScalarKind::Double => 'd',
			ScalarKind::Bool => 'b',
			ScalarKind::String => 's',
		}
	}

	/// Maps a signature token back to its kind.
	pub const fn from_token(token: char) -> Option<Self> {
		match token {
			'i' => Some(ScalarKind::Int),
			'd' => Some(ScalarKind::Double),
			'b' => Some(ScalarKind::Bool),
			's' => Some(ScalarKind::String),
			_ => None,
		}
	}

	/// Human readable name used in error messages.
	pub const fn name(self) -> &'static str {
		match self {
			ScalarKind::Int => "int",
			ScalarKind::Double => "double",
			ScalarKind::Bool => "bool",
			ScalarKind::String => "string",
		}
	}
}

impl fmt::Display for ScalarKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
