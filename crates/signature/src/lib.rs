//! Compact call signatures for script callables.
//!
//! A signature lists the primitive types a callable takes and returns:
//!
//! | token | type |
//! |---|---|
//! | `i` | int |
//! | `d` | double |
//! | `b` | bool |
//! | `s` | string |
//! | `a` + token | array of that primitive |
//! | `>` | separates inputs from outputs |
//!
//! `"ii>i"` takes two ints and returns one; `"ad"` takes an array of doubles
//! and returns nothing. Arrays of arrays are not representable.

mod derive;

use std::fmt;
use std::str::FromStr;

pub use derive::{NativeReturn, NativeShape, NativeSignature, signature_of, signature_of_val};
use hotparam_primitives::ScalarKind;

const ARRAY_PREFIX: char = 'a';
const SEPARATOR: char = '>';

/// One element of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigType {
	Scalar(ScalarKind),
	/// A flat array of one primitive kind.
	Array(ScalarKind),
}

impl SigType {
	/// The primitive kind of this element, or of its items for arrays.
	pub const fn kind(self) -> ScalarKind {
		match self {
			SigType::Scalar(kind) | SigType::Array(kind) => kind,
		}
	}

	pub const fn is_array(self) -> bool {
		matches!(self, SigType::Array(_))
	}

	fn write_token(self, out: &mut String) {
		if self.is_array() {
			out.push(ARRAY_PREFIX);
		}
		out.push(self.kind().token());
	}
}

impl fmt::Display for SigType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SigType::Scalar(kind) => write!(f, "{kind}"),
			SigType::Array(kind) => write!(f, "array of {kind}"),
		}
	}
}

/// Ordered input and output types of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
	inputs: Vec<SigType>,
	outputs: Vec<SigType>,
}

impl Signature {
	pub fn new(inputs: Vec<SigType>, outputs: Vec<SigType>) -> Self {
		Self { inputs, outputs }
	}

	/// A callable with no inputs and no outputs.
	pub fn procedure() -> Self {
		Self::default()
	}

	pub fn inputs(&self) -> &[SigType] {
		&self.inputs
	}

	pub fn outputs(&self) -> &[SigType] {
		&self.outputs
	}

	/// Parses a signature string.
	///
	/// # Errors
	///
	/// Returns [`SignatureError`] naming the offending character and its
	/// position for unknown tokens, an `a` prefix with no primitive after it,
	/// an array of arrays, more than one `>`, or a `>` with no outputs after it.
	pub fn parse(text: &str) -> Result<Self, SignatureError> {
		let mut inputs = Vec::new();
		let mut outputs = Vec::new();
		let mut separator = None;
		let mut array_at = None;

		for (position, ch) in text.chars().enumerate() {
			if ch == SEPARATOR {
				if let Some(prefix) = array_at {
					return Err(SignatureError::DanglingArray { position: prefix });
				}
				if separator.is_some() {
					return Err(SignatureError::MultipleSeparators { position });
				}
				separator = Some(position);
				continue;
			}
			if ch == ARRAY_PREFIX {
				if array_at.is_some() {
					return Err(SignatureError::NestedArray { position });
				}
				array_at = Some(position);
				continue;
			}
			let Some(kind) = ScalarKind::from_token(ch) else {
				return Err(SignatureError::UnknownToken { ch, position });
			};
			let ty = match array_at.take() {
				Some(_) => SigType::Array(kind),
				None => SigType::Scalar(kind),
			};
			if separator.is_some() {
				outputs.push(ty);
			} else {
				inputs.push(ty);
			}
		}

		if let Some(prefix) = array_at {
			return Err(SignatureError::DanglingArray { position: prefix });
		}
		if let Some(position) = separator
			&& outputs.is_empty()
		{
			return Err(SignatureError::EmptyOutputs { position });
		}
		Ok(Self { inputs, outputs })
	}

	/// Encodes this signature back into its string form.
	pub fn encode(&self) -> String {
		let mut out = String::with_capacity(2 * (self.inputs.len() + self.outputs.len()) + 1);
		for ty in &self.inputs {
			ty.write_token(&mut out);
		}
		if !self.outputs.is_empty() {
			out.push(SEPARATOR);
			for ty in &self.outputs {
				ty.write_token(&mut out);
			}
		}
		out
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.encode())
	}
}

impl FromStr for Signature {
	type Err = SignatureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

/// Signature string syntax errors and derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
	#[error("unknown signature token '{ch}' at position {position}")]
	UnknownToken { ch: char, position: usize },
	#[error("array prefix 'a' at position {position} is not followed by a primitive token")]
	DanglingArray { position: usize },
	#[error("nested array at position {position}: arrays of arrays are not supported")]
	NestedArray { position: usize },
	#[error("second '>' at position {position}: a signature has one input/output separator")]
	MultipleSeparators { position: usize },
	#[error("'>' at position {position} is not followed by any output type")]
	EmptyOutputs { position: usize },
	#[error("cannot derive signature element {position} from native type `{type_name}`; supply an explicit signature string")]
	Ambiguous { position: usize, type_name: &'static str },
}
