use std::fmt;

use hotparam_primitives::ScalarKind;
use hotparam_signature::Signature;

/// Number of dimensions of an array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
	One = 1,
	Two = 2,
	Three = 3,
}

impl Rank {
	pub const fn get(self) -> usize {
		self as usize
	}

	pub const fn from_usize(rank: usize) -> Option<Self> {
		match rank {
			1 => Some(Rank::One),
			2 => Some(Rank::Two),
			3 => Some(Rank::Three),
			_ => None,
		}
	}
}

/// Identity of a parameter's native shape, compared for conflict detection.
///
/// Array tags carry element type and rank but not dimensions; dimensions are
/// part of the registered default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
	Scalar(ScalarKind),
	Array { element: ScalarKind, rank: Rank },
	Callable(Signature),
}

impl TypeTag {
	pub const fn array(element: ScalarKind, rank: Rank) -> Self {
		TypeTag::Array { element, rank }
	}

	pub fn is_callable(&self) -> bool {
		matches!(self, TypeTag::Callable(_))
	}
}

impl fmt::Display for TypeTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypeTag::Scalar(kind) => write!(f, "{kind}"),
			TypeTag::Array { element, rank } => {
				write!(f, "{element}")?;
				for _ in 0..rank.get() {
					f.write_str("[]")?;
				}
				Ok(())
			}
			TypeTag::Callable(signature) => write!(f, "function({signature})"),
		}
	}
}
