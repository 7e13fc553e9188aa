//! Signature derivation from native Rust function types.
//!
//! Scalars map to their token and owned or borrowed sequences map to the
//! matching array token. Raw pointers and `&mut` scalars can be either an
//! array or an in/out scalar, so they never derive and require an explicit
//! signature string instead.

use hotparam_primitives::ScalarKind;

use crate::{SigType, Signature, SignatureError};

/// A native type that may appear as a callable input or output.
pub trait NativeShape {
	/// The signature element for this type, `None` when the type alone is ambiguous.
	const SIG_TYPE: Option<SigType>;
}

/// The return type of a native callable.
pub trait NativeReturn {
	fn output_types(first_position: usize) -> Result<Vec<SigType>, SignatureError>;
}

/// A native callable whose signature can be derived without a string.
///
/// `Args` is the tuple of argument types and is inferred from the callable,
/// so function pointers and items with elided borrows such as
/// `fn(&[f64]) -> f64` derive the same way owned ones do.
pub trait NativeSignature<Args> {
	fn signature() -> Result<Signature, SignatureError>;
}

/// Derives the signature of native callable type `F`.
///
/// ```
/// use hotparam_signature::signature_of;
///
/// let sig = signature_of::<fn(&[f64], i64) -> f64, _>().unwrap();
/// assert_eq!(sig.encode(), "adi>d");
/// ```
pub fn signature_of<F: NativeSignature<Args>, Args>() -> Result<Signature, SignatureError> {
	F::signature()
}

/// Derives the signature of `callable`, usually a function item.
pub fn signature_of_val<F: NativeSignature<Args>, Args>(_callable: &F) -> Result<Signature, SignatureError> {
	F::signature()
}

fn resolve<T: NativeShape + ?Sized>(position: usize) -> Result<SigType, SignatureError> {
	T::SIG_TYPE.ok_or(SignatureError::Ambiguous {
		position,
		type_name: std::any::type_name::<T>(),
	})
}

macro_rules! scalar_shapes {
	($($ty:ty => $kind:ident),* $(,)?) => {$(
		impl NativeShape for $ty {
			const SIG_TYPE: Option<SigType> = Some(SigType::Scalar(ScalarKind::$kind));
		}
		impl NativeShape for Vec<$ty> {
			const SIG_TYPE: Option<SigType> = Some(SigType::Array(ScalarKind::$kind));
		}
		impl NativeShape for &[$ty] {
			const SIG_TYPE: Option<SigType> = Some(SigType::Array(ScalarKind::$kind));
		}
		impl NativeShape for &mut [$ty] {
			const SIG_TYPE: Option<SigType> = Some(SigType::Array(ScalarKind::$kind));
		}
		impl<const N: usize> NativeShape for [$ty; N] {
			const SIG_TYPE: Option<SigType> = Some(SigType::Array(ScalarKind::$kind));
		}
		impl NativeShape for *const $ty {
			const SIG_TYPE: Option<SigType> = None;
		}
		impl NativeShape for *mut $ty {
			const SIG_TYPE: Option<SigType> = None;
		}
		impl NativeShape for &mut $ty {
			const SIG_TYPE: Option<SigType> = None;
		}
		impl NativeReturn for $ty {
			fn output_types(first_position: usize) -> Result<Vec<SigType>, SignatureError> {
				Ok(vec![resolve::<Self>(first_position)?])
			}
		}
		impl NativeReturn for Vec<$ty> {
			fn output_types(first_position: usize) -> Result<Vec<SigType>, SignatureError> {
				Ok(vec![resolve::<Self>(first_position)?])
			}
		}
	)*};
}

scalar_shapes! {
	i32 => Int,
	i64 => Int,
	u32 => Int,
	f32 => Double,
	f64 => Double,
	bool => Bool,
	String => String,
}

impl NativeShape for &str {
	const SIG_TYPE: Option<SigType> = Some(SigType::Scalar(ScalarKind::String));
}

impl NativeReturn for () {
	fn output_types(_: usize) -> Result<Vec<SigType>, SignatureError> {
		Ok(Vec::new())
	}
}

macro_rules! tuple_returns {
	($(($($name:ident),+)),* $(,)?) => {$(
		impl<$($name: NativeShape),+> NativeReturn for ($($name,)+) {
			fn output_types(first_position: usize) -> Result<Vec<SigType>, SignatureError> {
				let mut position = first_position;
				let mut out = Vec::new();
				$(
					out.push(resolve::<$name>(position)?);
					position += 1;
				)+
				let _ = position;
				Ok(out)
			}
		}
	)*};
}

tuple_returns! {
	(A),
	(A, B),
	(A, B, C),
	(A, B, C, D),
}

macro_rules! fn_signatures {
	($(($($arg:ident),*)),* $(,)?) => {$(
		impl<F, R, $($arg),*> NativeSignature<($($arg,)*)> for F
		where
			F: Fn($($arg),*) -> R,
			R: NativeReturn,
			$($arg: NativeShape,)*
		{
			#[allow(unused_mut, unused_variables)]
			fn signature() -> Result<Signature, SignatureError> {
				let mut position = 0;
				let mut inputs = Vec::new();
				$(
					inputs.push(resolve::<$arg>(position)?);
					position += 1;
				)*
				let outputs = R::output_types(position)?;
				Ok(Signature::new(inputs, outputs))
			}
		}
	)*};
}

fn_signatures! {
	(),
	(A0),
	(A0, A1),
	(A0, A1, A2),
	(A0, A1, A2, A3),
	(A0, A1, A2, A3, A4),
	(A0, A1, A2, A3, A4, A5),
}
