//! Native shapes that can be registered and read.

use hotparam_primitives::{Element, Value};

use crate::record::{ArrayDefault, Payload};
use crate::tag::{Rank, TypeTag};

/// A value did not have the shape a parameter needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
	#[error("expected {expected}, found {actual}")]
	Type { expected: String, actual: String },
	#[error("ragged array: row {row} has dimensions {actual:?}, expected {expected:?}")]
	Ragged { row: usize, expected: Vec<usize>, actual: Vec<usize> },
	#[error("expected dimensions {expected:?}, found {actual:?}")]
	Shape { expected: Vec<usize>, actual: Vec<usize> },
}

/// A native type usable as a data parameter.
///
/// Implemented for `i64`, `f64`, `bool` and `String`; for `Vec`, nested
/// `Vec` and fixed-size arrays of those up to rank 3.
pub trait Param: Sized {
	fn type_tag() -> TypeTag;

	/// Builds the registered default. Fails on ragged nested vectors.
	fn into_payload(self) -> Result<Payload, ValueError>;

	/// Extracts `Self` from a value read out of the engine.
	fn from_value(value: &Value) -> Result<Self, ValueError>;

	/// Dimensions of this value, empty for scalars.
	fn dims(&self) -> Vec<usize> {
		Vec::new()
	}
}

fn type_error(expected: impl ToString, value: &Value) -> ValueError {
	ValueError::Type {
		expected: expected.to_string(),
		actual: value.type_name().to_string(),
	}
}

fn scalar<T: Element>(value: &Value) -> Result<T, ValueError> {
	T::from_value(value).ok_or_else(|| type_error(T::KIND, value))
}

fn list<'v>(value: &'v Value, rank: Rank, element: hotparam_primitives::ScalarKind) -> Result<&'v [Value], ValueError> {
	value.as_list().ok_or_else(|| type_error(TypeTag::array(element, rank), value))
}

fn rows1<T: Element>(value: &Value) -> Result<Vec<T>, ValueError> {
	list(value, Rank::One, T::KIND)?.iter().map(scalar).collect()
}

fn rows2<T: Element>(value: &Value) -> Result<Vec<Vec<T>>, ValueError> {
	let rows = list(value, Rank::Two, T::KIND)?.iter().map(rows1).collect::<Result<Vec<_>, _>>()?;
	rectangular(&rows, |row| vec![row.len()])?;
	Ok(rows)
}

fn rows3<T: Element>(value: &Value) -> Result<Vec<Vec<Vec<T>>>, ValueError> {
	let planes = list(value, Rank::Three, T::KIND)?.iter().map(rows2).collect::<Result<Vec<_>, _>>()?;
	rectangular(&planes, |plane| dims2(plane))?;
	Ok(planes)
}

fn dims2<T>(rows: &[Vec<T>]) -> Vec<usize> {
	vec![rows.len(), rows.first().map_or(0, Vec::len)]
}

fn dims3<T>(planes: &[Vec<Vec<T>>]) -> Vec<usize> {
	let mut dims = vec![planes.len()];
	dims.extend(planes.first().map_or_else(|| vec![0, 0], |plane| dims2(plane)));
	dims
}

/// Checks every row has the shape of the first.
fn rectangular<R>(rows: &[R], shape: impl Fn(&R) -> Vec<usize>) -> Result<(), ValueError> {
	let Some(first) = rows.first().map(&shape) else {
		return Ok(());
	};
	for (row, item) in rows.iter().enumerate().skip(1) {
		let actual = shape(item);
		if actual != first {
			return Err(ValueError::Ragged { row, expected: first, actual });
		}
	}
	Ok(())
}

fn fixed<T, const N: usize>(items: Vec<T>, dims: impl FnOnce() -> (Vec<usize>, Vec<usize>)) -> Result<[T; N], ValueError> {
	<[T; N]>::try_from(items).map_err(|_| {
		let (expected, actual) = dims();
		ValueError::Shape { expected, actual }
	})
}

fn array_payload(dims: Vec<usize>, value: Value) -> Payload {
	Payload::Array(ArrayDefault::new(dims, value))
}

fn to_list<T: Element>(items: Vec<T>) -> Value {
	Value::List(items.into_iter().map(Element::into_value).collect())
}

fn to_list2<T: Element>(rows: Vec<Vec<T>>) -> Value {
	Value::List(rows.into_iter().map(to_list).collect())
}

fn to_list3<T: Element>(planes: Vec<Vec<Vec<T>>>) -> Value {
	Value::List(planes.into_iter().map(to_list2).collect())
}

fn vec2_payload<T: Element>(rows: Vec<Vec<T>>) -> Result<Payload, ValueError> {
	rectangular(&rows, |row| vec![row.len()])?;
	Ok(array_payload(dims2(&rows), to_list2(rows)))
}

fn vec3_payload<T: Element>(planes: Vec<Vec<Vec<T>>>) -> Result<Payload, ValueError> {
	for plane in &planes {
		rectangular(plane, |row| vec![row.len()])?;
	}
	rectangular(&planes, |plane| dims2(plane))?;
	Ok(array_payload(dims3(&planes), to_list3(planes)))
}

fn rows_of_fixed<T: Element, const C: usize>(rows: Vec<Vec<T>>) -> Result<Vec<[T; C]>, ValueError> {
	let dims = dims2(&rows);
	rows.into_iter()
		.map(|row| fixed::<T, C>(row, || (vec![dims[0], C], dims.clone())))
		.collect()
}

macro_rules! element_params {
	($($ty:ty),* $(,)?) => {$(
		impl Param for $ty {
			fn type_tag() -> TypeTag {
				TypeTag::Scalar(<$ty as Element>::KIND)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				Ok(Payload::Scalar(self.into_value()))
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				scalar(value)
			}
		}

		impl Param for Vec<$ty> {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::One)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				Ok(array_payload(vec![self.len()], to_list(self)))
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				rows1(value)
			}

			fn dims(&self) -> Vec<usize> {
				vec![self.len()]
			}
		}

		impl Param for Vec<Vec<$ty>> {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::Two)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				vec2_payload(self)
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				rows2(value)
			}

			fn dims(&self) -> Vec<usize> {
				dims2(self)
			}
		}

		impl Param for Vec<Vec<Vec<$ty>>> {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::Three)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				vec3_payload(self)
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				rows3(value)
			}

			fn dims(&self) -> Vec<usize> {
				dims3(self)
			}
		}

		impl<const N: usize> Param for [$ty; N] {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::One)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				Vec::from(self).into_payload()
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				let items = rows1::<$ty>(value)?;
				let len = items.len();
				fixed(items, || (vec![N], vec![len]))
			}

			fn dims(&self) -> Vec<usize> {
				vec![N]
			}
		}

		impl<const R: usize, const C: usize> Param for [[$ty; C]; R] {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::Two)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				self.into_iter().map(Vec::from).collect::<Vec<_>>().into_payload()
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				let rows = rows2::<$ty>(value)?;
				let dims = dims2(&rows);
				fixed(rows_of_fixed::<$ty, C>(rows)?, || (vec![R, C], dims))
			}

			fn dims(&self) -> Vec<usize> {
				vec![R, C]
			}
		}

		impl<const P: usize, const R: usize, const C: usize> Param for [[[$ty; C]; R]; P] {
			fn type_tag() -> TypeTag {
				TypeTag::array(<$ty as Element>::KIND, Rank::Three)
			}

			fn into_payload(self) -> Result<Payload, ValueError> {
				self.into_iter()
					.map(|plane| plane.into_iter().map(Vec::from).collect::<Vec<_>>())
					.collect::<Vec<_>>()
					.into_payload()
			}

			fn from_value(value: &Value) -> Result<Self, ValueError> {
				let planes = rows3::<$ty>(value)?;
				let dims = dims3(&planes);
				let planes = planes
					.into_iter()
					.map(|rows| {
						let plane_dims = dims2(&rows);
						fixed::<[$ty; C], R>(rows_of_fixed::<$ty, C>(rows)?, || (vec![R, C], plane_dims))
					})
					.collect::<Result<Vec<_>, _>>()?;
				fixed(planes, || (vec![P, R, C], dims))
			}

			fn dims(&self) -> Vec<usize> {
				vec![P, R, C]
			}
		}
	)*};
}

element_params!(i64, f64, bool, String);
