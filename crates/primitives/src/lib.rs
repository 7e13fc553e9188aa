//! Shared primitives for hotparam.
//!
//! Everything that crosses the boundary between the host and the embedded
//! script engine is expressed in terms of the types defined here: the four
//! [`ScalarKind`]s, the dynamically typed [`Value`] and the [`Element`] trait
//! that maps native scalars onto both.

pub mod ident;
mod kind;
mod value;

pub use ident::{IdentifierError, is_identifier, validate_identifier};
pub use kind::ScalarKind;
pub use value::{Element, Value};

#[cfg(test)]
mod tests;
