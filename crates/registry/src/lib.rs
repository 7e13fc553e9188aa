//! Parameter registry.
//!
//! A [`Registry`] maps script identifiers to [`ParameterRecord`]s. Each record
//! carries a [`TypeTag`] fixed at first registration; declaring the same
//! identifier again with the same tag is a no-op and with a different tag is
//! a [`RegistryError::TypeConflict`].
//!
//! Records are a closed sum over the supported shapes: scalars of the four
//! primitive kinds, rank 1 to 3 arrays of those kinds, and callables with a
//! [`Signature`](hotparam_signature::Signature).

mod decl;
mod param;
mod record;
mod registry;
mod tag;

pub use decl::{doc_block, lua_literal};
pub use param::{Param, ValueError};
pub use record::{ArrayDefault, CallableDecl, ParameterRecord, Payload};
pub use registry::{InsertAction, Registry, RegistryError};
pub use tag::{Rank, TypeTag};
