//! Script-backed configuration with typed parameters and late-bound callables.
//!
//! A host declares parameters on a [`ConfigReader`], writes them once to an
//! editable Lua script, and reads them back with type checks. Callable
//! parameters come back as [`Hook`]s bound to whatever function the script
//! currently defines:
//!
//! - [`ConfigReader::resolve_now`] reloads the script and refetches the
//!   function on every call,
//! - [`ConfigReader::cached`] reuses the function captured by the most recent
//!   explicit read.
//!
//! ```no_run
//! use hotparam_config::{ConfigReader, ReaderSettings, Value};
//!
//! # fn main() -> hotparam_config::Result<()> {
//! let mut reader = ConfigReader::new(ReaderSettings::default().with_script("tuning.lua"));
//! reader.register_doc("count", 5i64, "Number of workers")?;
//! reader.register_callable("add", "ii>i", "Combine two counts")?;
//! reader.write_script()?;
//!
//! let count: i64 = reader.read("count")?;
//! let add = reader.read_callable("add", "ii>i")?;
//! let sum = add.call(&[Value::Int(count), Value::Int(4)])?;
//! # let _ = sum;
//! # Ok(())
//! # }
//! ```

mod error;
mod hook;
mod reader;
mod script;
mod settings;

pub use error::{ConfigError, Result};
pub use hook::{BindingState, Hook};
pub use hotparam_invocation::{OutSlot, RawArg, RawOut};
pub use hotparam_primitives::Value;
pub use hotparam_registry::{CallableDecl, InsertAction, Param};
pub use reader::{ConfigReader, SignatureSource};
pub use settings::{ReaderSettings, ReloadPolicy};
