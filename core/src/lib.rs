//! Backend-neutral CLI schema types for reflected callables.
//!
//! This crate defines the data that flows between reflection, schema
//! building, and parser backends:
//!
//! - [`CallableDescriptor`] and friends describe reflected functions, methods,
//!   and classes together with their declared parameter types ([`TypeTag`]).
//! - [`ParserSchema`], [`Command`], and [`Argument`] are the built CLI surface
//!   a backend renders.
//! - [`RecordType::instantiate`] rebuilds structured values from flat field
//!   mappings, merging partial overrides with [`deep_merge`].
//!
//! Validation ([`validate_schema`]) catches structural errors such as
//! duplicate flags and grouping commands without children.
//!
//! # Example
//!
//! ```
//! use interface_schema_core::*;
//!
//! let greet = FunctionDescriptor::new(
//!     "greet",
//!     vec![
//!         ParameterDescriptor::required("name", TypeTag::Str),
//!         ParameterDescriptor::optional("times", TypeTag::Int, 1),
//!     ],
//! )
//! .with_description("Say hello");
//!
//! let callable = CallableDescriptor::Function(greet);
//! assert_eq!(callable.name(), Some("greet"));
//! assert_eq!(callable.description(), Some("Say hello"));
//! ```

mod error;
mod record;
mod schema;
mod types;
mod validate;

pub use error::{ConversionError, Result, SchemaError};
pub use record::deep_merge;
pub use schema::*;
pub use types::*;
pub use validate::{ValidationError, validate_schema};
