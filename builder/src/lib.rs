//! Schema building for reflected callables.
//!
//! This crate turns [`CallableDescriptor`](interface_schema_core::CallableDescriptor)s
//! into a backend-neutral [`ParserSchema`](interface_schema_core::ParserSchema):
//!
//! - [`naming`] translates identifiers into CLI names and picks flags.
//! - [`expansion`] flattens record-typed parameters into leaf flags and
//!   rebuilds them after parsing.
//! - [`pipe`] routes a piped stdin payload to the parameters that accept it.
//! - [`SchemaBuilder`] orchestrates all three.
//!
//! A runner calls [`prepare_invocation`] with the parsed values, which
//! applies piped input, then rebuilds records, then splits the result into
//! call arguments.
//!
//! # Example
//!
//! ```
//! use interface_schema_builder::SchemaBuilder;
//! use interface_schema_core::{
//!     CallableDescriptor, FieldDescriptor, FunctionDescriptor, ParameterDescriptor, RecordKind,
//!     RecordType, TypeTag, validate_schema,
//! };
//!
//! let retry = RecordType::new("Retry", RecordKind::ValidatedRecord)
//!     .with_field(FieldDescriptor::with_default("attempts", TypeTag::Int, 3))
//!     .with_field(FieldDescriptor::with_default("backoff", TypeTag::Float, 0.5));
//! let fetch = FunctionDescriptor::new(
//!     "fetch",
//!     vec![
//!         ParameterDescriptor::required("url", TypeTag::Str),
//!         ParameterDescriptor::optional("retry", TypeTag::Record(retry), serde_json::Value::Null),
//!     ],
//! );
//!
//! let mut builder = SchemaBuilder::new();
//! builder.add_command(CallableDescriptor::Function(fetch), None, None, &[]).unwrap();
//! let schema = builder.build().unwrap();
//!
//! let names: Vec<&str> = schema.commands[0]
//!     .parameters
//!     .iter()
//!     .map(|arg| arg.display_name.as_str())
//!     .collect();
//! assert_eq!(names, vec!["url", "retry.attempts", "retry.backoff"]);
//! assert!(validate_schema(&schema).is_empty());
//! ```

mod builder;
mod config;
mod convert;
mod error;
pub mod expansion;
mod invocation;
pub mod naming;
pub mod pipe;

pub use builder::{
    CommandEntry, CommandGroup, DEFAULT_COMMAND_KEY, DEFAULT_METHOD_SKIPS, DEFAULT_RESERVED_FLAGS,
    INIT_PIPE_KEY, SchemaBuilder,
};
pub use config::{BuilderConfig, DescriptorSet, PipeBinding, PipeConfig};
pub use convert::{DefaultTypeConverter, TypeConverter};
pub use error::{ConfigError, Result};
pub use expansion::{ModelExpander, reconstruct_expanded_models};
pub use invocation::{CallArgs, CallSplit, prepare_invocation, split_call};
pub use pipe::{PipeTargetsInput, apply_pipe_values, build_pipe_targets_config};
