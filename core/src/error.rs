//! Error types shared by schema building, pipe routing, and model
//! reconstruction.
//!
//! Every failure in this workspace is a deterministic function of its input,
//! so nothing here is retried. Callers surface these errors verbatim.

use thiserror::Error;

/// A raw string could not be converted to the requested type.
///
/// Returned by [`ValueParser`](crate::ValueParser) functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{input}' to {target}: {reason}")]
pub struct ConversionError {
    /// The raw text that failed to convert.
    pub input: String,
    /// Human-readable name of the target type.
    pub target: String,
    /// Why the conversion failed.
    pub reason: String,
}

impl ConversionError {
    /// Creates a conversion error.
    pub fn new(
        input: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building a schema or preparing an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The builder was asked to produce a schema without any command.
    #[error("no commands were provided")]
    NoCommands,

    /// A dispatch name did not resolve to any registered command.
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    /// A command group (or class) exposes nothing to invoke.
    #[error("command group '{0}' has no commands")]
    EmptyGroup(String),

    /// Invalid pipe-target or builder configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A parameter name collides with a reserved or already-taken flag.
    #[error("'{0}' is a reserved flag")]
    ReservedFlag(String),

    /// A command name or alias is empty or already registered.
    #[error("duplicate command name: '{0}'")]
    DuplicateCommand(String),

    /// Piped stdin could not be routed to its targets.
    #[error("invalid piped input for '{parameter}': {message}")]
    PipeInput {
        /// Parameter the failure is attributed to (`stdin` for count errors).
        parameter: String,
        /// What went wrong.
        message: String,
    },

    /// A reflected object is neither a function, a method, nor a class.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A record could not be built because a required field had no value.
    #[error("missing required field '{field}' for '{record}'")]
    MissingRequiredField {
        /// Record type name.
        record: String,
        /// Field without a value.
        field: String,
    },

    /// A constructor-style record received a key it does not accept.
    #[error("'{record}' got an unexpected field '{field}'")]
    UnexpectedField {
        /// Record type name.
        record: String,
        /// Rejected key.
        field: String,
    },

    /// A validated record received a value of the wrong shape.
    #[error("invalid value for '{record}.{field}': expected {expected}")]
    InvalidFieldValue {
        /// Record type name.
        record: String,
        /// Offending field.
        field: String,
        /// Expected type, rendered for humans.
        expected: String,
    },

    /// A raw value failed type conversion.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl SchemaError {
    /// Shorthand for [`SchemaError::PipeInput`].
    pub fn pipe_input(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PipeInput {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
