//! The backend-neutral CLI schema.
//!
//! A [`ParserSchema`] holds one or more [`Command`]s, each with a flat list of
//! [`Argument`]s. The schema is built once and then shared read-only by every
//! backend that renders it and by the runner that feeds parsed values back.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{CallableDescriptor, ConversionError, DefaultValue, RecordType, SchemaError, TypeTag};

/// Whether an argument is addressed by position or by flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    Positional,
    Option,
}

/// The arity/structure category of an argument's expected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// One scalar value.
    Single,
    /// Variable-length list.
    List,
    /// Fixed-length tuple.
    FixedTuple,
    /// Boolean flag without a value.
    Flag,
}

/// Arity marker handed to backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// An exact count.
    Exactly(usize),
}

impl fmt::Display for Nargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optional => f.write_str("?"),
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
            Self::Exactly(count) => write!(f, "{count}"),
        }
    }
}

impl Serialize for Nargs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exactly(count) => serializer.serialize_u64(*count as u64),
            other => serializer.collect_str(other),
        }
    }
}

/// Negation support for flag-shaped arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanBehavior {
    /// A `--no-…` form exists.
    pub supports_negative: bool,
    /// Spelling of the negative form.
    pub negative_form: Option<String>,
    /// Default truth value; `None` keeps a tri-state default.
    pub default: Option<bool>,
}

type ParseFn = dyn Fn(&str) -> Result<Value, ConversionError> + Send + Sync;

/// A shared, named string-to-value conversion function.
///
/// # Examples
///
/// ```
/// use interface_schema_core::{ConversionError, ValueParser};
/// use serde_json::Value;
///
/// let parser = ValueParser::new("int", |raw: &str| {
///     raw.trim()
///         .parse::<i64>()
///         .map(Value::from)
///         .map_err(|e| ConversionError::new(raw, "int", e.to_string()))
/// });
/// assert_eq!(parser.parse(" 42 ").unwrap(), Value::from(42));
/// assert!(parser.parse("x").is_err());
/// ```
#[derive(Clone)]
pub struct ValueParser {
    name: String,
    func: Arc<ParseFn>,
}

impl ValueParser {
    /// Wraps a conversion function under a descriptive name.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name used in debug output and serialized schemas.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts one raw string.
    pub fn parse(&self, raw: &str) -> Result<Value, ConversionError> {
        (self.func)(raw)
    }

    /// Returns `true` when both handles share the same function.
    pub fn same_as(&self, other: &ValueParser) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for ValueParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueParser").field(&self.name).finish()
    }
}

impl Serialize for ValueParser {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Value parsing attached to an argument.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ArgumentParser {
    /// One parser for every value.
    Single(ValueParser),
    /// One parser per tuple position.
    PerPosition(Vec<ValueParser>),
}

impl ArgumentParser {
    /// Parser for the value at `position`.
    pub fn for_position(&self, position: usize) -> Option<&ValueParser> {
        match self {
            Self::Single(parser) => Some(parser),
            Self::PerPosition(parsers) => parsers.get(position),
        }
    }
}

/// The unit of CLI surface.
///
/// Flags are never empty and are unique within their owning [`Command`]. An
/// argument is created once during the schema build and never mutated; parsed
/// values live in the caller's flat mapping, keyed by [`Argument::name`].
#[derive(Debug, Clone, Serialize)]
pub struct Argument {
    /// Canonical (identifier) name; key of the parsed value.
    pub name: String,
    /// CLI-facing name.
    pub display_name: String,
    pub kind: ArgumentKind,
    pub value_shape: ValueShape,
    /// Bare name for positionals; `-s`/`--long` forms for options.
    pub flags: Vec<String>,
    pub required: bool,
    /// Unset means "leave the key out when nothing was passed".
    #[serde(skip_serializing_if = "DefaultValue::is_unset")]
    pub default: DefaultValue,
    pub help: Option<String>,
    /// Resolved element type.
    #[serde(rename = "type")]
    pub ty: Option<TypeTag>,
    pub parser: Option<ArgumentParser>,
    pub nargs: Option<Nargs>,
    pub boolean_behavior: Option<BooleanBehavior>,
    pub choices: Option<Vec<String>>,
    pub accepts_stdin: bool,
    pub pipe_required: bool,
    /// Root parameter this leaf was expanded from.
    pub is_expanded_from: Option<String>,
    /// Field path from the root parameter down to this leaf.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expansion_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_model_type: Option<RecordType>,
    pub parent_is_optional: bool,
    /// Root parameter's record default, unset when none was declared.
    #[serde(skip_serializing_if = "DefaultValue::is_unset")]
    pub model_default: DefaultValue,
}

impl Argument {
    /// Returns `true` for positional arguments.
    pub fn is_positional(&self) -> bool {
        self.kind == ArgumentKind::Positional
    }

    /// Returns `true` for leaves produced by record expansion.
    pub fn is_expanded(&self) -> bool {
        self.is_expanded_from.is_some()
    }

    /// The `--long` flag, if any.
    pub fn long_flag(&self) -> Option<&str> {
        self.flags
            .iter()
            .find(|flag| flag.starts_with("--"))
            .map(String::as_str)
    }

    /// The single-dash flag, if any.
    pub fn short_flag(&self) -> Option<&str> {
        self.flags
            .iter()
            .find(|flag| flag.starts_with('-') && !flag.starts_with("--"))
            .map(String::as_str)
    }
}

/// What kind of object backs a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Function,
    Method,
    Class,
    /// A pure grouping node without a backing callable.
    Group,
    /// An already constructed object whose methods are subcommands.
    Instance,
}

/// Who wins when both the CLI and the pipe supply a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipePriority {
    /// Explicit CLI values are kept; the pipe only fills gaps.
    #[default]
    Cli,
    /// Piped values always overwrite.
    Pipe,
}

impl FromStr for PipePriority {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cli" => Ok(Self::Cli),
            "pipe" => Ok(Self::Pipe),
            other => Err(SchemaError::Configuration(format!(
                "invalid pipe priority '{other}', valid values: cli,pipe"
            ))),
        }
    }
}

/// Stdin routing for one command.
///
/// # Examples
///
/// ```
/// use interface_schema_core::{PipePriority, PipeTargets};
///
/// let targets = PipeTargets::new(["left", "right"]);
/// assert!(targets.targeted_parameters().contains("left"));
/// assert_eq!(targets.priority, PipePriority::Cli);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeTargets {
    /// Ordered parameter names receiving chunks.
    pub targets: Vec<String>,
    /// Chunk delimiter; `None` splits on line breaks.
    pub delimiter: Option<String>,
    #[serde(default)]
    pub priority: PipePriority,
    /// Fewer chunks than targets is accepted.
    #[serde(default)]
    pub allow_partial: bool,
}

impl PipeTargets {
    /// Targets with no delimiter, `cli` priority, and no partial input.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            delimiter: None,
            priority: PipePriority::Cli,
            allow_partial: false,
        }
    }

    /// Set of targeted parameter names.
    pub fn targeted_parameters(&self) -> HashSet<&str> {
        self.targets.iter().map(String::as_str).collect()
    }
}

/// One invocable unit of the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    /// Backing callable, `None` for a pure grouping node.
    #[serde(skip)]
    pub target: Option<CallableDescriptor>,
    pub canonical_name: String,
    pub cli_name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub epilog: Option<String>,
    pub pipe_targets: Option<PipeTargets>,
    /// Arguments of the command itself.
    pub parameters: Vec<Argument>,
    /// Constructor arguments; empty for plain functions.
    pub initializer: Vec<Argument>,
    /// Child commands in declaration order, `None` for leaves.
    pub subcommands: Option<Vec<Command>>,
    pub command_type: CommandType,
}

impl Command {
    /// Returns `true` when the command has no subcommands.
    pub fn is_leaf(&self) -> bool {
        self.subcommands.as_ref().is_none_or(Vec::is_empty)
    }

    /// Returns `true` when `name` is the CLI name or an alias.
    pub fn matches(&self, name: &str) -> bool {
        self.cli_name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Finds a subcommand by CLI name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|sub| sub.matches(name))
    }

    /// Initializer arguments followed by the command's own.
    pub fn all_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.initializer.iter().chain(self.parameters.iter())
    }

    /// Finds an argument (initializer or own) by canonical name.
    pub fn find_argument(&self, name: &str) -> Option<&Argument> {
        self.all_arguments().find(|arg| arg.name == name)
    }
}

/// The root of a built schema.
#[derive(Debug, Clone, Serialize)]
pub struct ParserSchema {
    pub description: Option<String>,
    pub epilog: Option<String>,
    /// Top-level commands in registration order.
    pub commands: Vec<Command>,
    /// Name of the dispatch field when several top-level commands exist.
    pub command_key: Option<String>,
    /// Global pipe-target default.
    pub pipe_targets: Option<PipeTargets>,
}

impl ParserSchema {
    /// Returns `true` when more than one top-level command exists.
    pub fn is_multi_command(&self) -> bool {
        self.commands.len() > 1
    }

    /// Looks up a top-level command by canonical name.
    pub fn get_command(&self, canonical_name: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|command| command.canonical_name == canonical_name)
    }

    /// Canonical names in registration order.
    pub fn canonical_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .map(|command| command.canonical_name.as_str())
            .collect()
    }

    /// Resolves a dispatch value (canonical name or alias) to its command.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSubcommand`] when nothing matches.
    pub fn resolve_command(&self, name: &str) -> Result<&Command, SchemaError> {
        self.get_command(name)
            .or_else(|| self.commands.iter().find(|command| command.matches(name)))
            .ok_or_else(|| SchemaError::UnknownSubcommand(name.to_string()))
    }
}
