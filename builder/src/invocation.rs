//! Turning parsed values into call arguments.
//!
//! After a backend has parsed the command line into a flat mapping, the
//! runner applies any piped payload, rebuilds expanded records, and finally
//! splits the values into positional and keyword arguments for the
//! constructor and the callable.

use interface_schema_core::{
    Argument, CallableDescriptor, Command, ParameterDescriptor, ParameterKind, PipeTargets, Result,
    SchemaError,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::convert::TypeConverter;
use crate::expansion::reconstruct_expanded_models;
use crate::pipe::apply_pipe_values;

/// Positional and keyword arguments for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallSplit {
    pub positional: Vec<Value>,
    pub keyword: Map<String, Value>,
}

impl CallSplit {
    /// Returns `true` when no argument is passed at all.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Arguments for constructing the owner and for calling the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallArgs {
    pub init: CallSplit,
    pub call: CallSplit,
}

/// Prepares the arguments for invoking `command`.
///
/// `subcommand` selects a child by CLI name or alias and is required for
/// commands with subcommands. A nested group is not walked; invoke it as
/// `command` instead. Pipe targets are looked up on the selected
/// command, then on `command`, then in `default_pipe`; an empty payload is
/// ignored.
///
/// # Errors
///
/// - [`SchemaError::UnknownSubcommand`] when `subcommand` matches nothing.
/// - [`SchemaError::InvalidCommand`] when the selection is not a leaf.
/// - Pipe and record errors from [`apply_pipe_values`] and
///   [`reconstruct_expanded_models`].
///
/// # Examples
///
/// ```
/// use interface_schema_builder::{DefaultTypeConverter, SchemaBuilder, prepare_invocation};
/// use interface_schema_core::{CallableDescriptor, FunctionDescriptor, ParameterDescriptor, TypeTag};
/// use serde_json::{json, Map};
///
/// let add = FunctionDescriptor::new(
///     "add",
///     vec![
///         ParameterDescriptor::required("left", TypeTag::Int),
///         ParameterDescriptor::required("right", TypeTag::Int),
///     ],
/// );
/// let mut builder = SchemaBuilder::new();
/// builder.add_command(CallableDescriptor::Function(add), None, None, &[]).unwrap();
/// builder.set_pipe_targets("add", None, vec!["left", "right"]).unwrap();
/// let schema = builder.build().unwrap();
///
/// let args = prepare_invocation(
///     &schema.commands[0],
///     None,
///     Map::new(),
///     Some("1\n2"),
///     None,
///     &DefaultTypeConverter::new(),
/// )
/// .unwrap();
/// assert_eq!(args.call.positional, vec![json!(1), json!(2)]);
/// ```
pub fn prepare_invocation(
    command: &Command,
    subcommand: Option<&str>,
    args: Map<String, Value>,
    payload: Option<&str>,
    default_pipe: Option<&PipeTargets>,
    converter: &dyn TypeConverter,
) -> Result<CallArgs> {
    let leaf = match subcommand {
        Some(name) => command
            .find_subcommand(name)
            .ok_or_else(|| SchemaError::UnknownSubcommand(name.to_string()))?,
        None => command,
    };
    if !leaf.is_leaf() {
        return Err(SchemaError::InvalidCommand(format!(
            "'{}' requires a subcommand",
            leaf.cli_name
        )));
    }

    let (init_params, call_params) = call_descriptors(leaf);
    let mut args = args;

    let pipe = leaf
        .pipe_targets
        .as_ref()
        .or(command.pipe_targets.as_ref())
        .or(default_pipe);
    if let (Some(config), Some(payload)) = (pipe, payload.filter(|p| !p.is_empty())) {
        debug!(command = %leaf.cli_name, targets = ?config.targets, "Applying piped input");
        let descriptors: Vec<ParameterDescriptor> =
            init_params.iter().chain(&call_params).cloned().collect();
        args = apply_pipe_values(payload, config, &args, &descriptors, converter)?;
    }

    let arguments: Vec<Argument> = command
        .initializer
        .iter()
        .chain(&leaf.parameters)
        .cloned()
        .collect();
    let args = reconstruct_expanded_models(args, &arguments)?;

    let init = if init_params.is_empty() {
        // Group arguments have no backing parameters and pass by name.
        let keyword = command
            .initializer
            .iter()
            .filter_map(|arg| {
                let root = arg.is_expanded_from.as_ref().unwrap_or(&arg.name);
                args.get(root).map(|value| (root.clone(), value.clone()))
            })
            .collect();
        CallSplit {
            positional: Vec::new(),
            keyword,
        }
    } else {
        split_call(&init_params, &args)
    };

    Ok(CallArgs {
        init,
        call: split_call(&call_params, &args),
    })
}

/// Constructor and call parameters of the command's target.
fn call_descriptors(command: &Command) -> (Vec<ParameterDescriptor>, Vec<ParameterDescriptor>) {
    match &command.target {
        Some(CallableDescriptor::Function(function)) => (Vec::new(), function.parameters.clone()),
        Some(CallableDescriptor::Method(method)) => {
            let init = match (&method.constructor_parameters, method.bound) {
                (Some(constructor), false) => constructor.clone(),
                _ => Vec::new(),
            };
            (init, method.parameters.clone())
        }
        _ => (Vec::new(), Vec::new()),
    }
}

/// Splits values by parameter kind.
///
/// Absent values are skipped. Once an ordinary parameter is skipped, later
/// ordinary parameters are passed by keyword so positions never shift.
pub fn split_call(params: &[ParameterDescriptor], args: &Map<String, Value>) -> CallSplit {
    let mut split = CallSplit::default();
    let mut skipped = false;

    for param in params {
        let value = args.get(&param.name);
        match param.kind {
            ParameterKind::VarPositional => match value {
                Some(Value::Array(items)) => split.positional.extend(items.iter().cloned()),
                Some(Value::Null) | None => {}
                Some(other) => split.positional.push(other.clone()),
            },
            ParameterKind::VarKeyword => {
                if let Some(Value::Object(extra)) = value {
                    split
                        .keyword
                        .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            kind => {
                let Some(value) = value else {
                    skipped = true;
                    continue;
                };
                match kind {
                    ParameterKind::PositionalOnly => split.positional.push(value.clone()),
                    ParameterKind::PositionalOrKeyword if !skipped => {
                        split.positional.push(value.clone());
                    }
                    _ => {
                        split.keyword.insert(param.name.clone(), value.clone());
                    }
                }
            }
        }
    }
    split
}
