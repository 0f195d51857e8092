//! Routing of a piped stdin payload to command parameters.
//!
//! A command's [`PipeTargets`] name the parameters that may be filled from
//! stdin. The payload is split into one chunk per target, each chunk is
//! converted through the parameter's declared type, and the result is merged
//! into the parsed arguments according to the configured [`PipePriority`].
//!
//! # Examples
//!
//! ```
//! use interface_schema_builder::pipe::{PipeOverrides, build_pipe_targets_config, get_chunks};
//!
//! let config = build_pipe_targets_config(vec!["src", "dst"], PipeOverrides::default()).unwrap();
//! assert_eq!(config.delimiter.as_deref(), Some("\n"));
//!
//! let chunks = get_chunks("a.txt\nb.txt", &config).unwrap();
//! assert_eq!(chunks, vec![Some("a.txt".to_string()), Some("b.txt".to_string())]);
//! ```

use std::collections::{HashMap, HashSet};

use interface_schema_core::{
    ConversionError, ParameterDescriptor, ParameterKind, PipePriority, PipeTargets, Result,
    SchemaError, TypeTag,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::convert::TypeConverter;

/// One or many target names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetNames {
    One(String),
    Many(Vec<String>),
}

impl TargetNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

/// The mapping form of a pipe-target declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipeTargetsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TargetNames>,
    /// Alternative spelling of `parameters`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<TargetNames>,
    /// `Some(None)` is an explicit `null`: split on line breaks.
    #[serde(
        default,
        deserialize_with = "explicit_delimiter",
        skip_serializing_if = "Option::is_none"
    )]
    pub delimiter: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_partial: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

fn explicit_delimiter<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Every accepted way of declaring pipe targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipeTargetsInput {
    /// A normalized configuration, re-validated with optional overrides.
    Config(PipeTargets),
    /// A single name or an ordered list of names.
    Names(TargetNames),
    /// Names plus delimiter, partial, and priority settings.
    Spec(PipeTargetsSpec),
}

impl From<&str> for PipeTargetsInput {
    fn from(name: &str) -> Self {
        Self::Names(TargetNames::One(name.to_string()))
    }
}

impl From<String> for PipeTargetsInput {
    fn from(name: String) -> Self {
        Self::Names(TargetNames::One(name))
    }
}

impl From<Vec<String>> for PipeTargetsInput {
    fn from(names: Vec<String>) -> Self {
        Self::Names(TargetNames::Many(names))
    }
}

impl From<Vec<&str>> for PipeTargetsInput {
    fn from(names: Vec<&str>) -> Self {
        Self::Names(TargetNames::Many(
            names.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl From<PipeTargets> for PipeTargetsInput {
    fn from(config: PipeTargets) -> Self {
        Self::Config(config)
    }
}

impl From<PipeTargetsSpec> for PipeTargetsInput {
    fn from(spec: PipeTargetsSpec) -> Self {
        Self::Spec(spec)
    }
}

/// Settings that take precedence over the declaration itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeOverrides {
    /// `Some(None)` forces line splitting.
    pub delimiter: Option<Option<String>>,
    pub allow_partial: Option<bool>,
    pub priority: Option<String>,
}

impl PipeOverrides {
    pub fn with_delimiter(mut self, delimiter: Option<&str>) -> Self {
        self.delimiter = Some(delimiter.map(str::to_string));
        self
    }

    pub fn with_allow_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = Some(allow_partial);
        self
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = Some(priority.to_string());
        self
    }
}

/// Parses a user-supplied priority, defaulting to `cli`.
pub fn parse_priority(value: Option<&str>) -> Result<PipePriority> {
    value.map_or(Ok(PipePriority::Cli), |value| value.parse())
}

fn targets_to_list(names: Vec<String>) -> Result<Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    for name in &names {
        if name.is_empty() {
            return Err(SchemaError::Configuration(
                "pipe target names must be non-empty strings".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(SchemaError::Configuration(format!(
                "duplicate pipe target for parameter '{name}'"
            )));
        }
    }
    if names.is_empty() {
        return Err(SchemaError::Configuration(
            "at least one pipe target is required".to_string(),
        ));
    }
    Ok(names)
}

/// Normalizes any pipe-target declaration into [`PipeTargets`].
///
/// When more than one target is declared and no delimiter is given, a
/// newline is used.
///
/// # Errors
///
/// Returns [`SchemaError::Configuration`] for empty or duplicate names, a
/// mapping without `parameters`/`bindings`, an empty delimiter, or an
/// unknown priority.
pub fn build_pipe_targets_config(
    input: impl Into<PipeTargetsInput>,
    overrides: PipeOverrides,
) -> Result<PipeTargets> {
    let (names, delimiter, allow_partial, priority) = match input.into() {
        PipeTargetsInput::Config(config) => {
            let priority = match overrides.priority.as_deref() {
                Some(value) => value.parse()?,
                None => config.priority,
            };
            let config = PipeTargets {
                targets: targets_to_list(config.targets)?,
                delimiter: overrides.delimiter.unwrap_or(config.delimiter),
                priority,
                allow_partial: overrides.allow_partial.unwrap_or(config.allow_partial),
            };
            validate_delimiter(config.delimiter.as_deref())?;
            return Ok(config);
        }
        PipeTargetsInput::Names(names) => (names.into_vec(), None, None, None),
        PipeTargetsInput::Spec(spec) => {
            let names = spec.parameters.or(spec.bindings).ok_or_else(|| {
                SchemaError::Configuration(
                    "pipe target mapping must include 'parameters' or 'bindings'".to_string(),
                )
            })?;
            (names.into_vec(), spec.delimiter, spec.allow_partial, spec.priority)
        }
    };

    let names = targets_to_list(names)?;
    let delimiter = match overrides.delimiter.or(delimiter) {
        Some(explicit) => explicit,
        None if names.len() > 1 => Some("\n".to_string()),
        None => None,
    };
    validate_delimiter(delimiter.as_deref())?;

    Ok(PipeTargets {
        targets: names,
        delimiter,
        priority: parse_priority(overrides.priority.or(priority).as_deref())?,
        allow_partial: overrides.allow_partial.or(allow_partial).unwrap_or(false),
    })
}

fn validate_delimiter(delimiter: Option<&str>) -> Result<()> {
    if delimiter == Some("") {
        return Err(SchemaError::Configuration(
            "pipe delimiter cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Splits a payload into stripped chunks, one per target at most.
///
/// A single target receives the whole payload untouched. With a delimiter,
/// at most `targets - 1` splits are made so excess text stays in the last
/// chunk; without one, the payload is split on every line break.
pub fn split_data(payload: &str, config: &PipeTargets) -> Vec<String> {
    let expected = config.targets.len();
    if expected <= 1 {
        return vec![payload.to_string()];
    }

    match config.delimiter.as_deref() {
        Some(delimiter) if !delimiter.is_empty() => payload
            .splitn(expected, delimiter)
            .map(|piece| piece.trim().to_string())
            .collect(),
        _ => payload
            .lines()
            .map(|piece| piece.trim().to_string())
            .collect(),
    }
}

/// Splits a payload and checks the chunk count against the targets.
///
/// Missing chunks become `None` when partial input is allowed.
///
/// # Errors
///
/// Returns [`SchemaError::PipeInput`] (attributed to `stdin`) when the count
/// does not match.
pub fn get_chunks(payload: &str, config: &PipeTargets) -> Result<Vec<Option<String>>> {
    let mut chunks: Vec<Option<String>> = split_data(payload, config)
        .into_iter()
        .map(Some)
        .collect();
    let expected = config.targets.len();
    debug!(chunks = chunks.len(), expected, "Split piped payload");

    if chunks.len() < expected {
        if !config.allow_partial {
            return Err(SchemaError::pipe_input(
                "stdin",
                format!(
                    "received {} chunk(s) but {expected} pipe target(s) are configured",
                    chunks.len()
                ),
            ));
        }
        chunks.resize(expected, None);
    } else if chunks.len() > expected {
        return Err(SchemaError::pipe_input(
            "stdin",
            format!(
                "received {} chunk(s) but only {expected} pipe target(s) are configured",
                chunks.len()
            ),
        ));
    }

    Ok(chunks)
}

/// Returns `true` when `value` counts as explicitly given on the CLI.
///
/// Absent values, `null`, empty lists, and values equal to the parameter's
/// own default do not count.
pub fn is_cli_supplied(value: Option<&Value>, param: &ParameterDescriptor) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) if items.is_empty() => false,
        Some(value) => param.default.value() != Some(value),
    }
}

/// Element type for list-shaped parameters, `Some(None)` for a bare list.
fn list_element(param: &ParameterDescriptor) -> Option<Option<&TypeTag>> {
    if param.kind == ParameterKind::VarPositional {
        return Some(param.ty.as_ref());
    }
    let (inner, _) = param.ty.as_ref()?.unwrap_optional();
    inner.is_list().then(|| inner.list_item())
}

/// Converts one chunk for `param`.
///
/// List-shaped parameters are split again on `delimiter` (line breaks when
/// `None`) and converted element by element. Untyped parameters, and types
/// without a parser, keep the raw text.
pub fn parse_value(
    param: &ParameterDescriptor,
    raw: &str,
    delimiter: Option<&str>,
    converter: &dyn TypeConverter,
) -> std::result::Result<Value, ConversionError> {
    if let Some(element) = list_element(param) {
        let values: Vec<&str> = match delimiter {
            Some(delimiter) if !delimiter.is_empty() => raw.split(delimiter).map(str::trim).collect(),
            _ => raw.lines().map(str::trim).collect(),
        };
        let parser = element.and_then(|ty| converter.parse_func(ty));
        return values
            .into_iter()
            .map(|value| match &parser {
                Some(parser) => parser.parse(value),
                None => Ok(Value::String(value.to_string())),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array);
    }

    let Some(ty) = &param.ty else {
        return Ok(Value::String(raw.to_string()));
    };
    match converter.parse_func(ty) {
        Some(parser) => parser.parse(raw),
        None => Ok(Value::String(raw.to_string())),
    }
}

/// Returns a copy of `arguments` with the piped payload applied.
///
/// Targets are processed in order. Empty or missing chunks are skipped. With
/// `cli` priority a value already supplied on the CLI is kept.
///
/// # Errors
///
/// - [`SchemaError::Configuration`] if a target names an unknown parameter.
/// - [`SchemaError::PipeInput`] on a chunk-count mismatch, a chunk that fails
///   conversion, or a required target left without a value.
pub fn apply_pipe_values(
    payload: &str,
    config: &PipeTargets,
    arguments: &Map<String, Value>,
    parameters: &[ParameterDescriptor],
    converter: &dyn TypeConverter,
) -> Result<Map<String, Value>> {
    let mut updated = arguments.clone();
    let chunks = get_chunks(payload, config)?;
    let by_name: HashMap<&str, &ParameterDescriptor> = parameters
        .iter()
        .map(|param| (param.name.as_str(), param))
        .collect();

    for (name, chunk) in config.targets.iter().zip(chunks) {
        let param = by_name.get(name.as_str()).ok_or_else(|| {
            SchemaError::Configuration(format!(
                "pipe target references unknown parameter '{name}'"
            ))
        })?;

        let Some(chunk) = chunk.filter(|chunk| !chunk.is_empty()) else {
            continue;
        };

        let parsed = parse_value(param, &chunk, config.delimiter.as_deref(), converter)
            .map_err(|err| {
                SchemaError::pipe_input(name, format!("failed to convert piped input: {err}"))
            })?;

        if config.priority == PipePriority::Cli && is_cli_supplied(updated.get(name), param) {
            debug!(parameter = %name, "Keeping CLI value over piped input");
            continue;
        }
        updated.insert(name.clone(), parsed);
    }

    for name in &config.targets {
        let Some(param) = by_name.get(name.as_str()) else {
            continue;
        };
        if param.required && updated.get(name).is_none_or(Value::is_null) {
            return Err(SchemaError::pipe_input(
                name,
                "no piped value was provided and the argument was not supplied on the CLI",
            ));
        }
    }

    Ok(updated)
}

/// Pipe-target configurations keyed by command and optional subcommand.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::pipe::PipeTargetRegistry;
/// use interface_schema_core::PipeTargets;
///
/// let mut registry = PipeTargetRegistry::default();
/// registry.insert("convert", None, PipeTargets::new(["source"]));
///
/// let found = registry.resolve_by_names("convert-file", "convert", &[], None, false);
/// assert_eq!(found.unwrap().targets, vec!["source"]);
/// assert!(registry.resolve_by_names("other", "other", &[], None, false).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipeTargetRegistry {
    bindings: HashMap<(String, Option<String>), PipeTargets>,
    default: Option<PipeTargets>,
}

impl PipeTargetRegistry {
    /// Stores a configuration for `command` (and `subcommand`, if given).
    pub fn insert(&mut self, command: &str, subcommand: Option<&str>, config: PipeTargets) {
        self.bindings.insert(
            (command.to_string(), subcommand.map(str::to_string)),
            config,
        );
    }

    /// Sets the fallback used when nothing command-specific matches.
    pub fn set_default(&mut self, config: Option<PipeTargets>) {
        self.default = config;
    }

    pub fn default_targets(&self) -> Option<&PipeTargets> {
        self.default.as_ref()
    }

    /// Exact lookup without fallbacks.
    pub fn get(&self, command: &str, subcommand: Option<&str>) -> Option<&PipeTargets> {
        self.bindings
            .get(&(command.to_string(), subcommand.map(str::to_string)))
    }

    /// Resolves by canonical name, then object name, then each alias.
    ///
    /// Falls back to the default only when `include_default` is set.
    pub fn resolve_by_names(
        &self,
        canonical_name: &str,
        obj_name: &str,
        aliases: &[String],
        subcommand: Option<&str>,
        include_default: bool,
    ) -> Option<PipeTargets> {
        std::iter::once(canonical_name)
            .chain(std::iter::once(obj_name))
            .chain(aliases.iter().map(String::as_str))
            .find_map(|name| self.get(name, subcommand))
            .or_else(|| include_default.then_some(self.default.as_ref()).flatten())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::convert::DefaultTypeConverter;

    fn targets(names: &[&str]) -> PipeTargets {
        build_pipe_targets_config(names.to_vec(), PipeOverrides::default()).unwrap()
    }

    #[test]
    fn test_single_target_is_never_split() {
        let config = targets(&["body"]);
        assert_eq!(config.delimiter, None);
        assert_eq!(split_data(" a\nb ", &config), vec![" a\nb "]);
    }

    #[test]
    fn test_delimiter_collapses_excess_into_last_chunk() {
        let config = build_pipe_targets_config(
            vec!["a", "b"],
            PipeOverrides::default().with_delimiter(Some(",")),
        )
        .unwrap();
        assert_eq!(split_data("foo,bar,extra", &config), vec!["foo", "bar,extra"]);
    }

    #[test]
    fn test_explicit_null_delimiter_errors_on_excess_lines() {
        let spec: PipeTargetsSpec =
            serde_json::from_value(json!({"parameters": ["a", "b"], "delimiter": null})).unwrap();
        let config = build_pipe_targets_config(spec, PipeOverrides::default()).unwrap();
        assert_eq!(config.delimiter, None);

        let err = get_chunks("one\ntwo\nthree", &config).unwrap_err();
        assert!(matches!(err, SchemaError::PipeInput { ref parameter, .. } if parameter == "stdin"));

        let default_config = targets(&["a", "b"]);
        assert_eq!(
            get_chunks("one\ntwo\nthree", &default_config).unwrap(),
            vec![Some("one".to_string()), Some("two\nthree".to_string())]
        );
    }

    #[test]
    fn test_partial_chunks_are_padded() {
        let config = build_pipe_targets_config(
            vec!["a", "b", "c"],
            PipeOverrides::default().with_allow_partial(true),
        )
        .unwrap();
        assert_eq!(
            get_chunks("x", &config).unwrap(),
            vec![Some("x".to_string()), None, None]
        );
        assert!(get_chunks("x", &targets(&["a", "b"])).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(build_pipe_targets_config(Vec::<String>::new(), PipeOverrides::default()).is_err());
        assert!(build_pipe_targets_config(vec!["a", "a"], PipeOverrides::default()).is_err());
        assert!(build_pipe_targets_config(vec![""], PipeOverrides::default()).is_err());
        assert!(
            build_pipe_targets_config(
                "a",
                PipeOverrides::default().with_priority("stdin")
            )
            .is_err()
        );
        let missing: PipeTargetsSpec = serde_json::from_value(json!({"delimiter": ","})).unwrap();
        assert!(build_pipe_targets_config(missing, PipeOverrides::default()).is_err());
    }

    #[test]
    fn test_input_deserializes_every_shape() {
        let one: PipeTargetsInput = serde_json::from_value(json!("text")).unwrap();
        assert_eq!(one, PipeTargetsInput::from("text"));

        let spec: PipeTargetsInput = serde_json::from_value(json!({
            "bindings": "text",
            "priority": "pipe",
            "allow_partial": true
        }))
        .unwrap();
        let config = build_pipe_targets_config(spec, PipeOverrides::default()).unwrap();
        assert_eq!(config.targets, vec!["text"]);
        assert_eq!(config.priority, PipePriority::Pipe);
        assert!(config.allow_partial);
    }

    #[test]
    fn test_existing_config_accepts_overrides() {
        let config = targets(&["a", "b"]);
        let updated = build_pipe_targets_config(
            config,
            PipeOverrides::default().with_priority("pipe").with_delimiter(None),
        )
        .unwrap();
        assert_eq!(updated.priority, PipePriority::Pipe);
        assert_eq!(updated.delimiter, None);
    }

    #[test]
    fn test_is_cli_supplied() {
        let param = ParameterDescriptor::optional("count", TypeTag::Int, 3);
        assert!(!is_cli_supplied(None, &param));
        assert!(!is_cli_supplied(Some(&Value::Null), &param));
        assert!(!is_cli_supplied(Some(&json!(3)), &param));
        assert!(!is_cli_supplied(Some(&json!([])), &param));
        assert!(is_cli_supplied(Some(&json!(4)), &param));
    }

    #[test]
    fn test_apply_respects_priority() {
        let params = vec![ParameterDescriptor::optional("count", TypeTag::Int, 1)];
        let args = json!({"count": 5});
        let args = args.as_object().unwrap();
        let converter = DefaultTypeConverter::new();

        let cli = targets(&["count"]);
        let kept = apply_pipe_values("9", &cli, args, &params, &converter).unwrap();
        assert_eq!(kept["count"], json!(5));

        let pipe = build_pipe_targets_config(cli, PipeOverrides::default().with_priority("pipe"))
            .unwrap();
        let replaced = apply_pipe_values("9", &pipe, args, &params, &converter).unwrap();
        assert_eq!(replaced["count"], json!(9));
    }

    #[test]
    fn test_apply_splits_list_targets() {
        let params = vec![
            ParameterDescriptor::required("numbers", TypeTag::list_of(TypeTag::Int)),
            ParameterDescriptor::required("label", TypeTag::Str),
        ];
        let config = build_pipe_targets_config(
            vec!["label", "numbers"],
            PipeOverrides::default().with_delimiter(Some(";")),
        )
        .unwrap();
        let applied = apply_pipe_values(
            "totals; 1;2;3",
            &config,
            &Map::new(),
            &params,
            &DefaultTypeConverter::new(),
        )
        .unwrap();
        assert_eq!(applied["label"], json!("totals"));
        assert_eq!(applied["numbers"], json!([1, 2, 3]));
    }

    #[test]
    fn test_apply_reports_unfilled_required_target() {
        let params = vec![
            ParameterDescriptor::required("first", TypeTag::Str),
            ParameterDescriptor::required("second", TypeTag::Str),
        ];
        let config = build_pipe_targets_config(
            vec!["first", "second"],
            PipeOverrides::default().with_allow_partial(true),
        )
        .unwrap();
        let err = apply_pipe_values(
            "only",
            &config,
            &Map::new(),
            &params,
            &DefaultTypeConverter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::PipeInput { ref parameter, .. } if parameter == "second"));
    }

    #[test]
    fn test_apply_rejects_unknown_target() {
        let config = targets(&["ghost"]);
        let err = apply_pipe_values("x", &config, &Map::new(), &[], &DefaultTypeConverter::new())
            .unwrap_err();
        assert!(matches!(err, SchemaError::Configuration(_)));
    }

    #[test]
    fn test_apply_reports_conversion_failure() {
        let params = vec![ParameterDescriptor::required("count", TypeTag::Int)];
        let err = apply_pipe_values(
            "many",
            &targets(&["count"]),
            &Map::new(),
            &params,
            &DefaultTypeConverter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::PipeInput { ref parameter, .. } if parameter == "count"));
    }
}
