//! Flag generation for parameters.

use std::fmt::Debug;
use std::str::FromStr;

use interface_schema_core::{ParameterDescriptor, ParameterKind, SchemaError, TypeTag};
use serde::{Deserialize, Serialize};

use super::abbreviations::AbbreviationGenerator;

/// How required parameters are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStyle {
    /// Every parameter becomes an option.
    KeywordOnly,
    /// Required non-boolean parameters become bare positionals.
    #[default]
    RequiredPositional,
}

impl FromStr for FlagStyle {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "keyword_only" => Ok(Self::KeywordOnly),
            "required_positional" => Ok(Self::RequiredPositional),
            other => Err(SchemaError::Configuration(format!(
                "invalid flag style '{other}', valid styles are: keyword_only, required_positional"
            ))),
        }
    }
}

/// Per-command state consulted while generating flags.
///
/// Only one variadic list may be positional in a command, so the slot is
/// tracked here and a fresh scope is created for every command.
#[derive(Debug, Clone, Default)]
pub struct FlagScope {
    positional_lists: usize,
}

impl FlagScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the positional list slot, returning `false` if already taken.
    fn claim_positional_list(&mut self) -> bool {
        if self.positional_lists > 0 {
            return false;
        }
        self.positional_lists += 1;
        true
    }
}

/// Decides the flag strings for one parameter.
pub trait FlagStrategy: Debug + Send + Sync {
    /// Flag style in effect.
    fn style(&self) -> FlagStyle;

    /// Returns the flags for `name` (already translated).
    ///
    /// Short flags produced by `abbreviations` are recorded in `taken`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ReservedFlag`] when `name` is already in `taken`.
    fn arg_flags(
        &self,
        name: &str,
        param: &ParameterDescriptor,
        taken: &mut Vec<String>,
        abbreviations: &dyn AbbreviationGenerator,
        scope: &mut FlagScope,
    ) -> Result<Vec<String>, SchemaError>;
}

/// The stock flag strategy.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::naming::{
///     DefaultAbbreviationGenerator, DefaultFlagStrategy, FlagScope, FlagStrategy, FlagStyle,
/// };
/// use interface_schema_core::{ParameterDescriptor, TypeTag};
///
/// let strategy = DefaultFlagStrategy::new(FlagStyle::RequiredPositional);
/// let mut taken = vec!["h".to_string(), "help".to_string()];
/// let mut scope = FlagScope::new();
///
/// let path = ParameterDescriptor::required("path", TypeTag::Path);
/// let flags = strategy.arg_flags("path", &path, &mut taken, &DefaultAbbreviationGenerator, &mut scope);
/// assert_eq!(flags.unwrap(), vec!["path"]);
///
/// let count = ParameterDescriptor::optional("count", TypeTag::Int, 1);
/// let flags = strategy.arg_flags("count", &count, &mut taken, &DefaultAbbreviationGenerator, &mut scope);
/// assert_eq!(flags.unwrap(), vec!["-c", "--count"]);
///
/// let help = ParameterDescriptor::optional("help", TypeTag::Str, "");
/// assert!(strategy.arg_flags("help", &help, &mut taken, &DefaultAbbreviationGenerator, &mut scope).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFlagStrategy {
    style: FlagStyle,
}

impl DefaultFlagStrategy {
    pub fn new(style: FlagStyle) -> Self {
        Self { style }
    }
}

impl FlagStrategy for DefaultFlagStrategy {
    fn style(&self) -> FlagStyle {
        self.style
    }

    fn arg_flags(
        &self,
        name: &str,
        param: &ParameterDescriptor,
        taken: &mut Vec<String>,
        abbreviations: &dyn AbbreviationGenerator,
        scope: &mut FlagScope,
    ) -> Result<Vec<String>, SchemaError> {
        if taken.iter().any(|flag| flag == name) {
            return Err(SchemaError::ReservedFlag(name.to_string()));
        }

        let positional_style = self.style == FlagStyle::RequiredPositional;
        let is_bool = param.ty.as_ref().is_some_and(TypeTag::is_bool);
        let is_list = param.kind == ParameterKind::VarPositional
            || param.ty.as_ref().is_some_and(TypeTag::is_list);

        if positional_style
            && param.required
            && !is_bool
            && (!is_list || scope.claim_positional_list())
        {
            return Ok(vec![name.to_string()]);
        }

        let long = if name.chars().count() == 1 {
            format!("-{name}")
        } else {
            format!("--{name}")
        };
        if is_bool {
            return Ok(vec![long]);
        }

        Ok(match abbreviations.generate(name, taken) {
            Some(short) if short != name => vec![format!("-{short}"), long],
            _ => vec![long],
        })
    }
}

/// Toggles the `no-` prefix of a boolean flag name.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::naming::inverted_bool_flag_name;
///
/// assert_eq!(inverted_bool_flag_name("color"), "no-color");
/// assert_eq!(inverted_bool_flag_name("no-color"), "color");
/// ```
pub fn inverted_bool_flag_name(name: &str) -> String {
    match name.strip_prefix("no-") {
        Some(rest) => rest.to_string(),
        None => format!("no-{name}"),
    }
}
