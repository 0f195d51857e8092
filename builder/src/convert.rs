//! String-to-value conversion keyed by declared type.
//!
//! The builder asks a [`TypeConverter`] for a [`ValueParser`] per argument;
//! the pipe resolver uses the same service to convert piped chunks.
//!
//! # Examples
//!
//! ```
//! use interface_schema_builder::{DefaultTypeConverter, TypeConverter};
//! use interface_schema_core::TypeTag;
//! use serde_json::json;
//!
//! let converter = DefaultTypeConverter::new();
//! let parser = converter.parse_func(&TypeTag::list_of(TypeTag::Int)).unwrap();
//! assert_eq!(parser.parse("1, 2,3").unwrap(), json!([1, 2, 3]));
//!
//! let flag = converter.parse_func(&TypeTag::Bool).unwrap();
//! assert_eq!(flag.parse("Yes").unwrap(), json!(true));
//! ```

use std::collections::HashMap;
use std::fmt::Debug;

use interface_schema_core::{ConversionError, TypeTag, ValueParser};
use serde_json::{Number, Value};

/// Supplies value parsers for declared types.
pub trait TypeConverter: Debug + Send + Sync {
    /// Parser for `ty`, or `None` when values should stay raw strings.
    fn parse_func(&self, ty: &TypeTag) -> Option<ValueParser>;
}

/// The stock converter.
///
/// Named types resolve through parsers registered with
/// [`with_parser`](Self::with_parser); unknown names have no parser.
#[derive(Debug, Clone, Default)]
pub struct DefaultTypeConverter {
    named: HashMap<String, ValueParser>,
}

impl DefaultTypeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parser for `named { name }` types.
    pub fn with_parser(mut self, name: &str, parser: ValueParser) -> Self {
        self.named.insert(name.to_string(), parser);
        self
    }
}

impl TypeConverter for DefaultTypeConverter {
    fn parse_func(&self, ty: &TypeTag) -> Option<ValueParser> {
        let name = ty.to_string();
        let parser = match ty {
            TypeTag::Str | TypeTag::Path | TypeTag::Any => {
                ValueParser::new(name, |raw: &str| Ok(Value::String(raw.to_string())))
            }
            TypeTag::Int => ValueParser::new(name, parse_int),
            TypeTag::Float => ValueParser::new(name, parse_float),
            TypeTag::Bool => ValueParser::new(name, parse_bool),
            TypeTag::NoneType => ValueParser::new(name, |_: &str| Ok(Value::Null)),
            TypeTag::Literal { values } | TypeTag::Enum {
                variants: values, ..
            } => {
                let choices = values.clone();
                let target = name.clone();
                ValueParser::new(name, move |raw: &str| {
                    let value = raw.trim();
                    if choices.iter().any(|choice| choice == value) {
                        Ok(Value::String(value.to_string()))
                    } else {
                        Err(ConversionError::new(
                            raw,
                            &target,
                            format!("expected one of: {}", choices.join(", ")),
                        ))
                    }
                })
            }
            TypeTag::Optional { inner } => {
                let inner = self.parse_func(inner)?;
                ValueParser::new(name, move |raw: &str| {
                    if is_none_literal(raw) {
                        Ok(Value::Null)
                    } else {
                        inner.parse(raw)
                    }
                })
            }
            TypeTag::Union { variants } => {
                let parsers: Vec<ValueParser> = variants
                    .iter()
                    .filter_map(|variant| self.parse_func(variant))
                    .collect();
                if parsers.is_empty() {
                    return None;
                }
                let target = name.clone();
                ValueParser::new(name, move |raw: &str| {
                    parsers
                        .iter()
                        .find_map(|parser| parser.parse(raw).ok())
                        .ok_or_else(|| ConversionError::new(raw, &target, "no variant matched"))
                })
            }
            TypeTag::List { item } => {
                let item = match item {
                    Some(item) => self.parse_func(item),
                    None => None,
                };
                ValueParser::new(name, move |raw: &str| {
                    split_elements(raw)
                        .map(|element| match &item {
                            Some(parser) => parser.parse(element),
                            None => Ok(Value::String(element.to_string())),
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                })
            }
            TypeTag::Tuple { items } => {
                let parsers: Vec<Option<ValueParser>> =
                    items.iter().map(|item| self.parse_func(item)).collect();
                let target = name.clone();
                ValueParser::new(name, move |raw: &str| {
                    let elements: Vec<&str> = split_elements(raw).collect();
                    if elements.len() != parsers.len() {
                        return Err(ConversionError::new(
                            raw,
                            &target,
                            format!("expected {} values, got {}", parsers.len(), elements.len()),
                        ));
                    }
                    elements
                        .into_iter()
                        .zip(&parsers)
                        .map(|(element, parser)| match parser {
                            Some(parser) => parser.parse(element),
                            None => Ok(Value::String(element.to_string())),
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                })
            }
            TypeTag::Record(_) => {
                let target = name.clone();
                ValueParser::new(name, move |raw: &str| {
                    match serde_json::from_str::<Value>(raw) {
                        Ok(value @ Value::Object(_)) => Ok(value),
                        Ok(_) => Err(ConversionError::new(raw, &target, "expected a JSON object")),
                        Err(err) => Err(ConversionError::new(raw, &target, err.to_string())),
                    }
                })
            }
            TypeTag::Named { name } => return self.named.get(name).cloned(),
        };
        Some(parser)
    }
}

fn is_none_literal(raw: &str) -> bool {
    let value = raw.trim();
    value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("null")
}

fn split_elements(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|element| !element.is_empty())
}

fn parse_int(raw: &str) -> Result<Value, ConversionError> {
    raw.trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|err| ConversionError::new(raw, "int", err.to_string()))
}

fn parse_float(raw: &str) -> Result<Value, ConversionError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| ConversionError::new(raw, "float", err.to_string()))?;
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ConversionError::new(raw, "float", "value is not finite"))
}

fn parse_bool(raw: &str) -> Result<Value, ConversionError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
        "false" | "0" | "no" | "n" | "off" => Ok(Value::Bool(false)),
        _ => Err(ConversionError::new(raw, "bool", "expected true or false")),
    }
}
