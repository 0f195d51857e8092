//! Record expansion into leaf flags and reconstruction after parsing.
//!
//! A parameter whose type is a record is flattened into one leaf per field,
//! recursing into nested records until the configured depth. After parsing,
//! [`reconstruct_expanded_models`] folds the leaf values back into a single
//! record instance under the root parameter's name.

use interface_schema_core::{
    Argument, DefaultValue, FieldDescriptor, ParameterDescriptor, RecordType, Result, TypeTag,
    deep_merge,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Default recursion limit for nested records.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Default separator between path segments.
pub const DEFAULT_SEPARATOR: &str = ".";

/// One field reached by expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedLeaf {
    /// Root parameter name followed by field names.
    pub path: Vec<String>,
    /// Declared type of the leaf field.
    pub ty: Option<TypeTag>,
    /// Required only along an unbroken chain of required fields.
    pub required: bool,
    pub description: Option<String>,
}

impl ExpandedLeaf {
    /// Path segments joined with `separator`.
    pub fn joined(&self, separator: &str) -> String {
        self.path.join(separator)
    }
}

/// Flattens record-typed parameters.
///
/// # Examples
///
/// ```
/// use interface_schema_builder::expansion::ModelExpander;
/// use interface_schema_core::{FieldDescriptor, ParameterDescriptor, RecordKind, RecordType, TypeTag};
///
/// let address = RecordType::new("Address", RecordKind::NativeStruct)
///     .with_field(FieldDescriptor::required("city", TypeTag::Str));
/// let user = RecordType::new("User", RecordKind::NativeStruct)
///     .with_field(FieldDescriptor::required("name", TypeTag::Str))
///     .with_field(FieldDescriptor::required("address", TypeTag::Record(address)));
///
/// let param = ParameterDescriptor::required("user", TypeTag::Record(user));
/// let leaves = ModelExpander::default().expand_parameter(&param).unwrap();
/// let names: Vec<String> = leaves.iter().map(|leaf| leaf.joined(".")).collect();
/// assert_eq!(names, vec!["user.name", "user.address.city"]);
/// assert!(leaves.iter().all(|leaf| leaf.required));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelExpander {
    max_depth: usize,
}

impl Default for ModelExpander {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ModelExpander {
    /// A depth of 0 is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Leaves for a record-typed parameter, `None` for any other type.
    pub fn expand_parameter(&self, param: &ParameterDescriptor) -> Option<Vec<ExpandedLeaf>> {
        let record = record_type_of(param)?;
        let chain_required = param.required && param.default.is_unset() && !is_optional(param);
        let mut leaves = Vec::new();
        self.expand(record, &[param.name.clone()], 1, chain_required, &mut leaves);
        Some(leaves)
    }

    fn expand(
        &self,
        record: &RecordType,
        path: &[String],
        depth: usize,
        chain_required: bool,
        leaves: &mut Vec<ExpandedLeaf>,
    ) {
        for field in record.field_list() {
            let mut field_path = path.to_vec();
            field_path.push(field.name.clone());
            let required = chain_required && field_is_required(field);

            let nested = field
                .ty
                .as_ref()
                .and_then(|ty| ty.unwrap_optional().0.as_record());
            match nested {
                Some(nested) if depth < self.max_depth => {
                    self.expand(nested, &field_path, depth + 1, required, leaves);
                }
                _ => {
                    if nested.is_some() {
                        debug!(path = ?field_path, depth, "Expansion depth reached");
                    }
                    leaves.push(ExpandedLeaf {
                        path: field_path,
                        ty: field.ty.clone(),
                        required,
                        description: field.description.clone(),
                    });
                }
            }
        }
    }
}

/// Record type of a parameter, looking through one optional layer.
pub fn record_type_of(param: &ParameterDescriptor) -> Option<&RecordType> {
    param.ty.as_ref()?.unwrap_optional().0.as_record()
}

fn is_optional(param: &ParameterDescriptor) -> bool {
    param.ty.as_ref().is_some_and(|ty| ty.unwrap_optional().1)
}

fn field_is_required(field: &FieldDescriptor) -> bool {
    let optional = field.ty.as_ref().is_some_and(|ty| ty.unwrap_optional().1);
    field.required && field.default.is_unset() && !optional
}

/// Rebuilds record instances from expanded leaf values.
///
/// Leaves are grouped by their root parameter. A group is left alone when the
/// root key is already present and none of its leaves are. Otherwise the
/// leaves are removed and the root key receives:
///
/// - the model default, when no leaf was supplied and a default exists;
/// - `null`, when no leaf was supplied and the root is optional;
/// - the default with the supplied leaves deep-merged on top, when both exist;
/// - otherwise a fresh instance built from the supplied leaves.
///
/// `null` leaf values count as not supplied.
///
/// # Errors
///
/// Propagates record construction errors such as
/// [`SchemaError::MissingRequiredField`](interface_schema_core::SchemaError::MissingRequiredField).
pub fn reconstruct_expanded_models(
    mut args: Map<String, Value>,
    arguments: &[Argument],
) -> Result<Map<String, Value>> {
    for (root, group) in group_expanded(arguments) {
        let Some(model_type) = group[0].original_model_type.as_ref() else {
            continue;
        };
        let supplied = |arg: &&Argument| args.get(&arg.name).is_some_and(|v| !v.is_null());
        if args.contains_key(root) && !group.iter().any(supplied) {
            continue;
        }

        let (values, provided) = collect_model_values(&args, &group);
        let model_default = &group[0].model_default;
        let rebuilt = match (provided, model_default) {
            (false, DefaultValue::Set(default)) => default.clone(),
            (false, DefaultValue::Unset) if group.iter().any(|arg| arg.parent_is_optional) => {
                Value::Null
            }
            (true, DefaultValue::Set(default)) if !default.is_null() => {
                let base = model_type.to_values(default);
                model_type.instantiate(&deep_merge(&base, &values))?
            }
            _ => model_type.instantiate(&values)?,
        };
        debug!(root, provided, null = rebuilt.is_null(), "Reconstructed model");

        for arg in &group {
            args.remove(&arg.name);
        }
        args.insert(root.to_string(), rebuilt);
    }
    Ok(args)
}

fn group_expanded(arguments: &[Argument]) -> Vec<(&str, Vec<&Argument>)> {
    let mut groups: Vec<(&str, Vec<&Argument>)> = Vec::new();
    for arg in arguments {
        let Some(root) = arg.is_expanded_from.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == root) {
            Some((_, members)) => members.push(arg),
            None => groups.push((root, vec![arg])),
        }
    }
    groups
}

fn collect_model_values(args: &Map<String, Value>, group: &[&Argument]) -> (Map<String, Value>, bool) {
    let mut values = Map::new();
    let mut provided = false;

    for arg in group {
        let Some(value) = args.get(&arg.name).filter(|v| !v.is_null()) else {
            continue;
        };
        provided = true;
        let Some((leaf, parents)) = arg.expansion_path.get(1..).and_then(<[String]>::split_last)
        else {
            continue;
        };

        insert_at_path(&mut values, parents, leaf, value.clone());
    }

    (values, provided)
}

/// Inserts `value` under `parents` then `leaf`, replacing non-object
/// intermediates with empty mappings.
fn insert_at_path(values: &mut Map<String, Value>, parents: &[String], leaf: &str, value: Value) {
    let Some((first, rest)) = parents.split_first() else {
        values.insert(leaf.to_string(), value);
        return;
    };
    let entry = values
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    match entry {
        Value::Object(next) => insert_at_path(next, rest, leaf, value),
        other => {
            let mut next = Map::new();
            insert_at_path(&mut next, rest, leaf, value);
            *other = Value::Object(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use interface_schema_core::{ArgumentKind, RecordKind, ValueShape};
    use serde_json::json;

    use super::*;

    fn address() -> RecordType {
        RecordType::new("Address", RecordKind::NativeStruct)
            .with_field(FieldDescriptor::required("city", TypeTag::Str))
            .with_field(FieldDescriptor::with_default("zip", TypeTag::Int, 10001))
    }

    fn user() -> RecordType {
        RecordType::new("User", RecordKind::NativeStruct)
            .with_field(FieldDescriptor::required("name", TypeTag::Str))
            .with_field(FieldDescriptor::with_default(
                "address",
                TypeTag::optional(TypeTag::Record(address())),
                Value::Null,
            ))
    }

    fn leaf_argument(root: &str, path: &[&str], model: &RecordType, optional: bool) -> Argument {
        let name = path.join(".");
        Argument {
            name: name.clone(),
            display_name: name.clone(),
            kind: ArgumentKind::Option,
            value_shape: ValueShape::Single,
            flags: vec![format!("--{name}")],
            required: false,
            default: DefaultValue::Unset,
            help: None,
            ty: None,
            parser: None,
            nargs: None,
            boolean_behavior: None,
            choices: None,
            accepts_stdin: false,
            pipe_required: false,
            is_expanded_from: Some(root.to_string()),
            expansion_path: path.iter().map(|s| s.to_string()).collect(),
            original_model_type: Some(model.clone()),
            parent_is_optional: optional,
            model_default: DefaultValue::Unset,
        }
    }

    fn user_arguments(optional: bool) -> Vec<Argument> {
        let model = user();
        vec![
            leaf_argument("user", &["user", "name"], &model, optional),
            leaf_argument("user", &["user", "address", "city"], &model, optional),
            leaf_argument("user", &["user", "address", "zip"], &model, optional),
        ]
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_requiredness_breaks_at_optional_or_defaulted_fields() {
        let param = ParameterDescriptor::required("user", TypeTag::Record(user()));
        let leaves = ModelExpander::default().expand_parameter(&param).unwrap();
        let required: Vec<(String, bool)> = leaves
            .iter()
            .map(|leaf| (leaf.joined("."), leaf.required))
            .collect();
        assert_eq!(
            required,
            vec![
                ("user.name".to_string(), true),
                ("user.address.city".to_string(), false),
                ("user.address.zip".to_string(), false),
            ]
        );

        let defaulted = ParameterDescriptor::optional("user", TypeTag::Record(user()), json!({}));
        let leaves = ModelExpander::default().expand_parameter(&defaulted).unwrap();
        assert!(leaves.iter().all(|leaf| !leaf.required));
    }

    #[test]
    fn test_depth_limit_emits_record_leaf() {
        let inner = RecordType::new("Inner", RecordKind::NativeStruct)
            .with_field(FieldDescriptor::required("value", TypeTag::Int));
        let middle = RecordType::new("Middle", RecordKind::NativeStruct)
            .with_field(FieldDescriptor::required("inner", TypeTag::Record(inner)));
        let outer = RecordType::new("Outer", RecordKind::NativeStruct)
            .with_field(FieldDescriptor::required("middle", TypeTag::Record(middle)));
        let param = ParameterDescriptor::required("outer", TypeTag::Record(outer));

        let leaves = ModelExpander::new(2).expand_parameter(&param).unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].joined("."), "outer.middle.inner");
        assert!(matches!(leaves[0].ty, Some(TypeTag::Record(_))));

        let leaves = ModelExpander::new(3).expand_parameter(&param).unwrap();
        assert_eq!(leaves[0].joined("."), "outer.middle.inner.value");
    }

    #[test]
    fn test_non_record_parameter_is_not_expanded() {
        let param = ParameterDescriptor::required("count", TypeTag::Int);
        assert!(ModelExpander::default().expand_parameter(&param).is_none());
    }

    #[test]
    fn test_reconstruct_full_instance() {
        let args = object(json!({
            "user.name": "Ada",
            "user.address.city": "London",
            "user.address.zip": 12345,
            "verbose": true
        }));
        let rebuilt = reconstruct_expanded_models(args, &user_arguments(false)).unwrap();
        assert_eq!(
            Value::Object(rebuilt),
            json!({
                "verbose": true,
                "user": {"name": "Ada", "address": {"city": "London", "zip": 12345}}
            })
        );
    }

    #[test]
    fn test_reconstruct_uses_field_defaults_for_missing_leaves() {
        let args = object(json!({"user.name": "Ada", "user.address.city": "Paris"}));
        let rebuilt = reconstruct_expanded_models(args, &user_arguments(false)).unwrap();
        assert_eq!(
            rebuilt["user"],
            json!({"name": "Ada", "address": {"city": "Paris", "zip": 10001}})
        );
    }

    #[test]
    fn test_unsupplied_optional_nested_record_collapses_to_null() {
        let args = object(json!({"user.name": "Ada", "user.address.city": null}));
        let rebuilt = reconstruct_expanded_models(args, &user_arguments(false)).unwrap();
        assert_eq!(rebuilt["user"], json!({"name": "Ada", "address": null}));
        assert!(!rebuilt.contains_key("user.address.city"));
    }

    #[test]
    fn test_optional_root_without_leaves_becomes_null() {
        let rebuilt = reconstruct_expanded_models(Map::new(), &user_arguments(true)).unwrap();
        assert_eq!(rebuilt["user"], Value::Null);
    }

    #[test]
    fn test_required_root_without_leaves_fails_loudly() {
        let err = reconstruct_expanded_models(Map::new(), &user_arguments(false)).unwrap_err();
        assert!(matches!(
            err,
            interface_schema_core::SchemaError::MissingRequiredField { .. }
        ));
    }

    #[test]
    fn test_model_default_merges_single_override() {
        let default = json!({"name": "Ada", "address": {"city": "London", "zip": 1}});
        let mut arguments = user_arguments(false);
        for arg in &mut arguments {
            arg.model_default = DefaultValue::Set(default.clone());
        }

        let args = object(json!({"user.address.zip": 2}));
        let rebuilt = reconstruct_expanded_models(args, &arguments).unwrap();
        assert_eq!(
            rebuilt["user"],
            json!({"name": "Ada", "address": {"city": "London", "zip": 2}})
        );

        let rebuilt = reconstruct_expanded_models(Map::new(), &arguments).unwrap();
        assert_eq!(rebuilt["user"], default);
    }

    #[test]
    fn test_insert_at_path_builds_and_replaces_intermediates() {
        let mut values = Map::new();
        let path = ["address".to_string()];
        insert_at_path(&mut values, &path, "city", json!("Oslo"));
        insert_at_path(&mut values, &path, "zip", json!(150));
        assert_eq!(Value::Object(values.clone()), json!({"address": {"city": "Oslo", "zip": 150}}));

        values.insert("address".to_string(), json!("flat"));
        insert_at_path(&mut values, &path, "city", json!("Bergen"));
        assert_eq!(Value::Object(values), json!({"address": {"city": "Bergen"}}));
    }

    #[test]
    fn test_present_root_without_leaves_is_untouched() {
        let args = object(json!({"user": {"name": "given"}}));
        let rebuilt = reconstruct_expanded_models(args.clone(), &user_arguments(false)).unwrap();
        assert_eq!(rebuilt, args);
    }
}
