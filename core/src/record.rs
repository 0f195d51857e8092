//! Record construction from flat field-value mappings.
//!
//! A record instance is a JSON object keyed by field name. Construction
//! applies per-field defaults, collapses unsupplied optional nested records to
//! `null`, and recurses into nested record fields so partial overrides compose
//! at every level.

use serde_json::{Map, Value};

use crate::{FieldDescriptor, RecordKind, RecordType, Result, SchemaError};

/// Recursively merges `updates` on top of `base`.
///
/// Nested objects present on both sides are merged key by key; any other
/// value in `updates` replaces the one in `base`.
///
/// # Examples
///
/// ```
/// use interface_schema_core::deep_merge;
/// use serde_json::json;
///
/// let base = json!({"name": "Tess", "address": {"city": "Austin", "zip": 78701}});
/// let updates = json!({"address": {"zip": 73301}});
/// let merged = deep_merge(base.as_object().unwrap(), updates.as_object().unwrap());
///
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"name": "Tess", "address": {"city": "Austin", "zip": 73301}})
/// );
/// ```
pub fn deep_merge(base: &Map<String, Value>, updates: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in updates {
        match (merged.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                *existing = deep_merge(existing, update);
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

impl RecordType {
    /// Builds an instance from supplied field values.
    ///
    /// Fields missing from `values` take their declared default, or `null`
    /// when they are not required.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::MissingRequiredField`] when a required field has no
    ///   value and no default.
    /// - [`SchemaError::UnexpectedField`] when a plain record receives a key
    ///   that is not one of its constructor parameters.
    /// - [`SchemaError::InvalidFieldValue`] when a validated record receives a
    ///   value that does not fit the field type.
    ///
    /// # Examples
    ///
    /// ```
    /// use interface_schema_core::{FieldDescriptor, RecordKind, RecordType, TypeTag};
    /// use serde_json::json;
    ///
    /// let user = RecordType::new("User", RecordKind::NativeStruct)
    ///     .with_field(FieldDescriptor::required("name", TypeTag::Str))
    ///     .with_field(FieldDescriptor::with_default("age", TypeTag::Int, 30));
    ///
    /// let values = json!({"name": "Ada"});
    /// let instance = user.instantiate(values.as_object().unwrap()).unwrap();
    /// assert_eq!(instance, json!({"name": "Ada", "age": 30}));
    ///
    /// assert!(user.instantiate(&serde_json::Map::new()).is_err());
    /// ```
    pub fn instantiate(&self, values: &Map<String, Value>) -> Result<Value> {
        if self.kind == RecordKind::PlainRecord {
            if let Some(unknown) = values.keys().find(|key| self.field(key).is_none()) {
                return Err(SchemaError::UnexpectedField {
                    record: self.name.clone(),
                    field: unknown.clone(),
                });
            }
        }

        let mut instance = Map::new();
        for field in &self.fields {
            let value = match values.get(&field.name) {
                Some(value) => self.coerce_field(field, value)?,
                None => match field.default.value() {
                    Some(default) => default.clone(),
                    None if field.required => {
                        return Err(SchemaError::MissingRequiredField {
                            record: self.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    None => Value::Null,
                },
            };

            if self.kind == RecordKind::ValidatedRecord {
                self.validate_field(field, &value)?;
            }
            instance.insert(field.name.clone(), value);
        }

        Ok(Value::Object(instance))
    }

    /// Converts an instance back into a field-value mapping.
    ///
    /// `null` (an absent optional record) yields an empty mapping.
    pub fn to_values(&self, instance: &Value) -> Map<String, Value> {
        match instance {
            Value::Object(values) => values.clone(),
            _ => Map::new(),
        }
    }

    fn coerce_field(&self, field: &FieldDescriptor, value: &Value) -> Result<Value> {
        let Some(ty) = &field.ty else {
            return Ok(value.clone());
        };
        let (inner, optional) = ty.unwrap_optional();
        match (inner.as_record(), value) {
            (Some(record), Value::Object(provided)) => {
                if provided.is_empty() && optional {
                    return Ok(Value::Null);
                }
                let values = match field.default.value() {
                    Some(Value::Object(default)) => deep_merge(default, provided),
                    _ => provided.clone(),
                };
                record.instantiate(&values)
            }
            _ => Ok(value.clone()),
        }
    }

    fn validate_field(&self, field: &FieldDescriptor, value: &Value) -> Result<()> {
        let Some(ty) = &field.ty else {
            return Ok(());
        };
        if value.is_null() && !field.required {
            return Ok(());
        }
        if ty.accepts(value) {
            Ok(())
        } else {
            Err(SchemaError::InvalidFieldValue {
                record: self.name.clone(),
                field: field.name.clone(),
                expected: ty.to_string(),
            })
        }
    }
}
