//! Reflected-callable descriptors and the declared-type model.
//!
//! These types are the input boundary of the workspace: a reflection adapter
//! produces them once per callable, and the builder only ever reads them. They
//! deserialize from JSON so descriptors can be produced by any tool.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A declared parameter or field type.
///
/// # Examples
///
/// ```
/// use interface_schema_core::TypeTag;
///
/// let ty = TypeTag::optional(TypeTag::list_of(TypeTag::Int));
/// let (inner, optional) = ty.unwrap_optional();
/// assert!(optional);
/// assert_eq!(inner.list_item(), Some(&TypeTag::Int));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeTag {
    /// Text.
    Str,
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean.
    Bool,
    /// Filesystem path, kept as text.
    Path,
    /// The unit "no value" type, used inside unions.
    #[serde(rename = "none")]
    NoneType,
    /// No constraint.
    Any,
    /// Variable-length homogeneous list. `item: None` is a bare list.
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<Box<TypeTag>>,
    },
    /// Fixed-length tuple, one type per position.
    Tuple { items: Vec<TypeTag> },
    /// Optional wrapper.
    Optional { inner: Box<TypeTag> },
    /// Union of alternatives, tried in order.
    Union { variants: Vec<TypeTag> },
    /// One of a fixed set of literal strings.
    Literal { values: Vec<String> },
    /// Named enumeration.
    Enum { name: String, variants: Vec<String> },
    /// Structured record with named sub-fields.
    Record(RecordType),
    /// Any other type, resolved by name through the type converter.
    Named { name: String },
}

impl TypeTag {
    /// `list[item]`.
    pub fn list_of(item: TypeTag) -> Self {
        Self::List {
            item: Some(Box::new(item)),
        }
    }

    /// `inner | None`.
    pub fn optional(inner: TypeTag) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    /// Removes one layer of optional wrapping.
    ///
    /// Both `Optional { inner }` and a two-member union with
    /// [`TypeTag::NoneType`] count as optional. Returns the inner type and
    /// whether a layer was removed.
    pub fn unwrap_optional(&self) -> (&TypeTag, bool) {
        match self {
            Self::Optional { inner } => (inner.as_ref(), true),
            Self::Union { variants } if variants.len() == 2 => {
                match variants.iter().position(|v| *v == Self::NoneType) {
                    Some(none_at) => (&variants[1 - none_at], true),
                    None => (self, false),
                }
            }
            _ => (self, false),
        }
    }

    /// Returns `true` for [`TypeTag::Bool`].
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns `true` for a list type (not looking through optional).
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List { .. })
    }

    /// Element type of a list, `None` for a bare list.
    pub fn list_item(&self) -> Option<&TypeTag> {
        match self {
            Self::List { item } => item.as_deref(),
            _ => None,
        }
    }

    /// Returns the record definition for record types.
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Enumerated allowed values, looking through one optional layer.
    pub fn choices(&self) -> Option<Vec<String>> {
        match self.unwrap_optional().0 {
            Self::Enum { variants, .. } => Some(variants.clone()),
            Self::Literal { values } => Some(values.clone()),
            _ => None,
        }
    }

    /// Checks whether an already-converted value fits this type.
    ///
    /// Used by validated records. Named and `any` types accept everything.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Str | Self::Path => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::NoneType => value.is_null(),
            Self::Any | Self::Named { .. } => true,
            Self::List { item } => match value.as_array() {
                Some(values) => item
                    .as_deref()
                    .is_none_or(|item| values.iter().all(|v| item.accepts(v))),
                None => false,
            },
            Self::Tuple { items } => value.as_array().is_some_and(|values| {
                values.len() == items.len() && items.iter().zip(values).all(|(t, v)| t.accepts(v))
            }),
            Self::Optional { inner } => value.is_null() || inner.accepts(value),
            Self::Union { variants } => variants.iter().any(|v| v.accepts(value)),
            Self::Literal { values } | Self::Enum {
                variants: values, ..
            } => value
                .as_str()
                .is_some_and(|s| values.iter().any(|choice| choice == s)),
            Self::Record(_) => value.is_object(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => f.write_str("str"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Path => f.write_str("path"),
            Self::NoneType => f.write_str("None"),
            Self::Any => f.write_str("any"),
            Self::List { item: None } => f.write_str("list"),
            Self::List { item: Some(item) } => write!(f, "list[{item}]"),
            Self::Tuple { items } => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "tuple[{}]", items.join(", "))
            }
            Self::Optional { inner } => write!(f, "{inner} | None"),
            Self::Union { variants } => {
                let variants: Vec<String> = variants.iter().map(ToString::to_string).collect();
                f.write_str(&variants.join(" | "))
            }
            Self::Literal { values } => write!(f, "Literal[{}]", values.join(", ")),
            Self::Enum { name, .. } | Self::Named { name } => f.write_str(name),
            Self::Record(record) => f.write_str(&record.name),
        }
    }
}

/// A default that distinguishes "never declared" from an explicit `None`.
///
/// Serializes as the bare value; fields holding it are skipped when unset.
///
/// # Examples
///
/// ```
/// use interface_schema_core::DefaultValue;
/// use serde_json::Value;
///
/// assert!(DefaultValue::Unset.is_unset());
/// assert!(DefaultValue::Set(Value::Null).is_explicit_none());
/// assert_eq!(DefaultValue::from(3).value(), Some(&Value::from(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    /// No default was ever declared.
    #[default]
    Unset,
    /// A declared default, possibly `null`.
    Set(Value),
}

impl DefaultValue {
    /// Returns `true` when no default was declared.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns `true` when a default (even `null`) was declared.
    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    /// Returns `true` for a declared `null` default.
    pub fn is_explicit_none(&self) -> bool {
        matches!(self, Self::Set(Value::Null))
    }

    /// The declared value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Set(value)
    }
}

macro_rules! default_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DefaultValue {
                fn from(value: $ty) -> Self {
                    Self::Set(Value::from(value))
                }
            }
        )*
    };
}

default_value_from!(bool, i32, i64, u32, u64, f64, &str, String);

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Set(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Set)
    }
}

/// How a parameter binds at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Ordinary parameter (positional or keyword).
    #[default]
    #[serde(alias = "normal")]
    PositionalOrKeyword,
    /// Positional-only parameter.
    PositionalOnly,
    /// Keyword-only parameter.
    KeywordOnly,
    /// `*args`-style collector.
    VarPositional,
    /// `**kwargs`-style collector.
    VarKeyword,
}

/// One reflected parameter of a callable.
///
/// # Examples
///
/// ```
/// use interface_schema_core::{ParameterDescriptor, TypeTag};
///
/// let name = ParameterDescriptor::required("name", TypeTag::Str);
/// assert!(name.required);
/// assert!(name.default.is_unset());
///
/// let count = ParameterDescriptor::optional("count", TypeTag::Int, 1);
/// assert!(!count.required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Identifier as declared.
    pub name: String,
    /// Declared type, absent for untyped parameters.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeTag>,
    /// Whether the caller must supply a value.
    #[serde(default)]
    pub required: bool,
    /// Declared default.
    #[serde(default, skip_serializing_if = "DefaultValue::is_unset")]
    pub default: DefaultValue,
    /// Documentation for the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Binding kind.
    #[serde(default)]
    pub kind: ParameterKind,
}

impl ParameterDescriptor {
    /// A required, typed parameter without a default.
    pub fn required(name: &str, ty: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            ty: Some(ty),
            required: true,
            default: DefaultValue::Unset,
            description: None,
            kind: ParameterKind::default(),
        }
    }

    /// An optional, typed parameter with a declared default.
    pub fn optional(name: &str, ty: TypeTag, default: impl Into<DefaultValue>) -> Self {
        Self {
            required: false,
            default: default.into(),
            ..Self::required(name, ty)
        }
    }

    /// A required parameter without a type annotation.
    pub fn untyped(name: &str) -> Self {
        Self {
            ty: None,
            ..Self::required(name, TypeTag::Any)
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the binding kind.
    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns `true` when a type annotation is present.
    pub fn is_typed(&self) -> bool {
        self.ty.is_some()
    }
}

/// A named sub-field of a [`RecordType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type, absent when unannotated.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeTag>,
    /// Whether construction needs a value for this field.
    #[serde(default)]
    pub required: bool,
    /// Per-field default.
    #[serde(default, skip_serializing_if = "DefaultValue::is_unset")]
    pub default: DefaultValue,
    /// Field documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// A required field.
    pub fn required(name: &str, ty: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            ty: Some(ty),
            required: true,
            default: DefaultValue::Unset,
            description: None,
        }
    }

    /// A field with a default value.
    pub fn with_default(name: &str, ty: TypeTag, default: impl Into<DefaultValue>) -> Self {
        Self {
            required: false,
            default: default.into(),
            ..Self::required(name, ty)
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Which family of record a [`RecordType`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A plain class whose constructor parameters double as fields.
    PlainRecord,
    /// A schema object that validates field values on construction.
    ValidatedRecord,
    /// A structured data class.
    #[default]
    NativeStruct,
}

/// A type with a fixed, named set of typed sub-fields.
///
/// # Examples
///
/// ```
/// use interface_schema_core::{FieldDescriptor, RecordKind, RecordType, TypeTag};
///
/// let user = RecordType::new("User", RecordKind::NativeStruct)
///     .with_field(FieldDescriptor::required("name", TypeTag::Str))
///     .with_field(FieldDescriptor::with_default("age", TypeTag::Int, 30));
///
/// assert_eq!(user.field_list().len(), 2);
/// assert!(user.field("age").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    /// Type name.
    pub name: String,
    /// Record family.
    #[serde(default)]
    pub kind: RecordKind,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl RecordType {
    /// Creates an empty record type.
    pub fn new(name: &str, kind: RecordKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Fields in declaration order.
    pub fn field_list(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A reflected free function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

impl FunctionDescriptor {
    /// Creates a function descriptor.
    pub fn new(name: &str, parameters: Vec<ParameterDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            parameters,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A reflected method together with what is known about its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Owning class name.
    pub owner: String,
    /// Already bound to an instance; no constructor arguments needed.
    #[serde(default)]
    pub bound: bool,
    /// Constructor parameters of the owner, `None` when it has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_parameters: Option<Vec<ParameterDescriptor>>,
}

/// A reflected class (or an already constructed instance of one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Constructor parameters, `None` when the class declares no constructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_parameters: Option<Vec<ParameterDescriptor>>,
    /// Public methods in declaration order.
    #[serde(default)]
    pub methods: Vec<FunctionDescriptor>,
    /// The descriptor stands for a constructed instance.
    #[serde(default)]
    pub initialized: bool,
}

impl ClassDescriptor {
    /// Creates a class descriptor without constructor or methods.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            constructor_parameters: None,
            methods: Vec::new(),
            initialized: false,
        }
    }

    /// Sets the constructor parameters.
    pub fn with_constructor(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.constructor_parameters = Some(parameters);
        self
    }

    /// Appends a method.
    pub fn with_method(mut self, method: FunctionDescriptor) -> Self {
        self.methods.push(method);
        self
    }
}

/// Any reflected object the builder can turn into a command.
///
/// Unknown `kind` tags deserialize to [`CallableDescriptor::Unsupported`],
/// which the builder rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallableDescriptor {
    Function(FunctionDescriptor),
    Method(MethodDescriptor),
    Class(ClassDescriptor),
    #[serde(other)]
    Unsupported,
}

impl CallableDescriptor {
    /// Declared name, or `None` for unsupported objects.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function(f) => Some(&f.name),
            Self::Method(m) => Some(&m.name),
            Self::Class(c) => Some(&c.name),
            Self::Unsupported => None,
        }
    }

    /// Declared documentation.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Function(f) => f.description.as_deref(),
            Self::Method(m) => m.description.as_deref(),
            Self::Class(c) => c.description.as_deref(),
            Self::Unsupported => None,
        }
    }
}
