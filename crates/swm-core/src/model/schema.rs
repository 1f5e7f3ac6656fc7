use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The `type` keyword: a single type name or (3.1) an array of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeSet {
    /// The first non-`null` type name, used for kind classification.
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeSet::Single(t) => Some(t.as_str()),
            TypeSet::Multiple(ts) => ts
                .iter()
                .map(String::as_str)
                .find(|t| *t != "null")
                .or_else(|| ts.first().map(String::as_str)),
        }
    }
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// An inline schema node in the canonical tree, trimmed to the fields the
/// query surface exposes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

/// Which composition keyword a composite schema uses. Branches are exposed
/// unmerged; no flattening strategy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeKind {
    #[serde(rename = "allOf")]
    AllOf,
    #[serde(rename = "oneOf")]
    OneOf,
    #[serde(rename = "anyOf")]
    AnyOf,
}

impl CompositeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeKind::AllOf => "allOf",
            CompositeKind::OneOf => "oneOf",
            CompositeKind::AnyOf => "anyOf",
        }
    }
}

/// Coarse classification of a schema definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    Primitive,
    Enum,
    Composite,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::Primitive => "primitive",
            SchemaKind::Enum => "enum",
            SchemaKind::Composite => "composite",
        }
    }
}

impl Schema {
    pub fn composite_kind(&self) -> Option<CompositeKind> {
        if !self.all_of.is_empty() {
            Some(CompositeKind::AllOf)
        } else if !self.one_of.is_empty() {
            Some(CompositeKind::OneOf)
        } else if !self.any_of.is_empty() {
            Some(CompositeKind::AnyOf)
        } else {
            None
        }
    }

    pub fn kind(&self) -> SchemaKind {
        if !self.enum_values.is_empty() {
            SchemaKind::Enum
        } else if self.composite_kind().is_some() {
            SchemaKind::Composite
        } else {
            match self.schema_type.as_ref().and_then(TypeSet::primary) {
                Some("array") => SchemaKind::Array,
                Some("object") => SchemaKind::Object,
                Some(_) => SchemaKind::Primitive,
                None if !self.properties.is_empty() || self.additional_properties.is_some() => {
                    SchemaKind::Object
                }
                None if self.items.is_some() => SchemaKind::Array,
                None => SchemaKind::Primitive,
            }
        }
    }
}
