//! Cycle-safe `$ref` resolution over the canonical tree.
//!
//! Resolution is pure: it never mutates the document, so any number of
//! queries can resolve against the same document concurrently. Cycles are
//! cut by tracking the set of schema names currently being expanded in the
//! active call chain; re-entering one yields a `cyclic` marker instead of
//! recursing. A reference to a missing name yields an inline `unresolved`
//! marker, so one bad pointer never poisons the rest of a query.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

use crate::error::ResolveError;
use crate::model::{
    AdditionalProperties, Components, CompositeKind, Document, Parameter, ParameterOrRef,
    RequestBody, RequestBodyOrRef, Response, ResponseOrRef, Schema, SchemaKind, SchemaOrRef,
    TypeSet,
};

/// A fully dereferenced view of a schema. Self-contained: no `$ref` nodes
/// remain, only explicit `cyclic` and `unresolved` markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedSchema {
    Object {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        properties: IndexMap<String, ResolvedSchema>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        additional_properties: Option<Box<ResolvedSchema>>,
    },
    Array {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Box<ResolvedSchema>>,
    },
    Enum {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        schema_type: Option<String>,
        values: Vec<serde_json::Value>,
    },
    Primitive {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        schema_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Composite {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        composite: CompositeKind,
        branches: Vec<ResolvedSchema>,
    },
    /// The schema references itself (directly or transitively) at this
    /// point; expansion stops here.
    Cyclic { name: String },
    /// The reference target does not exist in the document.
    Unresolved { reference: String },
}

impl ResolvedSchema {
    pub fn unresolved(reference: &str) -> Self {
        ResolvedSchema::Unresolved {
            reference: reference.to_string(),
        }
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self, ResolvedSchema::Cyclic { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolvedSchema::Unresolved { .. })
    }
}

/// Extract the name from a `#/components/<section>/Name` pointer.
pub fn parse_ref_name<'a>(
    ref_path: &'a str,
    expected_section: &str,
) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section || name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(ref_path.to_string()));
    }
    Ok(name)
}

/// Resolves references against one immutable document.
pub struct Resolver<'a> {
    components: Option<&'a Components>,
    visiting: HashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            components: document.spec.components.as_ref(),
            visiting: HashSet::new(),
        }
    }

    /// Resolve a named component schema. `None` when the name is absent.
    pub fn resolve_named_schema(&mut self, name: &str) -> Option<ResolvedSchema> {
        let target = self.components?.schemas.get(name)?;
        self.visiting.insert(name.to_string());
        let resolved = match target {
            SchemaOrRef::Schema(schema) => self.resolve_schema(Some(name.to_string()), schema),
            SchemaOrRef::Ref { .. } => self.resolve_schema_or_ref(target),
        };
        self.visiting.remove(name);
        Some(resolved)
    }

    /// Resolve a schema-or-ref node into a dereferenced view.
    pub fn resolve_schema_or_ref(&mut self, node: &SchemaOrRef) -> ResolvedSchema {
        match node {
            SchemaOrRef::Ref { ref_path } => {
                let name = match parse_ref_name(ref_path, "schemas") {
                    Ok(name) => name.to_string(),
                    Err(_) => {
                        warn!("unresolvable reference format: {ref_path}");
                        return ResolvedSchema::unresolved(ref_path);
                    }
                };
                if self.visiting.contains(&name) {
                    return ResolvedSchema::Cyclic { name };
                }
                let Some(target) = self.components.and_then(|c| c.schemas.get(&name)) else {
                    warn!("dangling reference: {ref_path}");
                    return ResolvedSchema::unresolved(ref_path);
                };
                self.visiting.insert(name.clone());
                let resolved = match target {
                    SchemaOrRef::Schema(schema) => self.resolve_schema(Some(name.clone()), schema),
                    SchemaOrRef::Ref { .. } => self.resolve_schema_or_ref(target),
                };
                self.visiting.remove(&name);
                resolved
            }
            SchemaOrRef::Schema(schema) => self.resolve_schema(None, schema),
        }
    }

    fn resolve_schema(&mut self, name: Option<String>, schema: &Schema) -> ResolvedSchema {
        let schema_type = schema
            .schema_type
            .as_ref()
            .and_then(TypeSet::primary)
            .map(str::to_string);

        match schema.kind() {
            SchemaKind::Enum => ResolvedSchema::Enum {
                name,
                schema_type,
                values: schema.enum_values.clone(),
            },
            SchemaKind::Composite => {
                let (composite, branches) = if !schema.all_of.is_empty() {
                    (CompositeKind::AllOf, &schema.all_of)
                } else if !schema.one_of.is_empty() {
                    (CompositeKind::OneOf, &schema.one_of)
                } else {
                    (CompositeKind::AnyOf, &schema.any_of)
                };
                ResolvedSchema::Composite {
                    name,
                    composite,
                    branches: branches
                        .iter()
                        .map(|b| self.resolve_schema_or_ref(b))
                        .collect(),
                }
            }
            SchemaKind::Array => ResolvedSchema::Array {
                name,
                items: schema
                    .items
                    .as_ref()
                    .map(|items| Box::new(self.resolve_schema_or_ref(items))),
            },
            SchemaKind::Object => {
                let properties = schema
                    .properties
                    .iter()
                    .map(|(prop, node)| (prop.clone(), self.resolve_schema_or_ref(node)))
                    .collect();
                let additional_properties = match &schema.additional_properties {
                    Some(AdditionalProperties::Schema(node)) => {
                        Some(Box::new(self.resolve_schema_or_ref(node)))
                    }
                    _ => None,
                };
                ResolvedSchema::Object {
                    name,
                    description: schema.description.clone(),
                    properties,
                    required: schema.required.clone(),
                    additional_properties,
                }
            }
            SchemaKind::Primitive => ResolvedSchema::Primitive {
                name,
                schema_type,
                format: schema.format.clone(),
            },
        }
    }

    /// Follow a `#/components/parameters/Name` pointer.
    pub fn lookup_parameter(&self, ref_path: &str) -> Result<&'a Parameter, ResolveError> {
        let name = parse_ref_name(ref_path, "parameters")?;
        self.components
            .and_then(|c| c.parameters.get(name))
            .and_then(|p| match p {
                ParameterOrRef::Parameter(param) => Some(param),
                ParameterOrRef::Ref { .. } => None,
            })
            .ok_or_else(|| ResolveError::DanglingReference(ref_path.to_string()))
    }

    /// Follow a `#/components/responses/Name` pointer.
    pub fn lookup_response(&self, ref_path: &str) -> Result<&'a Response, ResolveError> {
        let name = parse_ref_name(ref_path, "responses")?;
        self.components
            .and_then(|c| c.responses.get(name))
            .and_then(|r| match r {
                ResponseOrRef::Response(response) => Some(response),
                ResponseOrRef::Ref { .. } => None,
            })
            .ok_or_else(|| ResolveError::DanglingReference(ref_path.to_string()))
    }

    /// Follow a `#/components/requestBodies/Name` pointer.
    pub fn lookup_request_body(&self, ref_path: &str) -> Result<&'a RequestBody, ResolveError> {
        let name = parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(name))
            .and_then(|rb| match rb {
                RequestBodyOrRef::RequestBody(body) => Some(body),
                RequestBodyOrRef::Ref { .. } => None,
            })
            .ok_or_else(|| ResolveError::DanglingReference(ref_path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_component_refs() {
        assert_eq!(
            parse_ref_name("#/components/schemas/Pet", "schemas").unwrap(),
            "Pet"
        );
        assert!(parse_ref_name("#/components/schemas/Pet", "responses").is_err());
        assert!(parse_ref_name("#/definitions/Pet", "schemas").is_err());
        assert!(parse_ref_name("#/components/schemas/", "schemas").is_err());
    }
}
