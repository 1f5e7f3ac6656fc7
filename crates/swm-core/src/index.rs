//! Eager lookup indexes over one normalized document. Built once per load,
//! read-only afterward.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

use crate::model::{Document, Operation, SchemaKind, SchemaOrRef};

/// One addressable endpoint: an operation bound to its path and method,
/// with a guaranteed id.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Declared `operationId`, or a synthesized `"METHOD path"` id.
    pub id: String,
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    pub operation: Operation,
}

/// Summary data for one named component schema.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub name: String,
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub property_names: Vec<String>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Apis,
    Schemas,
}

/// Ranking tier for a search hit. Lower sorts first; declaration order is
/// preserved within a tier, so results are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Prefix,
    Contains,
}

#[derive(Debug, Clone)]
pub enum SearchHit<'a> {
    Endpoint {
        endpoint: &'a Endpoint,
        matched_field: &'static str,
    },
    Schema {
        entry: &'a SchemaEntry,
        matched_field: &'static str,
    },
}

/// Fast lookups over a document: operation by id/tag/path+method, schema by
/// name, and tiered substring search.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    endpoints: Vec<Endpoint>,
    by_id: HashMap<String, usize>,
    by_tag: IndexMap<String, Vec<usize>>,
    by_path_method: HashMap<(String, String), usize>,
    schemas: Vec<SchemaEntry>,
    schema_by_name: HashMap<String, usize>,
    warnings: Vec<String>,
}

impl DocumentIndex {
    pub fn build(document: &Document) -> Self {
        let mut index = DocumentIndex::default();

        for (path, methods) in &document.spec.paths {
            for (method, operation) in methods {
                index.insert_endpoint(path, method, operation);
            }
        }

        if let Some(schemas) = document.schemas() {
            for (name, node) in schemas {
                let entry = build_schema_entry(schemas, name, node);
                index.schema_by_name.insert(name.clone(), index.schemas.len());
                index.schemas.push(entry);
            }
        }

        index
    }

    fn insert_endpoint(&mut self, path: &str, method: &str, operation: &Operation) {
        let method = method.to_uppercase();
        let id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{method} {path}"));

        let slot = self.endpoints.len();
        if let Some(previous) = self.by_id.insert(id.clone(), slot) {
            let earlier = &self.endpoints[previous];
            let message = format!(
                "duplicate operation id `{id}` ({} {} and {method} {path}): later declaration wins",
                earlier.method, earlier.path
            );
            warn!("{message}");
            self.warnings.push(message);
        }

        for tag in &operation.tags {
            self.by_tag
                .entry(tag.to_lowercase())
                .or_default()
                .push(slot);
        }

        self.by_path_method
            .insert((path.to_string(), method.clone()), slot);

        self.endpoints.push(Endpoint {
            id,
            path: path.to_string(),
            method,
            operation: operation.clone(),
        });
    }

    /// All endpoints in declaration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn operation_by_id(&self, id: &str) -> Option<&Endpoint> {
        self.by_id.get(id).map(|&slot| &self.endpoints[slot])
    }

    /// Endpoints carrying the tag (case-insensitive), in declaration order.
    pub fn operations_by_tag(&self, tag: &str) -> Vec<&Endpoint> {
        self.by_tag
            .get(&tag.to_lowercase())
            .map(|slots| slots.iter().map(|&slot| &self.endpoints[slot]).collect())
            .unwrap_or_default()
    }

    /// Exact path template + method lookup; no fuzzy matching.
    pub fn operation_by_path_and_method(&self, path: &str, method: &str) -> Option<&Endpoint> {
        self.by_path_method
            .get(&(path.to_string(), method.to_uppercase()))
            .map(|&slot| &self.endpoints[slot])
    }

    /// All schema entries in declaration order.
    pub fn schemas(&self) -> &[SchemaEntry] {
        &self.schemas
    }

    pub fn schema_entry(&self, name: &str) -> Option<&SchemaEntry> {
        self.schema_by_name
            .get(name)
            .map(|&slot| &self.schemas[slot])
    }

    /// Warnings gathered while building (duplicate operation ids).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Case-insensitive substring search, ranked
    /// exact > prefix > elsewhere, stable within each tier.
    pub fn search(&self, query: &str, scope: SearchScope) -> Vec<SearchHit<'_>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(MatchTier, SearchHit<'_>)> = match scope {
            SearchScope::Apis => self
                .endpoints
                .iter()
                .filter_map(|endpoint| {
                    match_endpoint(endpoint, &needle).map(|(tier, field)| {
                        (
                            tier,
                            SearchHit::Endpoint {
                                endpoint,
                                matched_field: field,
                            },
                        )
                    })
                })
                .collect(),
            SearchScope::Schemas => self
                .schemas
                .iter()
                .filter_map(|entry| {
                    match_schema(entry, &needle).map(|(tier, field)| {
                        (
                            tier,
                            SearchHit::Schema {
                                entry,
                                matched_field: field,
                            },
                        )
                    })
                })
                .collect(),
        };

        // Stable sort keeps declaration order inside each tier.
        ranked.sort_by_key(|(tier, _)| *tier);
        ranked.into_iter().map(|(_, hit)| hit).collect()
    }
}

fn match_endpoint(endpoint: &Endpoint, needle: &str) -> Option<(MatchTier, &'static str)> {
    let id = endpoint.id.to_lowercase();
    let path = endpoint.path.to_lowercase();

    if id == *needle {
        return Some((MatchTier::Exact, "operation_id"));
    }
    if path == *needle {
        return Some((MatchTier::Exact, "path"));
    }
    if path.trim_start_matches('/').starts_with(needle) {
        return Some((MatchTier::Prefix, "path"));
    }
    if id.starts_with(needle) {
        return Some((MatchTier::Prefix, "operation_id"));
    }
    if path.contains(needle) {
        return Some((MatchTier::Contains, "path"));
    }
    if id.contains(needle) {
        return Some((MatchTier::Contains, "operation_id"));
    }

    let op = &endpoint.operation;
    if contains(&op.summary, needle) {
        return Some((MatchTier::Contains, "summary"));
    }
    if contains(&op.description, needle) {
        return Some((MatchTier::Contains, "description"));
    }
    if op.tags.iter().any(|t| t.to_lowercase().contains(needle)) {
        return Some((MatchTier::Contains, "tags"));
    }
    None
}

fn match_schema(entry: &SchemaEntry, needle: &str) -> Option<(MatchTier, &'static str)> {
    let name = entry.name.to_lowercase();
    if name == *needle {
        return Some((MatchTier::Exact, "name"));
    }
    if name.starts_with(needle) {
        return Some((MatchTier::Prefix, "name"));
    }
    if name.contains(needle) {
        return Some((MatchTier::Contains, "name"));
    }
    if entry
        .property_names
        .iter()
        .any(|p| p.to_lowercase().contains(needle))
    {
        return Some((MatchTier::Contains, "properties"));
    }
    None
}

fn contains(field: &Option<String>, needle: &str) -> bool {
    field
        .as_ref()
        .is_some_and(|text| text.to_lowercase().contains(needle))
}

fn build_schema_entry(
    schemas: &IndexMap<String, SchemaOrRef>,
    name: &str,
    node: &SchemaOrRef,
) -> SchemaEntry {
    let resolved = follow_ref_chain(schemas, node);

    match resolved {
        Some(schema) => SchemaEntry {
            name: name.to_string(),
            kind: schema.kind(),
            description: schema.description.clone(),
            property_names: schema.properties.keys().cloned().collect(),
            required: schema.required.clone(),
        },
        // Dangling alias or a pure ref cycle; degrade to primitive.
        None => SchemaEntry {
            name: name.to_string(),
            kind: SchemaKind::Primitive,
            description: None,
            property_names: Vec::new(),
            required: Vec::new(),
        },
    }
}

/// Follow a chain of top-level `$ref` aliases to the first inline schema.
fn follow_ref_chain<'a>(
    schemas: &'a IndexMap<String, SchemaOrRef>,
    node: &'a SchemaOrRef,
) -> Option<&'a crate::model::Schema> {
    let mut seen = HashSet::new();
    let mut current = node;
    loop {
        match current {
            SchemaOrRef::Schema(schema) => return Some(schema),
            SchemaOrRef::Ref { ref_path } => {
                let name = crate::resolve::parse_ref_name(ref_path, "schemas").ok()?;
                if !seen.insert(name.to_string()) {
                    return None;
                }
                current = schemas.get(name)?;
            }
        }
    }
}
