//! Version normalization: detect Swagger 2.0 vs OpenAPI 3.x and lift both
//! into one canonical, 3.x-shaped tree before typed deserialization.
//!
//! All version-specific logic lives here. Downstream components (resolver,
//! index, query service) only ever see the canonical shape.

use log::warn;
use serde_json::{Map, Value, json};

use crate::error::NormalizeError;
use crate::model::{CanonicalSpec, Document, HTTP_METHODS, SpecVersion};

/// Normalize a raw tree into a [`Document`].
pub fn normalize(mut tree: Value, source: &str) -> Result<Document, NormalizeError> {
    let (version, declared) = detect_version(&tree)?;

    if let Value::Object(root) = &mut tree {
        flatten_path_items(root);
        if version == SpecVersion::V2 {
            lift_v2(root);
        }
        hoist_required_booleans(&mut tree);
    }

    let spec: CanonicalSpec = serde_json::from_value(tree)?;

    Ok(Document {
        source: source.to_string(),
        version,
        declared_version: declared,
        spec,
    })
}

/// Detect the spec dialect from the top-level version key.
pub fn detect_version(tree: &Value) -> Result<(SpecVersion, String), NormalizeError> {
    let root = match tree.as_object() {
        Some(root) => root,
        None => return Err(NormalizeError::UnknownSpecVersion),
    };

    if let Some(value) = root.get("swagger") {
        let declared = version_string(value);
        if declared == "2.0" || declared == "2" {
            return Ok((SpecVersion::V2, declared));
        }
        return Err(NormalizeError::UnsupportedVersion(declared));
    }

    if let Some(value) = root.get("openapi") {
        let declared = version_string(value);
        if declared.starts_with("3.0") || declared.starts_with("3.1") {
            return Ok((SpecVersion::V3, declared));
        }
        return Err(NormalizeError::UnsupportedVersion(declared));
    }

    Err(NormalizeError::UnknownSpecVersion)
}

/// YAML inputs may carry the version as a bare number (`swagger: 2.0`).
fn version_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten every path item to a plain `method -> operation` map, merging
/// path-level parameters into each operation. Operation-level parameters
/// keep priority over path-level ones with the same name and location.
fn flatten_path_items(root: &mut Map<String, Value>) {
    let Some(Value::Object(paths)) = root.get_mut("paths") else {
        return;
    };

    for (path, item) in paths.iter_mut() {
        let Value::Object(item_map) = item else {
            warn!("path item {path} is not an object, dropping");
            *item = Value::Object(Map::new());
            continue;
        };

        let shared_params = match item_map.remove("parameters") {
            Some(Value::Array(params)) => params,
            _ => Vec::new(),
        };

        let mut methods = Map::new();
        for method in HTTP_METHODS {
            let Some(mut op) = item_map.remove(method) else {
                continue;
            };
            if let Value::Object(op_map) = &mut op {
                merge_shared_parameters(op_map, &shared_params);
                methods.insert(method.to_string(), op);
            }
        }
        *item = Value::Object(methods);
    }
}

fn merge_shared_parameters(op: &mut Map<String, Value>, shared: &[Value]) {
    if shared.is_empty() {
        return;
    }

    let params = op
        .entry("parameters")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(params) = params else {
        return;
    };

    for candidate in shared {
        let duplicate = param_key(candidate)
            .map(|key| params.iter().any(|p| param_key(p) == Some(key.clone())))
            .unwrap_or(false);
        if !duplicate {
            params.push(candidate.clone());
        }
    }
}

fn param_key(param: &Value) -> Option<(String, String)> {
    let name = param.get("name")?.as_str()?;
    let location = param.get("in")?.as_str()?;
    Some((name.to_string(), location.to_string()))
}

/// Rewrite a Swagger 2.0 root (paths already flattened) into 3.x shape.
fn lift_v2(root: &mut Map<String, Value>) {
    let consumes = string_list(root.remove("consumes"));
    let produces = string_list(root.remove("produces"));

    lift_v2_servers(root);
    lift_v2_components(root);

    if let Some(Value::Object(paths)) = root.get_mut("paths") {
        for item in paths.values_mut() {
            let Value::Object(methods) = item else {
                continue;
            };
            for op in methods.values_mut() {
                if let Value::Object(op_map) = op {
                    lift_v2_operation(op_map, &consumes, &produces);
                }
            }
        }
    }

    for value in root.values_mut() {
        rewrite_refs(value);
    }
}

/// `host` + `basePath` + `schemes` fold into a single `servers[0].url`.
fn lift_v2_servers(root: &mut Map<String, Value>) {
    let host = root.remove("host");
    let base_path = root
        .remove("basePath")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let scheme = match root.remove("schemes") {
        Some(Value::Array(schemes)) => schemes
            .first()
            .and_then(|s| s.as_str().map(str::to_string))
            .unwrap_or_else(|| "https".to_string()),
        _ => "https".to_string(),
    };

    let url = match host.as_ref().and_then(|h| h.as_str()) {
        Some(host) => format!("{scheme}://{host}{base_path}"),
        None if !base_path.is_empty() => base_path,
        None => return,
    };

    root.insert("servers".to_string(), json!([{ "url": url }]));
}

/// `definitions` and top-level `parameters`/`responses` move under
/// `components`.
fn lift_v2_components(root: &mut Map<String, Value>) {
    let mut components = Map::new();

    if let Some(definitions) = root.remove("definitions") {
        components.insert("schemas".to_string(), definitions);
    }

    if let Some(Value::Object(params)) = root.remove("parameters") {
        let mut lifted = Map::new();
        for (name, mut param) in params {
            if param.get("in").and_then(|v| v.as_str()) == Some("body") {
                // A body component parameter has no 3.x equivalent under
                // components/parameters. Refs to it resolve as dangling.
                warn!("dropping 2.0 body parameter component {name}");
                continue;
            }
            if let Value::Object(param_map) = &mut param {
                wrap_bare_parameter_type(param_map);
            }
            lifted.insert(name, param);
        }
        components.insert("parameters".to_string(), Value::Object(lifted));
    }

    if let Some(Value::Object(responses)) = root.remove("responses") {
        let mut lifted = Map::new();
        for (name, mut response) in responses {
            if let Value::Object(response_map) = &mut response {
                wrap_v2_response_schema(response_map, "application/json");
            }
            lifted.insert(name, response);
        }
        components.insert("responses".to_string(), Value::Object(lifted));
    }

    if !components.is_empty() {
        root.insert("components".to_string(), Value::Object(components));
    }
}

fn lift_v2_operation(op: &mut Map<String, Value>, root_consumes: &[String], root_produces: &[String]) {
    let consumes = {
        let own = string_list(op.remove("consumes"));
        if own.is_empty() { root_consumes.to_vec() } else { own }
    };
    let produces = {
        let own = string_list(op.remove("produces"));
        if own.is_empty() { root_produces.to_vec() } else { own }
    };

    lift_v2_parameters(op, &consumes);

    let produce_ct = produces
        .first()
        .cloned()
        .unwrap_or_else(|| "application/json".to_string());
    if let Some(Value::Object(responses)) = op.get_mut("responses") {
        for response in responses.values_mut() {
            if let Value::Object(response_map) = response {
                wrap_v2_response_schema(response_map, &produce_ct);
            }
        }
    }
}

/// Split 2.0 parameters: `in: body` becomes a synthesized request body,
/// `in: formData` folds into a urlencoded request body object schema, and
/// the rest get their bare type keywords wrapped into a `schema` object.
fn lift_v2_parameters(op: &mut Map<String, Value>, consumes: &[String]) {
    let Some(Value::Array(params)) = op.remove("parameters") else {
        return;
    };

    let mut kept = Vec::new();
    let mut body: Option<Map<String, Value>> = None;
    let mut form_props = Map::new();
    let mut form_required = Vec::new();

    for mut param in params {
        let location = param.get("in").and_then(|v| v.as_str()).unwrap_or("");
        match location {
            "body" => {
                if let Value::Object(param_map) = param {
                    body = Some(param_map);
                }
            }
            "formData" => {
                if let Value::Object(mut param_map) = param {
                    let name = param_map
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    if param_map.get("required").and_then(|v| v.as_bool()) == Some(true) {
                        form_required.push(Value::String(name.clone()));
                    }
                    wrap_bare_parameter_type(&mut param_map);
                    let schema = param_map
                        .remove("schema")
                        .unwrap_or_else(|| json!({ "type": "string" }));
                    form_props.insert(name, schema);
                }
            }
            _ => {
                if let Value::Object(param_map) = &mut param {
                    wrap_bare_parameter_type(param_map);
                }
                kept.push(param);
            }
        }
    }

    if !kept.is_empty() {
        op.insert("parameters".to_string(), Value::Array(kept));
    }

    if let Some(mut body) = body {
        let content_type = consumes
            .first()
            .cloned()
            .unwrap_or_else(|| "application/json".to_string());
        let schema = body.remove("schema").unwrap_or_else(|| json!({}));
        let mut request_body = Map::new();
        if let Some(description) = body.remove("description") {
            request_body.insert("description".to_string(), description);
        }
        if let Some(required) = body.remove("required") {
            request_body.insert("required".to_string(), required);
        }
        request_body.insert(
            "content".to_string(),
            json!({ content_type: { "schema": schema } }),
        );
        op.insert("requestBody".to_string(), Value::Object(request_body));
    } else if !form_props.is_empty() {
        op.insert(
            "requestBody".to_string(),
            json!({
                "required": !form_required.is_empty(),
                "content": {
                    "application/x-www-form-urlencoded": {
                        "schema": {
                            "type": "object",
                            "properties": form_props,
                            "required": form_required,
                        }
                    }
                }
            }),
        );
    }
}

/// Move 2.0 bare type keywords on a parameter into a nested `schema`.
fn wrap_bare_parameter_type(param: &mut Map<String, Value>) {
    if param.contains_key("schema") || !param.contains_key("type") {
        return;
    }

    let mut schema = Map::new();
    for key in ["type", "format", "items", "enum", "default", "pattern"] {
        if let Some(value) = param.remove(key) {
            schema.insert(key.to_string(), value);
        }
    }
    param.insert("schema".to_string(), Value::Object(schema));
}

/// 2.0 response `schema` wraps into `content` keyed by the produced type.
fn wrap_v2_response_schema(response: &mut Map<String, Value>, content_type: &str) {
    if let Some(schema) = response.remove("schema") {
        response.insert(
            "content".to_string(),
            json!({ content_type: { "schema": schema } }),
        );
    }
}

/// Rewrite 2.0 reference prefixes to their 3.x `#/components/...` form
/// everywhere in the tree.
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get_mut("$ref") {
                for (from, to) in [
                    ("#/definitions/", "#/components/schemas/"),
                    ("#/parameters/", "#/components/parameters/"),
                    ("#/responses/", "#/components/responses/"),
                ] {
                    if let Some(rest) = target.strip_prefix(from) {
                        *target = format!("{to}{rest}");
                        break;
                    }
                }
            }
            for nested in map.values_mut() {
                rewrite_refs(nested);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}

/// A boolean `required` directly on a property schema is a 2.0-era field
/// shape; hoist it into the parent object's `required` array.
fn hoist_required_booleans(tree: &mut Value) {
    match tree {
        Value::Object(map) => {
            let mut hoisted = Vec::new();
            if let Some(Value::Object(properties)) = map.get_mut("properties") {
                for (name, prop) in properties.iter_mut() {
                    if let Value::Object(prop_map) = prop {
                        if let Some(Value::Bool(flag)) = prop_map.get("required").cloned() {
                            prop_map.remove("required");
                            if flag {
                                hoisted.push(name.clone());
                            }
                        }
                    }
                }
            }
            if !hoisted.is_empty() {
                let required = map
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(required) = required {
                    for name in hoisted {
                        let entry = Value::String(name);
                        if !required.contains(&entry) {
                            required.push(entry);
                        }
                    }
                }
            }
            for nested in map.values_mut() {
                hoist_required_booleans(nested);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(hoist_required_booleans),
        _ => {}
    }
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_v2_and_v3() {
        let (v, s) = detect_version(&json!({ "swagger": "2.0" })).unwrap();
        assert_eq!(v, SpecVersion::V2);
        assert_eq!(s, "2.0");

        let (v, _) = detect_version(&json!({ "openapi": "3.1.0" })).unwrap();
        assert_eq!(v, SpecVersion::V3);
    }

    #[test]
    fn detects_numeric_swagger_version() {
        let (v, _) = detect_version(&json!({ "swagger": 2.0 })).unwrap();
        assert_eq!(v, SpecVersion::V2);
    }

    #[test]
    fn rejects_unknown_and_unsupported() {
        assert!(matches!(
            detect_version(&json!({ "info": {} })),
            Err(NormalizeError::UnknownSpecVersion)
        ));
        assert!(matches!(
            detect_version(&json!({ "openapi": "4.0.0" })),
            Err(NormalizeError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            detect_version(&json!({ "swagger": "1.2" })),
            Err(NormalizeError::UnsupportedVersion(_))
        ));
    }
}
