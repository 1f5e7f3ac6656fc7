use serde_json::json;
use swm_core::loader::parse_document;
use swm_core::model::{
    Operation, Parameter, ParameterOrRef, RequestBody, RequestBodyOrRef, SchemaOrRef, SpecVersion,
};
use swm_core::normalize::normalize;
use swm_core::{Document, NormalizeError};

const PETSTORE_V3: &str = include_str!("fixtures/petstore-3.0.yaml");
const PETSTORE_V2: &str = include_str!("fixtures/petstore-2.0.json");

fn load(name: &str, text: &str) -> Document {
    let tree = parse_document(text).unwrap();
    normalize(tree, name).unwrap()
}

fn operation<'a>(doc: &'a Document, path: &str, method: &str) -> &'a Operation {
    &doc.spec.paths[path][method]
}

fn inline_param(node: &ParameterOrRef) -> &Parameter {
    match node {
        ParameterOrRef::Parameter(param) => param,
        ParameterOrRef::Ref { ref_path } => panic!("unexpected parameter ref {ref_path}"),
    }
}

fn inline_body(node: &RequestBodyOrRef) -> &RequestBody {
    match node {
        RequestBodyOrRef::RequestBody(body) => body,
        RequestBodyOrRef::Ref { ref_path } => panic!("unexpected request body ref {ref_path}"),
    }
}

#[test]
fn normalizes_v3_document() {
    let doc = load("petstore-3.0.yaml", PETSTORE_V3);

    assert_eq!(doc.version, SpecVersion::V3);
    assert_eq!(doc.declared_version, "3.0.3");
    assert_eq!(doc.title(), "Petstore");
    assert_eq!(doc.api_version(), "1.0.4");
    assert_eq!(doc.base_url(), Some("https://petstore.example.com/v2"));
    assert_eq!(doc.operation_count(), 4);
    assert_eq!(doc.schema_count(), 4);
}

#[test]
fn folds_v2_host_into_servers() {
    let doc = load("petstore-2.0.json", PETSTORE_V2);

    assert_eq!(doc.version, SpecVersion::V2);
    assert_eq!(doc.declared_version, "2.0");
    assert_eq!(doc.base_url(), Some("https://petstore.example.com/v2"));
    assert_eq!(doc.operation_count(), 2);
}

#[test]
fn lifts_v2_body_parameter_into_request_body() {
    let doc = load("petstore-2.0.json", PETSTORE_V2);
    let op = operation(&doc, "/pet", "post");

    assert!(op.parameters.is_empty());
    let body = inline_body(op.request_body.as_ref().unwrap());
    assert!(body.required);
    let media = &body.content["application/json"];
    assert_eq!(
        media.schema,
        Some(SchemaOrRef::Ref {
            ref_path: "#/components/schemas/Pet".to_string()
        })
    );
}

#[test]
fn v2_body_parameter_matches_v3_request_body() {
    let v2 = load("petstore-2.0.json", PETSTORE_V2);
    let v3 = load("petstore-3.0.yaml", PETSTORE_V3);

    let v2_body = inline_body(operation(&v2, "/pet", "post").request_body.as_ref().unwrap());
    let v3_body = inline_body(operation(&v3, "/pet", "post").request_body.as_ref().unwrap());
    assert_eq!(v2_body, v3_body);
}

#[test]
fn wraps_bare_v2_parameter_types() {
    let v2 = load("petstore-2.0.json", PETSTORE_V2);
    let v3 = load("petstore-3.0.yaml", PETSTORE_V3);

    let v2_op = operation(&v2, "/pet/{petId}", "get");
    let v3_op = operation(&v3, "/pet/{petId}", "get");
    assert_eq!(v2_op.parameters, v3_op.parameters);

    let param = inline_param(&v2_op.parameters[0]);
    assert_eq!(param.name, "petId");
    assert!(param.required);
    assert!(param.schema.is_some());
}

#[test]
fn wraps_v2_response_schema_and_rewrites_refs() {
    let doc = load("petstore-2.0.json", PETSTORE_V2);
    let op = operation(&doc, "/pet/{petId}", "get");

    let ok = match &op.responses["200"] {
        swm_core::model::ResponseOrRef::Response(response) => response,
        other => panic!("unexpected response node {other:?}"),
    };
    assert_eq!(
        ok.content["application/json"].schema,
        Some(SchemaOrRef::Ref {
            ref_path: "#/components/schemas/Pet".to_string()
        })
    );
}

#[test]
fn moves_v2_definitions_under_components() {
    let doc = load("petstore-2.0.json", PETSTORE_V2);
    let schemas = doc.schemas().unwrap();

    assert!(schemas.contains_key("Pet"));
    assert!(schemas.contains_key("Category"));

    let pet = match &schemas["Pet"] {
        SchemaOrRef::Schema(schema) => schema,
        other => panic!("unexpected schema node {other:?}"),
    };
    assert_eq!(
        pet.properties["category"],
        SchemaOrRef::Ref {
            ref_path: "#/components/schemas/Category".to_string()
        }
    );
}

#[test]
fn hoists_boolean_required_fields() {
    let doc = load("petstore-2.0.json", PETSTORE_V2);
    let pet = match &doc.schemas().unwrap()["Pet"] {
        SchemaOrRef::Schema(schema) => schema,
        other => panic!("unexpected schema node {other:?}"),
    };

    assert_eq!(pet.required, vec!["name".to_string()]);
    let name = match &pet.properties["name"] {
        SchemaOrRef::Schema(schema) => schema,
        other => panic!("unexpected schema node {other:?}"),
    };
    assert!(name.schema_type.is_some());
}

#[test]
fn merges_path_level_parameters_into_operations() {
    let text = r#"
openapi: 3.0.0
info:
  title: T
  version: "1"
paths:
  /items/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: string
      - name: verbose
        in: query
        schema:
          type: boolean
    get:
      operationId: getItem
      parameters:
        - name: verbose
          in: query
          description: overridden
          schema:
            type: string
      responses:
        '200':
          description: ok
"#;
    let doc = load("inline", text);
    let op = operation(&doc, "/items/{id}", "get");

    assert_eq!(op.parameters.len(), 2);
    // Operation-level declaration wins over the shared one.
    let verbose = inline_param(&op.parameters[0]);
    assert_eq!(verbose.name, "verbose");
    assert_eq!(verbose.description.as_deref(), Some("overridden"));
    let id = inline_param(&op.parameters[1]);
    assert_eq!(id.name, "id");
    assert!(id.required);
}

#[test]
fn folds_v2_form_data_into_request_body() {
    let tree = json!({
        "swagger": "2.0",
        "info": { "title": "T", "version": "1" },
        "paths": {
            "/login": {
                "post": {
                    "operationId": "login",
                    "parameters": [
                        { "name": "username", "in": "formData", "required": true, "type": "string" },
                        { "name": "password", "in": "formData", "required": true, "type": "string", "format": "password" }
                    ],
                    "responses": { "200": { "description": "ok" } }
                }
            }
        }
    });
    let doc = normalize(tree, "inline").unwrap();
    let op = operation(&doc, "/login", "post");

    assert!(op.parameters.is_empty());
    let body = inline_body(op.request_body.as_ref().unwrap());
    assert!(body.required);
    let media = &body.content["application/x-www-form-urlencoded"];
    let schema = match media.schema.as_ref().unwrap() {
        SchemaOrRef::Schema(schema) => schema,
        other => panic!("unexpected schema node {other:?}"),
    };
    assert!(schema.properties.contains_key("username"));
    assert!(schema.properties.contains_key("password"));
    assert_eq!(schema.required, vec!["username", "password"]);
}

#[test]
fn rejects_unsupported_and_unknown_versions() {
    let err = normalize(json!({ "openapi": "4.0.0", "info": {} }), "inline").unwrap_err();
    assert!(matches!(err, NormalizeError::UnsupportedVersion(v) if v == "4.0.0"));

    let err = normalize(json!({ "info": { "title": "T" } }), "inline").unwrap_err();
    assert!(matches!(err, NormalizeError::UnknownSpecVersion));
}
