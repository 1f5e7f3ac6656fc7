use std::time::Duration;

use swm_core::QueryService;
use swm_core::error::QueryError;
use swm_core::resolve::ResolvedSchema;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn service() -> QueryService {
    QueryService::new(None, Duration::from_secs(5))
}

async fn petstore() -> QueryService {
    let service = service();
    service
        .load_swagger(&fixture("petstore-3.0.yaml"))
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn loads_file_and_reports_counts() {
    let service = service();
    let summary = service
        .load_swagger(&fixture("petstore-3.0.yaml"))
        .await
        .unwrap();

    assert_eq!(summary.title, "Petstore");
    assert_eq!(summary.version, "1.0.4");
    assert_eq!(summary.spec_version, "3.x");
    assert_eq!(summary.operation_count, 4);
    assert_eq!(summary.schema_count, 4);
    assert!(summary.warnings.is_empty());

    let info = service.get_swagger_info().await.unwrap();
    assert_eq!(info.operation_count, 4);
    assert_eq!(info.schema_count, 4);
    assert_eq!(info.base_url.as_deref(), Some("https://petstore.example.com/v2"));
}

#[tokio::test]
async fn loads_v2_document() {
    let service = service();
    let summary = service
        .load_swagger(&fixture("petstore-2.0.json"))
        .await
        .unwrap();

    assert_eq!(summary.spec_version, "2.0");
    assert_eq!(summary.operation_count, 2);
}

#[tokio::test]
async fn reads_fail_before_any_load() {
    let service = service();

    assert!(matches!(
        service.get_swagger_info().await,
        Err(QueryError::NoDocumentLoaded)
    ));
    assert!(matches!(
        service.list_apis(None, None).await,
        Err(QueryError::NoDocumentLoaded)
    ));
    assert!(matches!(
        service.get_api_details("getPetById").await,
        Err(QueryError::NoDocumentLoaded)
    ));
    assert!(matches!(
        service.search_apis("pet").await,
        Err(QueryError::NoDocumentLoaded)
    ));
    assert!(matches!(
        service.list_schemas().await,
        Err(QueryError::NoDocumentLoaded)
    ));
    assert!(matches!(
        service.get_schema_details("Pet").await,
        Err(QueryError::NoDocumentLoaded)
    ));
}

#[tokio::test]
async fn default_source_loads_lazily() {
    let service = QueryService::new(Some(fixture("petstore-3.0.yaml")), Duration::from_secs(5));

    // No explicit load_swagger call; the first read pulls the default.
    let info = service.get_swagger_info().await.unwrap();
    assert_eq!(info.title, "Petstore");
}

#[tokio::test]
async fn failed_reload_keeps_current_document() {
    let service = petstore().await;

    let err = service.load_swagger(&fixture("missing.yaml")).await.unwrap_err();
    assert!(matches!(err, QueryError::Load(_)));

    let info = service.get_swagger_info().await.unwrap();
    assert_eq!(info.title, "Petstore");
    assert_eq!(info.operation_count, 4);
}

#[tokio::test]
async fn reloading_the_same_source_is_idempotent() {
    let service = petstore().await;
    let first = service.list_apis(None, None).await.unwrap();

    service
        .load_swagger(&fixture("petstore-3.0.yaml"))
        .await
        .unwrap();
    let second = service.list_apis(None, None).await.unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn lists_apis_with_filters() {
    let service = petstore().await;

    let all = service.list_apis(None, None).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().any(|e| e.id == "GET /store/inventory"));

    let pets = service.list_apis(Some("PET"), None).await.unwrap();
    assert_eq!(pets.len(), 2);

    let posts = service.list_apis(None, Some("post")).await.unwrap();
    let ids: Vec<&str> = posts.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["addPet", "placeOrder"]);

    let tagged_posts = service.list_apis(Some("store"), Some("POST")).await.unwrap();
    assert_eq!(tagged_posts.len(), 1);
    assert_eq!(tagged_posts[0].id, "placeOrder");
}

#[tokio::test]
async fn api_details_resolve_references() {
    let service = petstore().await;
    let details = service.get_api_details("getPetById").await.unwrap();

    assert_eq!(details.endpoint.method, "GET");
    assert_eq!(details.parameters.len(), 1);
    let param = &details.parameters[0];
    assert_eq!(param.name, "petId");
    assert_eq!(param.location, "path");
    assert!(param.required);

    let ok = details
        .responses
        .iter()
        .find(|r| r.status == "200")
        .unwrap();
    assert_eq!(ok.content_type.as_deref(), Some("application/json"));
    match ok.schema.as_ref().unwrap() {
        ResolvedSchema::Object { name, properties, .. } => {
            assert_eq!(name.as_deref(), Some("Pet"));
            assert!(properties.contains_key("name"));
        }
        other => panic!("expected resolved object, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_lookups_report_not_found() {
    let service = petstore().await;

    assert!(matches!(
        service.get_api_details("nope").await,
        Err(QueryError::OperationNotFound(id)) if id == "nope"
    ));
    assert!(matches!(
        service.get_schema_details("Nope").await,
        Err(QueryError::SchemaNotFound(name)) if name == "Nope"
    ));
}

#[tokio::test]
async fn duplicate_operation_ids_surface_as_warnings() {
    let service = service();
    let summary = service.load_swagger(&fixture("dup-ids.yaml")).await.unwrap();

    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("doThing"));

    let details = service.get_api_details("doThing").await.unwrap();
    assert_eq!(details.endpoint.path, "/b");
}

#[tokio::test]
async fn dangling_references_surface_inline() {
    let service = service();
    service.load_swagger(&fixture("dangling.yaml")).await.unwrap();

    let details = service.get_api_details("listThings").await.unwrap();

    let param = &details.parameters[0];
    assert_eq!(param.location, "unknown");
    assert!(param.schema.as_ref().unwrap().is_unresolved());

    let error_response = details
        .responses
        .iter()
        .find(|r| r.status == "500")
        .unwrap();
    assert!(error_response.schema.as_ref().unwrap().is_unresolved());

    // The rest of the operation still resolves.
    let ok = details
        .responses
        .iter()
        .find(|r| r.status == "200")
        .unwrap();
    match ok.schema.as_ref().unwrap() {
        ResolvedSchema::Object { properties, .. } => {
            assert!(properties["owner"].is_unresolved());
            assert!(!properties["id"].is_unresolved());
        }
        other => panic!("expected resolved object, got {other:?}"),
    }
}

#[tokio::test]
async fn schema_details_mark_cycles() {
    let service = service();
    service.load_swagger(&fixture("cyclic.yaml")).await.unwrap();

    let details = service.get_schema_details("Node").await.unwrap();
    match &details.schema {
        ResolvedSchema::Object { properties, .. } => {
            let ResolvedSchema::Array { items, .. } = &properties["children"] else {
                panic!("expected array of children");
            };
            assert!(items.as_deref().unwrap().is_cyclic());
        }
        other => panic!("expected resolved object, got {other:?}"),
    }
}

#[tokio::test]
async fn searches_and_lists_schemas() {
    let service = petstore().await;

    let schemas = service.list_schemas().await.unwrap();
    let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Pet", "Category", "PetStatus", "Order"]);

    let results = service.search_apis("pet").await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[0].endpoint.as_ref().unwrap().path, "/pet/{petId}");

    let results = service.search_schemas("pet").await.unwrap();
    assert_eq!(results[0].schema.as_ref().unwrap().name, "Pet");
}

#[tokio::test]
async fn loads_documents_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.yaml");
    std::fs::write(
        &path,
        "openapi: 3.0.0\ninfo:\n  title: Minimal\n  version: \"0.1\"\npaths:\n  /ping:\n    get:\n      operationId: ping\n      responses:\n        '200':\n          description: ok\n",
    )
    .unwrap();

    let service = service();
    let summary = service
        .load_swagger(&path.display().to_string())
        .await
        .unwrap();
    assert_eq!(summary.title, "Minimal");
    assert_eq!(summary.operation_count, 1);
}

#[tokio::test]
async fn unreachable_sources_fail_to_load() {
    let service = service();
    let err = service
        .load_swagger("/definitely/not/a/real/path.yaml")
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Load(_)));
}
