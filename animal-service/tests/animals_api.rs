//! End-to-end tests of the HTTP surface against the in-memory store

use std::sync::Arc;

use animal_service::prelude::*;
use animal_service::repository::{RepositoryOperation, UpdateOutcome};
use animal_service::server::with_middleware;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(Config::default(), Arc::new(MemoryAnimalStore::new()));
    router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Bytes) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes)
}

fn json_of(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

/// Store whose every call fails with a message naming the operation
struct FailingStore;

#[async_trait]
impl AnimalStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn find_all(&self, _filter: &AnimalFilter) -> RepositoryResult<Vec<Animal>> {
        Err(RepositoryError::database_error(
            RepositoryOperation::FindAll,
            "find_all failed",
        ))
    }

    async fn find_one(&self, _filter: &AnimalFilter) -> RepositoryResult<Option<Animal>> {
        Err(RepositoryError::database_error(
            RepositoryOperation::FindOne,
            "find_one failed",
        ))
    }

    async fn insert_one(&self, _animal: NewAnimal) -> RepositoryResult<AnimalId> {
        Err(RepositoryError::database_error(
            RepositoryOperation::InsertOne,
            "insert_one failed",
        ))
    }

    async fn update_one(
        &self,
        _id: &AnimalId,
        _patch: &AnimalPatch,
    ) -> RepositoryResult<UpdateOutcome> {
        Err(RepositoryError::database_error(
            RepositoryOperation::UpdateOne,
            "update_one failed",
        ))
    }

    async fn delete_one(&self, _id: &AnimalId) -> RepositoryResult<u64> {
        Err(RepositoryError::database_error(
            RepositoryOperation::DeleteOne,
            "delete_one failed",
        ))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Err(RepositoryError::database_error(
            RepositoryOperation::Ping,
            "server selection timeout",
        ))
    }
}

fn failing_app() -> Router {
    router(AppState::new(Config::default(), Arc::new(FailingStore)))
}

fn rex() -> Value {
    json!({
        "name": "Rex",
        "owner": "Ana",
        "type": "dog",
        "age": 4,
        "castrated": true,
        "surgery": "2024-01-15T09:30:00Z"
    })
}

async fn create(app: &Router, body: Value) -> String {
    let (status, bytes) = send(app, Method::POST, "/api/v1/", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    json_of(&bytes)["_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn list_on_empty_collection_returns_empty_array() {
    let app = app();
    let (status, bytes) = send(&app, Method::GET, "/api/v1/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!([]));
}

#[tokio::test]
async fn list_without_trailing_slash_is_served() {
    let app = app();
    create(&app, rex()).await;

    let (status, bytes) = send(&app, Method::GET, "/api/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_then_get_returns_same_fields() {
    let app = app();
    let id = create(&app, rex()).await;
    assert_eq!(id.len(), 24);

    let (status, bytes) = send(&app, Method::GET, &format!("/api/v1/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let animal = json_of(&bytes);
    assert_eq!(animal["_id"], id.as_str());
    assert_eq!(animal["name"], "Rex");
    assert_eq!(animal["owner"], "Ana");
    assert_eq!(animal["type"], "dog");
    assert_eq!(animal["age"], 4);
    assert_eq!(animal["castrated"], true);

    let surgery: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(animal["surgery"].clone()).unwrap();
    assert_eq!(surgery.to_rfc3339(), "2024-01-15T09:30:00+00:00");
}

#[tokio::test]
async fn create_fills_missing_fields_with_zero_values() {
    let app = app();
    let id = create(&app, json!({ "name": "Mia", "owner": "Bia" })).await;

    let (_, bytes) = send(&app, Method::GET, &format!("/api/v1/{id}"), None).await;
    let animal = json_of(&bytes);
    assert_eq!(animal["type"], "");
    assert_eq!(animal["age"], 0);
    assert_eq!(animal["castrated"], false);
}

#[tokio::test]
async fn create_duplicate_owner_and_name_is_rejected() {
    let app = app();
    create(&app, rex()).await;

    let (status, bytes) = send(&app, Method::POST, "/api/v1/", Some(rex())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "this animal already exists" })
    );

    let (_, bytes) = send(&app, Method::GET, "/api/v1/", None).await;
    assert_eq!(json_of(&bytes).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_same_name_for_other_owner_is_allowed() {
    let app = app();
    create(&app, rex()).await;

    let mut other = rex();
    other["owner"] = json!("Caio");
    create(&app, other).await;
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = json_of(&bytes);
    assert_eq!(body["code"], 400);
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn create_with_wrong_field_type_is_bad_request() {
    let app = app();
    let (status, bytes) = send(
        &app,
        Method::POST,
        "/api/v1/",
        Some(json!({ "name": "Rex", "owner": "Ana", "age": "four" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);
}

#[tokio::test]
async fn create_without_json_content_type_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/")
        .body(Body::from(rex().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_with_malformed_id_is_bad_request() {
    let app = app();
    let (status, bytes) = send(&app, Method::GET, "/api/v1/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);
}

#[tokio::test]
async fn get_with_invalid_utf8_id_is_json_bad_request() {
    let app = app();
    let (status, bytes) = send(&app, Method::GET, "/api/v1/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json_of(&bytes);
    assert_eq!(body["code"], 400);
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn get_absent_id_is_404_with_empty_body() {
    let app = app();
    let (status, bytes) = send(
        &app,
        Method::GET,
        "/api/v1/65a1f0c2e4b0a1b2c3d4e5f6",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let app = app();
    let id = create(&app, rex()).await;

    let (status, bytes) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/{id}"),
        Some(json!({ "age": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!({ "_id": id.as_str() }));

    let (_, bytes) = send(&app, Method::GET, &format!("/api/v1/{id}"), None).await;
    let mut expected = rex();
    expected["age"] = json!(5);
    let animal = json_of(&bytes);
    for key in ["name", "owner", "type", "age", "castrated"] {
        assert_eq!(animal[key], expected[key], "{key}");
    }
}

#[tokio::test]
async fn update_absent_id_is_404_with_message() {
    let app = app();
    let (status, bytes) = send(
        &app,
        Method::PUT,
        "/api/v1/65a1f0c2e4b0a1b2c3d4e5f6",
        Some(json!({ "age": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 404, "msg": "animal not found" })
    );
}

#[tokio::test]
async fn update_with_malformed_id_is_bad_request() {
    let app = app();
    let (status, _) = send(&app, Method::PUT, "/api/v1/xyz", Some(json!({ "age": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_with_unknown_field_is_bad_request() {
    let app = app();
    let id = create(&app, rex()).await;

    let (status, bytes) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/{id}"),
        Some(json!({ "color": "brown" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);
}

#[tokio::test]
async fn update_cannot_change_id() {
    let app = app();
    let id = create(&app, rex()).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/{id}"),
        Some(json!({ "_id": "65a1f0c2e4b0a1b2c3d4e5f6" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_with_empty_body_is_bad_request() {
    let app = app();
    let id = create(&app, rex()).await;

    let (status, bytes) = send(&app, Method::PUT, &format!("/api/v1/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "no fields to update" })
    );
}

#[tokio::test]
async fn update_onto_existing_owner_and_name_is_rejected() {
    let app = app();
    create(&app, rex()).await;
    let mut mia = rex();
    mia["name"] = json!("Mia");
    let mia_id = create(&app, mia).await;

    let (status, bytes) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/{mia_id}"),
        Some(json!({ "name": "Rex" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["msg"], "this animal already exists");
}

#[tokio::test]
async fn delete_reports_count_and_removes_record() {
    let app = app();
    let id = create(&app, rex()).await;
    let uri = format!("/api/v1/{id}");

    let (status, bytes) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!({ "deleted_count": 1 }));

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, bytes) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!({ "deleted_count": 0 }));
}

#[tokio::test]
async fn delete_with_malformed_id_is_bad_request() {
    let app = app();
    let (status, bytes) = send(&app, Method::DELETE, "/api/v1/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);
}

#[tokio::test]
async fn update_and_delete_with_invalid_utf8_id_are_json_bad_request() {
    let app = app();

    let (status, bytes) = send(
        &app,
        Method::PUT,
        "/api/v1/%C0%AF",
        Some(json!({ "age": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);

    let (status, bytes) = send(&app, Method::DELETE, "/api/v1/%C0%AF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&bytes)["code"], 400);
}

#[tokio::test]
async fn store_failures_are_reported_as_400_with_store_text() {
    let app = failing_app();
    let id = "65a1f0c2e4b0a1b2c3d4e5f6";

    let (status, bytes) = send(&app, Method::GET, "/api/v1/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "find_all failed" })
    );

    let (status, bytes) = send(&app, Method::GET, &format!("/api/v1/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "find_one failed" })
    );

    // The duplicate check is the first store call on create
    let (status, bytes) = send(&app, Method::POST, "/api/v1/", Some(rex())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "find_one failed" })
    );

    let (status, bytes) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/{id}"),
        Some(json!({ "age": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "find_one failed" })
    );

    let (status, bytes) = send(&app, Method::DELETE, &format!("/api/v1/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&bytes),
        json!({ "code": 400, "msg": "delete_one failed" })
    );
}

#[tokio::test]
async fn ready_is_503_when_store_ping_fails() {
    let app = failing_app();

    let (status, bytes) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let body = json_of(&bytes);
    assert_eq!(body["ready"], false);
    assert_eq!(body["store"]["backend"], "failing");
    assert_eq!(body["store"]["healthy"], false);

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_and_ready_are_ok_with_memory_store() {
    let app = app();

    let (status, bytes) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes)["status"], "healthy");

    let (status, bytes) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_of(&bytes);
    assert_eq!(body["ready"], true);
    assert_eq!(body["store"]["backend"], "memory");
}

#[tokio::test]
async fn middleware_stack_keeps_api_behaviour() {
    let app = with_middleware(app(), &MiddlewareConfig::default());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
