//! Router-level tests for the generic CRUD factory.
//!
//! Each test mounts a table over a scripted `MockPool` and drives the axum
//! router in-process, so no MySQL server is required.

use std::sync::Arc;

use api::{build_router, Backend, TableSchema};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use db::mock::MockPool;
use db::DbError;
use serde_json::{json, Value};
use tower::ServiceExt;

fn users_app(pool: &Arc<MockPool>) -> Router {
    build_router(
        Backend::mysql(pool.clone()),
        vec![TableSchema::new("users").columns(["name", "email"])],
    )
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ============================================================
// Happy paths
// ============================================================

#[tokio::test]
async fn list_returns_all_rows() {
    let pool = Arc::new(MockPool::new().then_rows(vec![json!({ "id": 1, "name": "Mary" })]));

    let (status, body) = send(users_app(&pool), "GET", "/api/v1/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1, "name": "Mary" }]));

    let calls = pool.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sql, "SELECT * FROM `users`;");
    assert!(calls[0].params.is_empty());
}

#[tokio::test]
async fn list_of_empty_table_is_empty_array() {
    let pool = Arc::new(MockPool::new().then_rows(vec![]));

    let (status, body) = send(users_app(&pool), "GET", "/api/v1/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn get_returns_row_as_array() {
    let pool = Arc::new(MockPool::new().then_rows(vec![json!({ "id": 1, "name": "Mary" })]));

    let (status, body) = send(users_app(&pool), "GET", "/api/v1/users/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1, "name": "Mary" }]));

    let calls = pool.recorded();
    assert_eq!(calls[0].sql, "SELECT * FROM `users` WHERE id = ?;");
    assert_eq!(calls[0].params, vec![json!(1)]);
}

#[tokio::test]
async fn get_missing_row_is_404_with_empty_array() {
    let pool = Arc::new(MockPool::new().then_rows(vec![]));

    let (status, body) = send(users_app(&pool), "GET", "/api/v1/users/9999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_inserts_then_reads_back() {
    let pool = Arc::new(
        MockPool::new()
            .then_write(1, 1)
            .then_rows(vec![json!({ "id": 1, "name": "Mary" })]),
    );

    let (status, body) = send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!({ "name": "Mary" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!([{ "id": 1, "name": "Mary" }]));

    let calls = pool.recorded();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].sql, "INSERT INTO `users` (`name`) VALUES (?);");
    assert_eq!(calls[0].params, vec![json!("Mary")]);
    assert_eq!(calls[1].sql, "SELECT * FROM `users` WHERE id = ?;");
    assert_eq!(calls[1].params, vec![json!(1)]);
}

#[tokio::test]
async fn create_uses_body_key_order() {
    let pool = Arc::new(
        MockPool::new()
            .then_write(1, 5)
            .then_rows(vec![json!({ "id": 5, "name": "Mary", "email": "m@x.io" })]),
    );

    send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!({ "email": "m@x.io", "name": "Mary" })),
    )
    .await;

    let calls = pool.recorded();
    assert_eq!(
        calls[0].sql,
        "INSERT INTO `users` (`email`, `name`) VALUES (?, ?);"
    );
    assert_eq!(calls[0].params, vec![json!("m@x.io"), json!("Mary")]);
    assert_eq!(calls[1].params, vec![json!(5)]);
}

#[tokio::test]
async fn update_writes_present_columns_then_reads_back() {
    let pool = Arc::new(
        MockPool::new()
            .then_write(1, 0)
            .then_rows(vec![json!({ "id": 1, "name": "Mary" })]),
    );

    let (status, body) = send(
        users_app(&pool),
        "PATCH",
        "/api/v1/users/1",
        Some(json!({ "name": "Mary" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1, "name": "Mary" }]));

    let calls = pool.recorded();
    assert_eq!(calls[0].sql, "UPDATE `users` SET `name` = ? WHERE id = ?;");
    assert_eq!(calls[0].params, vec![json!("Mary"), json!(1)]);
    assert_eq!(calls[1].params, vec![json!(1)]);
}

#[tokio::test]
async fn update_of_missing_row_skips_read_back() {
    let pool = Arc::new(MockPool::new().then_write(0, 0));

    let (status, body) = send(
        users_app(&pool),
        "PATCH",
        "/api/v1/users/9999",
        Some(json!({ "name": "Nobody" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!([]));
    assert_eq!(pool.call_count(), 1);
}

#[tokio::test]
async fn delete_returns_empty_array() {
    let pool = Arc::new(MockPool::new().then_write(1, 0));

    let (status, body) = send(users_app(&pool), "DELETE", "/api/v1/users/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let calls = pool.recorded();
    assert_eq!(calls[0].sql, "DELETE FROM `users` WHERE id = ?;");
    assert_eq!(calls[0].params, vec![json!(1)]);
}

#[tokio::test]
async fn delete_of_missing_row_is_404() {
    let pool = Arc::new(MockPool::new().then_write(0, 0));

    let (status, body) = send(users_app(&pool), "DELETE", "/api/v1/users/9999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!([]));
}

// ============================================================
// Database failures
// ============================================================

#[tokio::test]
async fn list_failure_is_generic_500() {
    let pool = Arc::new(MockPool::new().then_error(DbError::database(
        2013,
        "Lost connection to MySQL server during query",
    )));

    let (status, body) = send(users_app(&pool), "GET", "/api/v1/users", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Error querying database");
}

#[tokio::test]
async fn every_operation_survives_a_failing_pool() {
    let cases = [
        ("GET", "/api/v1/users", None),
        ("GET", "/api/v1/users/1", None),
        ("POST", "/api/v1/users", Some(json!({ "name": "Mary" }))),
        ("PATCH", "/api/v1/users/1", Some(json!({ "name": "Mary" }))),
        ("DELETE", "/api/v1/users/1", None),
    ];

    for (method, uri, body) in cases {
        // An empty script makes every statement fail.
        let pool = Arc::new(MockPool::new());
        let (status, body) = send(users_app(&pool), method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(body["error"], "internal_error", "{method} {uri}");
    }
}

#[tokio::test]
async fn duplicate_key_on_create_names_the_column() {
    let pool = Arc::new(MockPool::new().then_error(DbError::database(
        1062,
        "Duplicate entry 'm@x.io' for key 'users.email'",
    )));

    let (status, body) = send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!({ "name": "Mary", "email": "m@x.io" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "duplicate_key");
    assert_eq!(body["message"], "email must be unique");
    assert_eq!(pool.call_count(), 1);
}

#[tokio::test]
async fn duplicate_key_on_update_names_the_column() {
    let pool = Arc::new(MockPool::new().then_error(DbError::database(
        1062,
        "Duplicate entry 'name' for key 'users.email'",
    )));

    let (status, body) = send(
        users_app(&pool),
        "PATCH",
        "/api/v1/users/3",
        Some(json!({ "name": "Mary", "email": "name" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "duplicate_key");
    assert_eq!(body["message"], "email must be unique");
    assert_eq!(pool.call_count(), 1);
}

#[tokio::test]
async fn failed_read_back_after_insert_is_500() {
    let pool = Arc::new(
        MockPool::new()
            .then_write(1, 1)
            .then_error(DbError::database(2013, "Lost connection to MySQL server")),
    );

    let (status, body) = send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!({ "name": "Mary" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Error querying database");

    let calls = pool.recorded();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].sql, "SELECT * FROM `users` WHERE id = ?;");
    assert_eq!(calls[1].params, vec![json!(1)]);
}

#[tokio::test]
async fn failed_read_back_after_update_is_500() {
    let pool = Arc::new(
        MockPool::new()
            .then_write(1, 0)
            .then_error(DbError::database(2013, "Lost connection to MySQL server")),
    );

    let (status, body) = send(
        users_app(&pool),
        "PATCH",
        "/api/v1/users/7",
        Some(json!({ "email": "m@x.io" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Error querying database");

    let calls = pool.recorded();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].params, vec![json!(7)]);
}

#[tokio::test]
async fn delete_of_referenced_row_is_409() {
    let pool = Arc::new(MockPool::new().then_error(DbError::database(
        1451,
        "Cannot delete or update a parent row: a foreign key constraint fails",
    )));

    let (status, body) = send(users_app(&pool), "DELETE", "/api/v1/users/1", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

// ============================================================
// Request validation
// ============================================================

#[tokio::test]
async fn unknown_columns_never_reach_the_database() {
    let pool = Arc::new(MockPool::new());

    let (status, body) = send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!({ "name": "Mary", "is_admin": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "unknown field 'is_admin'");
    assert_eq!(pool.call_count(), 0);
}

#[tokio::test]
async fn id_cannot_be_written_through_the_body() {
    let pool = Arc::new(MockPool::new());

    let (status, _) = send(
        users_app(&pool),
        "PATCH",
        "/api/v1/users/1",
        Some(json!({ "id": 2 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(pool.call_count(), 0);
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let pool = Arc::new(MockPool::new());

    let (status, body) = send(users_app(&pool), "POST", "/api/v1/users", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "request body must contain at least one field");
    assert_eq!(pool.call_count(), 0);
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let pool = Arc::new(MockPool::new());

    let (status, body) = send(
        users_app(&pool),
        "POST",
        "/api/v1/users",
        Some(json!(["Mary"])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "request body must be a JSON object");
}

#[tokio::test]
async fn malformed_json_is_a_json_400() {
    let pool = Arc::new(MockPool::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = users_app(&pool).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_body");
    assert_eq!(pool.call_count(), 0);
}

#[tokio::test]
async fn non_integer_id_is_404_without_a_query() {
    for (method, body) in [
        ("GET", None),
        ("PATCH", Some(json!({ "name": "Mary" }))),
        ("DELETE", None),
    ] {
        for uri in ["/api/v1/users/abc", "/api/v1/users/99999999999999999999"] {
            let pool = Arc::new(MockPool::new());
            let (status, body) = send(users_app(&pool), method, uri, body.clone()).await;

            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(body, json!([]), "{method} {uri}");
            assert_eq!(pool.call_count(), 0, "{method} {uri}");
        }
    }
}
