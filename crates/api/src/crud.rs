//! Generic CRUD router factory.
//!
//! `crud_router(backend, schema)` mounts five handlers for one table:
//!
//! | method   | path   | success            | not found  |
//! |----------|--------|--------------------|------------|
//! | `GET`    | `/`    | 200, all rows      |            |
//! | `GET`    | `/:id` | 200, `[row]`       | 404, `[]`  |
//! | `POST`   | `/`    | 201, `[new row]`   |            |
//! | `PATCH`  | `/:id` | 200, `[row]`       | 404, `[]`  |
//! | `DELETE` | `/:id` | 200, `[]`          | 404, `[]`  |
//!
//! Successful bodies are always arrays. Writes are followed by a separate
//! read-back by id; the two statements do not share a transaction.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use db::{DbError, Row};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::query::{format_insert, format_update};
use crate::schema::{TableSchema, ValidationError};
use crate::state::Backend;

type RowsResponse = (StatusCode, Json<Vec<Row>>);

#[derive(Clone)]
struct CrudState {
    backend: Backend,
    schema: Arc<TableSchema>,
}

impl CrudState {
    async fn fetch(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        self.backend.pool.execute(sql, params).await?.into_rows()
    }

    async fn fetch_by_id(&self, id: Value) -> Result<Vec<Row>, DbError> {
        self.fetch(&self.schema.queries().select_by_id, &[id]).await
    }

    fn db_error(&self, error: DbError, columns: &[String]) -> ApiError {
        ApiError::from_db(self.backend.classifier.as_ref(), error, columns)
    }
}

/// Build the list/get/create/update/delete routes for `schema`'s table.
pub fn crud_router(backend: Backend, schema: TableSchema) -> Router {
    let state = CrudState {
        backend,
        schema: Arc::new(schema),
    };

    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).patch(update).delete(remove))
        .with_state(state)
}

fn not_found() -> RowsResponse {
    (StatusCode::NOT_FOUND, Json(Vec::new()))
}

/// Ids are integer primary keys; anything else can't name a row.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn into_object(body: Value) -> Result<Map<String, Value>, ValidationError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotAnObject),
    }
}

#[instrument(skip_all, fields(table = %state.schema.name()))]
async fn list(State(state): State<CrudState>) -> Result<RowsResponse, ApiError> {
    let rows = state
        .fetch(&state.schema.queries().select_all, &[])
        .await
        .map_err(|e| state.db_error(e, &[]))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[instrument(skip_all, fields(table = %state.schema.name(), id = %id))]
async fn get_one(
    State(state): State<CrudState>,
    Path(id): Path<String>,
) -> Result<RowsResponse, ApiError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found());
    };
    let rows = state
        .fetch_by_id(id.into())
        .await
        .map_err(|e| state.db_error(e, &[]))?;

    if rows.is_empty() {
        return Ok(not_found());
    }
    Ok((StatusCode::OK, Json(rows)))
}

#[instrument(skip_all, fields(table = %state.schema.name()))]
async fn create(
    State(state): State<CrudState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<RowsResponse, ApiError> {
    let Json(body) = body?;
    let body = state.schema.prepare_insert(into_object(body)?)?;
    let parts = format_insert(&body);
    let sql = state.schema.insert_sql(&parts);

    let inserted = async {
        let output = state.backend.pool.execute(&sql, &parts.values).await?;
        let id = output.last_insert_id()?;
        debug!(id, "row inserted");
        state.fetch_by_id(id.into()).await
    }
    .await
    .map_err(|e| state.db_error(e, &parts.columns))?;

    Ok((StatusCode::CREATED, Json(inserted)))
}

#[instrument(skip_all, fields(table = %state.schema.name(), id = %id))]
async fn update(
    State(state): State<CrudState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<RowsResponse, ApiError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found());
    };
    let Json(body) = body?;
    let body = state.schema.prepare_update(into_object(body)?)?;
    let parts = format_update(&body, id);
    let sql = state.schema.update_sql(&parts);

    let affected = async {
        state
            .backend
            .pool
            .execute(&sql, &parts.values)
            .await?
            .affected_rows()
    }
    .await
    .map_err(|e| state.db_error(e, &parts.columns))?;

    if affected == 0 {
        return Ok(not_found());
    }

    let rows = state
        .fetch_by_id(id.into())
        .await
        .map_err(|e| state.db_error(e, &parts.columns))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[instrument(skip_all, fields(table = %state.schema.name(), id = %id))]
async fn remove(
    State(state): State<CrudState>,
    Path(id): Path<String>,
) -> Result<RowsResponse, ApiError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found());
    };
    let affected = async {
        state
            .backend
            .pool
            .execute(&state.schema.queries().delete_by_id, &[id.into()])
            .await?
            .affected_rows()
    }
    .await
    .map_err(|e| state.db_error(e, &[]))?;

    if affected == 0 {
        return Ok(not_found());
    }
    Ok((StatusCode::OK, Json(Vec::new())))
}
