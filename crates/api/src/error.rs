//! API error type and database error translation.
//!
//! Every failure a handler can hit ends up here and is rendered as
//! `{"error": "<kind>", "message": "<text>"}` with a matching status.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::{DbError, ErrorClassifier, ErrorKind};
use serde_json::json;
use thiserror::Error;

use crate::schema::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or path failed validation (400).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The database rejected client-supplied data (400).
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    /// The operation is blocked by other rows (409).
    #[error("{message}")]
    Conflict { message: String },

    /// Unclassified database failure (500, logged, detail not exposed).
    #[error("database error: {0}")]
    Database(DbError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate a database failure into an HTTP-facing error.
    ///
    /// `columns` are the columns the failing statement wrote, used to name
    /// the offending field when the server message mentions one.
    pub fn from_db(classifier: &dyn ErrorClassifier, error: DbError, columns: &[String]) -> Self {
        let kind = classifier.classify(&error);
        let message = match &error {
            DbError::Database { message, .. } => message.as_str(),
            _ => "",
        };
        let column = match kind {
            ErrorKind::DuplicateKey => duplicate_key_column(message, columns),
            _ => offending_column(message, columns),
        };

        match kind {
            ErrorKind::DuplicateKey => Self::BadRequest {
                code: "duplicate_key",
                message: match column {
                    Some(c) => format!("{c} must be unique"),
                    None => "duplicate value for a unique field".to_owned(),
                },
            },
            ErrorKind::MissingValue => Self::BadRequest {
                code: "missing_value",
                message: match column {
                    Some(c) => format!("{c} is required"),
                    None => "a required field is missing".to_owned(),
                },
            },
            ErrorKind::MissingReference => Self::BadRequest {
                code: "invalid_reference",
                message: match column {
                    Some(c) => format!("{c} references a row that does not exist"),
                    None => "a referenced row does not exist".to_owned(),
                },
            },
            ErrorKind::UnknownColumn => Self::BadRequest {
                code: "unknown_column",
                message: "request contains a field the table does not have".to_owned(),
            },
            ErrorKind::InvalidValue => Self::BadRequest {
                code: "invalid_value",
                message: match column {
                    Some(c) => format!("invalid value for {c}"),
                    None => "a field has an invalid value".to_owned(),
                },
            },
            ErrorKind::ReferencedRow => Self::Conflict {
                message: "row is referenced by other records".to_owned(),
            },
            ErrorKind::Other => Self::Database(error),
        }
    }
}

/// First written column that the server message names in quotes.
fn offending_column<'a>(message: &str, columns: &'a [String]) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| {
            message.contains(&format!("'{c}'"))
                || message.contains(&format!("`{c}`"))
                || message.contains(&format!(".{c}'"))
        })
        .map(String::as_str)
}

/// Column behind a duplicate-key failure.
///
/// The duplicated value comes first in the message and is client data, so
/// only the key name after `for key '` is trusted. MySQL 8 prefixes it with
/// the table (`users.email`).
fn duplicate_key_column<'a>(message: &str, columns: &'a [String]) -> Option<&'a str> {
    let (_, rest) = message.rsplit_once("for key '")?;
    let key = rest.strip_suffix('\'').unwrap_or(rest);
    let key = key.rsplit('.').next().unwrap_or(key);
    columns.iter().find(|c| c.as_str() == key).map(String::as_str)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            code: "malformed_body",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::BadRequest { code, message } => json!({
                "error": code,
                "message": message
            }),
            Self::Conflict { message } => json!({
                "error": "conflict",
                "message": message
            }),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Error querying database: {}", e);
                json!({
                    "error": "internal_error",
                    "message": "Error querying database"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
