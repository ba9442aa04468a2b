//! The `ConnectionPool` trait — the only thing the HTTP layer knows about
//! the database.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::DbError;

/// A single result row, keyed by column name in select-list order.
pub type Row = Map<String, Value>;

/// What a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Result set of a `SELECT`.
    Rows(Vec<Row>),
    /// Outcome of an `INSERT`, `UPDATE` or `DELETE`.
    Write {
        affected_rows: u64,
        /// Auto-increment id generated by an `INSERT`; `0` otherwise.
        last_insert_id: u64,
    },
}

impl QueryOutput {
    pub fn into_rows(self) -> Result<Vec<Row>, DbError> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Write { .. } => Err(DbError::UnexpectedOutput { expected: "rows" }),
        }
    }

    pub fn affected_rows(&self) -> Result<u64, DbError> {
        match self {
            Self::Write { affected_rows, .. } => Ok(*affected_rows),
            Self::Rows(_) => Err(DbError::UnexpectedOutput {
                expected: "affected row count",
            }),
        }
    }

    pub fn last_insert_id(&self) -> Result<u64, DbError> {
        match self {
            Self::Write { last_insert_id, .. } => Ok(*last_insert_id),
            Self::Rows(_) => Err(DbError::UnexpectedOutput {
                expected: "generated id",
            }),
        }
    }
}

/// A bounded set of database connections that can run parameterised SQL.
///
/// `params` are bound positionally to the `?` placeholders in `sql`.
/// Implementations must be shareable across concurrent requests.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DbError>;
}
