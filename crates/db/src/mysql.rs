//! `ConnectionPool` implementation for the shared MySQL pool.
//!
//! Rows are decoded dynamically: each column is turned into a JSON value
//! based on the type the server reports for it, so the HTTP layer can work
//! with tables it has no compiled-in struct for.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySqlPool, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::connection::{ConnectionPool, QueryOutput, Row};
use crate::DbError;

#[async_trait]
impl ConnectionPool for MySqlPool {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DbError> {
        debug!(sql, params = params.len(), "executing statement");

        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, value| bind_value(query, value));

        if returns_rows(sql) {
            let rows = query.fetch_all(self).await?;
            Ok(QueryOutput::Rows(rows.iter().map(decode_row).collect()))
        } else {
            let result = query.execute(self).await?;
            Ok(QueryOutput::Write {
                affected_rows: result.rows_affected(),
                last_insert_id: result.last_insert_id(),
            })
        }
    }
}

/// Whether `sql` is a statement that yields a result set.
fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    ["SELECT", "SHOW", "WITH", "DESCRIBE", "EXPLAIN"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Nested structures go to JSON columns as text.
        other => query.bind(other.to_string()),
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_value(row, idx, column.type_info().name());
        out.insert(column.name().to_owned(), value);
    }
    out
}

fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> Value {
    match row.try_get_raw(idx) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    let typed = match type_name {
        "BOOLEAN" => get::<bool>(row, idx).map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get::<i64>(row, idx).map(Value::from)
        }
        t if t.ends_with("UNSIGNED") => get::<u64>(row, idx).map(Value::from),
        "FLOAT" | "DOUBLE" => get::<f64>(row, idx).map(Value::from),
        "DATE" => get::<NaiveDate>(row, idx).map(|d| Value::String(d.to_string())),
        "DATETIME" => get::<NaiveDateTime>(row, idx)
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMP" => get::<DateTime<Utc>>(row, idx).map(|d| Value::String(d.to_rfc3339())),
        "JSON" => get::<Value>(row, idx),
        _ => None,
    };

    // DECIMAL, TIME, ENUM and friends fall back to their text form.
    typed
        .or_else(|| get::<String>(row, idx).map(Value::String))
        .or_else(|| {
            row.try_get_unchecked::<Vec<u8>, _>(idx)
                .ok()
                .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        })
        .unwrap_or(Value::Null)
}

fn get<'r, T>(row: &'r MySqlRow, idx: usize) -> Option<T>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<T, _>(idx).ok()
}
