//! Query helpers: turn a request body into the pieces of a parameterised
//! `INSERT` or `UPDATE`.
//!
//! Values always travel as bound parameters. Column names are interpolated
//! into the SQL text, so callers must only pass bodies whose keys have been
//! checked against the table's column list (see [`crate::schema`]).

use serde_json::{Map, Value};

/// Column list, bound values and placeholder string for an `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertParts {
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    /// One `?` per column, comma separated.
    pub placeholders: String,
}

/// Column list, `SET` clause and bound values for an `UPDATE ... WHERE id = ?`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParts {
    pub columns: Vec<String>,
    /// `` `a` = ?, `b` = ? ``
    pub set_clause: String,
    /// Column values followed by the row id.
    pub values: Vec<Value>,
}

/// Split `body` into insert columns and values, keeping the body's key order.
pub fn format_insert(body: &Map<String, Value>) -> InsertParts {
    let columns: Vec<String> = body.keys().cloned().collect();
    let values: Vec<Value> = body.values().cloned().collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    InsertParts {
        columns,
        values,
        placeholders,
    }
}

/// Build the `SET` clause for `body` and append `id` as the last parameter.
pub fn format_update(body: &Map<String, Value>, id: impl Into<Value>) -> UpdateParts {
    let columns: Vec<String> = body.keys().cloned().collect();
    let set_clause = columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut values: Vec<Value> = body.values().cloned().collect();
    values.push(id.into());

    UpdateParts {
        columns,
        set_clause,
        values,
    }
}

/// Quote a MySQL identifier with backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Comma-separated, quoted column list.
pub fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}
