//! Per-table configuration for the generic CRUD router.
//!
//! A [`TableSchema`] names the table, lists the columns a request body may
//! write, and carries declarative validation rules and defaults per column.
//! The fixed statements for the table are built once, at construction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::query::{column_list, quote_ident, InsertParts, UpdateParts};

/// Request-body validation failures. All of them are client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("request body must contain at least one field")]
    EmptyBody,

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("invalid {field} format")]
    InvalidFormat { field: &'static str },

    #[error("invalid {field} value: '{value}'")]
    NotAllowed { field: &'static str, value: String },
}

/// A check applied to one column of a request body.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Must be present, non-null and not an empty string when creating a row,
    /// and must not be cleared when updating one.
    Required,
    /// The value's text form must match.
    Pattern(&'static Lazy<Regex>),
    /// The value must be one of a fixed set of strings.
    OneOf(&'static [&'static str]),
}

/// A writable column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub rules: Vec<Rule>,
    /// Inserted when a create request omits the column.
    pub default: Option<Value>,
}

impl Column {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn pattern(mut self, regex: &'static Lazy<Regex>) -> Self {
        self.rules.push(Rule::Pattern(regex));
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.rules.push(Rule::OneOf(allowed));
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        if is_blank(value) {
            if self.is_required() {
                return Err(ValidationError::Missing { field: self.name });
            }
            return Ok(());
        }

        for rule in &self.rules {
            match rule {
                Rule::Required => {}
                Rule::Pattern(regex) => {
                    let ok = text_of(value).is_some_and(|text| regex.is_match(&text));
                    if !ok {
                        return Err(ValidationError::InvalidFormat { field: self.name });
                    }
                }
                Rule::OneOf(allowed) => {
                    let text = text_of(value).unwrap_or_else(|| value.to_string());
                    if !allowed.contains(&text.as_str()) {
                        return Err(ValidationError::NotAllowed {
                            field: self.name,
                            value: text,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Text form of a scalar, used by pattern and allow-list rules.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Statements that don't depend on the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQueries {
    pub select_all: String,
    pub select_by_id: String,
    pub delete_by_id: String,
}

/// Configuration of one table mounted through the CRUD router.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    queries: TableQueries,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = quote_ident(&name);
        let queries = TableQueries {
            select_all: format!("SELECT * FROM {table};"),
            select_by_id: format!("SELECT * FROM {table} WHERE id = ?;"),
            delete_by_id: format!("DELETE FROM {table} WHERE id = ?;"),
        };
        Self {
            name,
            columns: Vec::new(),
            queries,
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add plain, unvalidated columns.
    pub fn columns(mut self, names: impl IntoIterator<Item = &'static str>) -> Self {
        self.columns.extend(names.into_iter().map(Column::new));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queries(&self) -> &TableQueries {
        &self.queries
    }

    fn find(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every key must be a declared column and every present value must
    /// pass that column's rules.
    fn check_present(&self, body: &Map<String, Value>) -> Result<(), ValidationError> {
        if body.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        for (key, value) in body {
            let column = self
                .find(key)
                .ok_or_else(|| ValidationError::UnknownField { field: key.clone() })?;
            column.check(value)?;
        }
        Ok(())
    }

    /// Validate a create request and fill in column defaults.
    ///
    /// Defaults are appended after the body's own keys, so the body's
    /// column order is kept.
    pub fn prepare_insert(
        &self,
        mut body: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        self.check_present(&body)?;

        for column in &self.columns {
            if body.contains_key(column.name) {
                continue;
            }
            if column.is_required() {
                return Err(ValidationError::Missing { field: column.name });
            }
            if let Some(default) = &column.default {
                body.insert(column.name.to_owned(), default.clone());
            }
        }
        Ok(body)
    }

    /// Validate an update request. Only the fields present are checked.
    pub fn prepare_update(
        &self,
        body: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        self.check_present(&body)?;
        Ok(body)
    }

    pub fn insert_sql(&self, parts: &InsertParts) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            quote_ident(&self.name),
            column_list(&parts.columns),
            parts.placeholders
        )
    }

    pub fn update_sql(&self, parts: &UpdateParts) -> String {
        format!(
            "UPDATE {} SET {} WHERE id = ?;",
            quote_ident(&self.name),
            parts.set_clause
        )
    }
}
