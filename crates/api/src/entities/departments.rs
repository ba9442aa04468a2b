//! `departments` table.

use serde_json::json;

use crate::schema::{Column, TableSchema};

pub const TABLE: &str = "departments";

/// Offices a department can be located in.
pub const LOCATIONS: &[&str] = &["New York", "San Francisco", "London"];

pub fn schema() -> TableSchema {
    TableSchema::new(TABLE)
        .column(Column::new("name").required())
        .column(Column::new("code").required())
        .column(Column::new("location").required().one_of(LOCATIONS))
        .column(Column::new("is_active").default_value(json!(true)))
}
