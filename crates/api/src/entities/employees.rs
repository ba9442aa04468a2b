//! `employees` table.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::schema::{Column, TableSchema};

pub const TABLE: &str = "employees";

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});
static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{7,15}$").expect("valid phone regex"));
static COUNTRY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,4}$").expect("valid country code regex"));

pub fn schema() -> TableSchema {
    TableSchema::new(TABLE)
        .column(Column::new("first_name").required())
        .column(Column::new("last_name").required())
        .column(Column::new("email").required().pattern(&EMAIL))
        .column(Column::new("hire_date").required())
        .column(Column::new("department_id"))
        .column(Column::new("country_code").required().pattern(&COUNTRY_CODE))
        .column(Column::new("phone_number").required().pattern(&PHONE_NUMBER))
        .column(Column::new("is_active").default_value(json!(true)))
}
