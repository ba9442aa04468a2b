//! The tables this service exposes, each a configuration of the generic
//! CRUD router.

pub mod departments;
pub mod employees;

use crate::schema::TableSchema;

/// Every mounted table, in mount order.
pub fn all() -> Vec<TableSchema> {
    vec![departments::schema(), employees::schema()]
}
