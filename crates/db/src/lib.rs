//! `db` crate — pure persistence layer.
//!
//! Provides the MySQL connection pool, the [`ConnectionPool`] trait the HTTP
//! layer talks to, and error classification. No HTTP concerns live here.

pub mod classify;
pub mod connection;
pub mod error;
pub mod mock;
pub mod mysql;
pub mod pool;

pub use classify::{ErrorClassifier, ErrorKind, MySqlClassifier};
pub use connection::{ConnectionPool, QueryOutput, Row};
pub use error::DbError;
pub use pool::{DbConfig, DbPool};
