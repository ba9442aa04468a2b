//! Typed error type for the db crate.

use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The server rejected the statement.
    ///
    /// Kept as plain data so classifiers never have to reach into driver
    /// types.
    #[error("database error{}: {message}", .number.map(|n| format!(" {n}")).unwrap_or_default())]
    Database {
        /// Vendor error number (e.g. MySQL `1062`).
        number: Option<u16>,
        /// SQLSTATE, when the server sent one.
        sqlstate: Option<String>,
        message: String,
    },

    #[error("sqlx error: {0}")]
    Sqlx(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The statement produced a different kind of output than the caller asked for.
    #[error("unexpected query output: expected {expected}")]
    UnexpectedOutput { expected: &'static str },
}

impl DbError {
    /// Convenience constructor for a server-side error with a vendor number.
    pub fn database(number: u16, message: impl Into<String>) -> Self {
        Self::Database {
            number: Some(number),
            sqlstate: None,
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let number = db_err
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(|e| e.number());
                Self::Database {
                    number,
                    sqlstate: db_err.code().map(|c| c.into_owned()),
                    message: db_err.message().to_owned(),
                }
            }
            other => Self::Sqlx(other),
        }
    }
}
