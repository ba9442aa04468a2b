//! Database error classification.
//!
//! The HTTP layer decides status codes from an [`ErrorKind`]; only the
//! backend-specific [`ErrorClassifier`] knows how a driver spells each kind.

use crate::DbError;

/// Backend-independent category of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A unique or primary key constraint was violated.
    DuplicateKey,
    /// A NOT NULL column received no value.
    MissingValue,
    /// A foreign key points at a row that doesn't exist.
    MissingReference,
    /// The row can't be deleted or re-keyed because other rows reference it.
    ReferencedRow,
    /// The statement named a column the table doesn't have.
    UnknownColumn,
    /// A value was rejected for its column (bad date, too long, wrong type).
    InvalidValue,
    /// Anything else: connectivity, syntax, driver bugs.
    Other,
}

/// Maps a structured [`DbError`] onto an [`ErrorKind`].
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &DbError) -> ErrorKind;
}

/// Classifier for MySQL / MariaDB server error numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlClassifier;

impl MySqlClassifier {
    pub const ER_DUP_ENTRY: u16 = 1062;
    pub const ER_BAD_NULL_ERROR: u16 = 1048;
    pub const ER_NO_DEFAULT_FOR_FIELD: u16 = 1364;
    pub const ER_BAD_FIELD_ERROR: u16 = 1054;
    pub const ER_ROW_IS_REFERENCED: u16 = 1217;
    pub const ER_ROW_IS_REFERENCED_2: u16 = 1451;
    pub const ER_NO_REFERENCED_ROW: u16 = 1216;
    pub const ER_NO_REFERENCED_ROW_2: u16 = 1452;
    pub const ER_TRUNCATED_WRONG_VALUE: u16 = 1292;
    pub const ER_DATA_TOO_LONG: u16 = 1406;
    pub const ER_TRUNCATED_WRONG_VALUE_FOR_FIELD: u16 = 1366;
    pub const WARN_DATA_OUT_OF_RANGE: u16 = 1264;
}

impl ErrorClassifier for MySqlClassifier {
    fn classify(&self, error: &DbError) -> ErrorKind {
        let DbError::Database {
            number: Some(number),
            ..
        } = error
        else {
            return ErrorKind::Other;
        };

        match *number {
            Self::ER_DUP_ENTRY => ErrorKind::DuplicateKey,
            Self::ER_BAD_NULL_ERROR | Self::ER_NO_DEFAULT_FOR_FIELD => ErrorKind::MissingValue,
            Self::ER_NO_REFERENCED_ROW | Self::ER_NO_REFERENCED_ROW_2 => {
                ErrorKind::MissingReference
            }
            Self::ER_ROW_IS_REFERENCED | Self::ER_ROW_IS_REFERENCED_2 => ErrorKind::ReferencedRow,
            Self::ER_BAD_FIELD_ERROR => ErrorKind::UnknownColumn,
            Self::ER_TRUNCATED_WRONG_VALUE
            | Self::ER_DATA_TOO_LONG
            | Self::ER_TRUNCATED_WRONG_VALUE_FOR_FIELD
            | Self::WARN_DATA_OUT_OF_RANGE => ErrorKind::InvalidValue,
            _ => ErrorKind::Other,
        }
    }
}
