//! Shared handles passed to every router.

use std::sync::Arc;

use db::{ConnectionPool, ErrorClassifier, MySqlClassifier};

/// The database seen from the HTTP layer: somewhere to run statements and a
/// way to classify their failures.
#[derive(Clone)]
pub struct Backend {
    pub pool: Arc<dyn ConnectionPool>,
    pub classifier: Arc<dyn ErrorClassifier>,
}

impl Backend {
    pub fn new(pool: Arc<dyn ConnectionPool>, classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self { pool, classifier }
    }

    /// A MySQL-backed pool (or a stand-in for one) with the MySQL classifier.
    pub fn mysql(pool: Arc<dyn ConnectionPool>) -> Self {
        Self::new(pool, Arc::new(MySqlClassifier))
    }
}
