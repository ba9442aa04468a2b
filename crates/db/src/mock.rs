//! `MockPool` — a test double for `ConnectionPool`.
//!
//! Replays scripted outputs in order and records every statement it is
//! asked to run, so router tests need no live database.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::{ConnectionPool, QueryOutput, Row};
use crate::DbError;

/// One `execute` call as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A pool that returns programmer-specified results.
#[derive(Default)]
pub struct MockPool {
    script: Mutex<VecDeque<Result<QueryOutput, DbError>>>,
    /// All statements seen by this pool (in call order).
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set. Each value must be a JSON object.
    pub fn then_rows(self, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("mock rows must be JSON objects, got {other}"),
            })
            .collect::<Vec<Row>>();
        self.then(Ok(QueryOutput::Rows(rows)))
    }

    /// Queue the outcome of a write statement.
    pub fn then_write(self, affected_rows: u64, last_insert_id: u64) -> Self {
        self.then(Ok(QueryOutput::Write {
            affected_rows,
            last_insert_id,
        }))
    }

    /// Queue a failure.
    pub fn then_error(self, error: DbError) -> Self {
        self.then(Err(error))
    }

    fn then(self, result: Result<QueryOutput, DbError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    /// Number of statements executed so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Snapshot of every statement executed so far.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DbError> {
        self.calls.lock().unwrap().push(RecordedCall {
            sql: sql.to_owned(),
            params: params.to_vec(),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DbError::UnexpectedOutput {
                expected: "a scripted mock result",
            }))
    }
}
