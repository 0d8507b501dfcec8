//! Fake Connection Implementation for Testing
//!
//! Provides an in-memory implementation of the [`Connection`] trait so
//! builder operations can run without a database. Result sets are
//! queued up front and consumed in order; every statement is recorded
//! for assertions.
//!
//! [`Connection`]: crate::connection::Connection

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::Connection;
use crate::error::{QuarryError, Result};
use crate::row::Row;

/// Fake connection state for tracking calls and queuing results
#[derive(Debug, Default, Clone)]
pub struct FakeConnectionState {
    /// Every statement run so far, in order, with its bindings
    pub statements: Vec<(String, Vec<Value>)>,
    /// Queued result sets for `select` calls, consumed front to back
    pub select_results: VecDeque<Vec<Row>>,
    /// Queued affected-row counts for `execute` calls
    pub execute_results: VecDeque<u64>,
    /// When set, the next call records its statement then fails
    pub next_error: Option<String>,
}

/// In-memory connection double that replays queued results
#[derive(Debug, Default, Clone)]
pub struct FakeConnection {
    state: Arc<Mutex<FakeConnectionState>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set for the next unanswered `select`
    pub fn push_select(&self, rows: Vec<Row>) {
        let mut state = self.state.lock().unwrap();
        state.select_results.push_back(rows);
    }

    /// Builder-style variant of [`push_select`](Self::push_select)
    pub fn with_select(self, rows: Vec<Row>) -> Self {
        self.push_select(rows);
        self
    }

    /// Queue an affected-row count for the next unanswered `execute`
    pub fn push_execute(&self, affected: u64) {
        let mut state = self.state.lock().unwrap();
        state.execute_results.push_back(affected);
    }

    /// Builder-style variant of [`push_execute`](Self::push_execute)
    pub fn with_execute(self, affected: u64) -> Self {
        self.push_execute(affected);
        self
    }

    /// Make the next call fail with a database error
    pub fn fail_next(&self, message: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.next_error = Some(message.into());
    }

    /// Get the current state for assertions
    pub fn get_state(&self) -> FakeConnectionState {
        self.state.lock().unwrap().clone()
    }

    /// Statements run so far with their bindings
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().statements.clone()
    }

    /// SQL text of the statements run so far
    pub fn sql_log(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .statements
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Bindings of the statement at `index`
    ///
    /// Panics when fewer statements have run, which is the failure a
    /// test wants anyway.
    pub fn bindings_at(&self, index: usize) -> Vec<Value> {
        self.state.lock().unwrap().statements[index].1.clone()
    }

    /// Reset recorded statements, keeping queued results
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.statements.clear();
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn select(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        let mut state = self.state.lock().unwrap();
        state.statements.push((sql.to_string(), bindings.to_vec()));

        if let Some(message) = state.next_error.take() {
            return Err(QuarryError::database(message));
        }

        Ok(state.select_results.pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.statements.push((sql.to_string(), bindings.to_vec()));

        if let Some(message) = state.next_error.take() {
            return Err(QuarryError::database(message));
        }

        Ok(state.execute_results.pop_front().unwrap_or(0))
    }
}
