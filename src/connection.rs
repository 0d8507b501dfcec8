//! # Connection
//!
//! The execution seam between builders and an actual database. Terminal
//! builder operations take `&dyn Connection`, so production code can hand
//! in the Postgres adapter while tests hand in a scripted fake.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::row::Row;

/// Executes placeholder SQL with positional bindings
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a SELECT and return all result rows
    async fn select(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>>;

    /// Run an INSERT/UPDATE/DELETE and return the number of affected rows
    async fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64>;
}
