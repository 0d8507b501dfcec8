//! # Row
//!
//! In-memory representation of a single result row: an ordered list of
//! column name / value pairs, with typed getters used by model hydration.
//! Values are `serde_json::Value` so rows can round-trip through any
//! `Connection` implementation without a driver-specific type zoo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{QuarryError, Result};

/// A single result row with deterministic column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Build a row from column/value pairs, preserving their order
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Set a column, replacing any existing value under the same name
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        if let Some(entry) = self.columns.iter_mut().find(|(name, _)| *name == column) {
            entry.1 = value;
        } else {
            self.columns.push((column, value));
        }
    }

    /// Consuming form of `insert` for factory-style construction
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn pairs(&self) -> &[(String, Value)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn required(&self, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| QuarryError::hydration(column, "missing column"))
    }

    fn mismatch(column: &str, expected: &str, found: &Value) -> QuarryError {
        QuarryError::hydration(column, format!("expected {expected}, found {}", kind(found)))
    }

    /// Read a column as `i64`
    pub fn get_i64(&self, column: &str) -> Result<i64> {
        match self.required(column)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| QuarryError::hydration(column, "number out of i64 range")),
            other => Err(Self::mismatch(column, "integer", other)),
        }
    }

    pub fn get_u64(&self, column: &str) -> Result<u64> {
        match self.required(column)? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| QuarryError::hydration(column, "number out of u64 range")),
            other => Err(Self::mismatch(column, "unsigned integer", other)),
        }
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        match self.required(column)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| QuarryError::hydration(column, "number out of f64 range")),
            other => Err(Self::mismatch(column, "float", other)),
        }
    }

    pub fn get_bool(&self, column: &str) -> Result<bool> {
        match self.required(column)? {
            Value::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(column, "boolean", other)),
        }
    }

    /// Read a column as an owned `String`
    pub fn get_str(&self, column: &str) -> Result<String> {
        match self.required(column)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(Self::mismatch(column, "string", other)),
        }
    }

    pub fn get_uuid(&self, column: &str) -> Result<Uuid> {
        match self.required(column)? {
            Value::String(s) => Uuid::parse_str(s)
                .map_err(|e| QuarryError::hydration(column, format!("invalid uuid: {e}"))),
            other => Err(Self::mismatch(column, "uuid string", other)),
        }
    }

    /// Read a column as a UTC timestamp from an RFC 3339 string
    pub fn get_datetime(&self, column: &str) -> Result<DateTime<Utc>> {
        match self.required(column)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| QuarryError::hydration(column, format!("invalid timestamp: {e}"))),
            other => Err(Self::mismatch(column, "timestamp string", other)),
        }
    }

    /// Optional variant: missing column or SQL NULL reads as `None`
    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_i64(column).map(Some),
        }
    }

    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_f64(column).map(Some),
        }
    }

    pub fn opt_bool(&self, column: &str) -> Result<Option<bool>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_bool(column).map(Some),
        }
    }

    pub fn opt_str(&self, column: &str) -> Result<Option<String>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_str(column).map(Some),
        }
    }

    pub fn opt_uuid(&self, column: &str) -> Result<Option<Uuid>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_uuid(column).map(Some),
        }
    }

    pub fn opt_datetime(&self, column: &str) -> Result<Option<DateTime<Utc>>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_datetime(column).map(Some),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
