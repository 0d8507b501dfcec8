//! # Error Types
//!
//! Structured error handling for query building, hydration, and execution
//! using thiserror instead of `Box<dyn Error>` patterns.

use thiserror::Error;

/// Errors surfaced by builders, hydration, and connections
#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("No query results for model: {model}")]
    ModelNotFound { model: &'static str },

    #[error("Undefined relation on model: {model}: {relation}")]
    RelationNotFound {
        model: &'static str,
        relation: String,
    },

    #[error("Row hydration error: column {column}: {message}")]
    Hydration { column: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Query error: {message}")]
    Query { message: String },
}

impl QuarryError {
    /// Create a model not found error
    pub fn model_not_found(model: &'static str) -> Self {
        Self::ModelNotFound { model }
    }

    /// Create an undefined relation error
    pub fn relation_not_found(model: &'static str, relation: impl Into<String>) -> Self {
        Self::RelationNotFound {
            model,
            relation: relation.into(),
        }
    }

    /// Create a row hydration error
    pub fn hydration(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hydration {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a query construction error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Conversion from sqlx::Error to QuarryError
impl From<sqlx::Error> for QuarryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => QuarryError::database(db_err.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                QuarryError::hydration(index, source.to_string())
            }
            _ => QuarryError::database(err.to_string()),
        }
    }
}

/// Conversion from serde_json::Error to QuarryError
impl From<serde_json::Error> for QuarryError {
    fn from(err: serde_json::Error) -> Self {
        QuarryError::query(err.to_string())
    }
}

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, QuarryError>;
