//! # Model
//!
//! The contract a typed record implements to work with [`Builder`]: where
//! its rows live, how its primary key is named, how a raw [`Row`] becomes
//! an instance, and which named relations it can eager load.
//!
//! [`Builder`]: crate::builder::Builder

use serde_json::Value;

use crate::error::Result;
use crate::relations::Relationship;
use crate::row::Row;

/// A typed record backed by a database table
pub trait Model: Sized + Send + Sync + 'static {
    /// Table backing this model
    const TABLE: &'static str;

    /// Primary key column name
    const PRIMARY_KEY: &'static str = "id";

    /// Default page size for `paginate`
    const PER_PAGE: u64 = 15;

    /// Name used in error messages
    const NAME: &'static str = Self::TABLE;

    /// Column marking soft-deleted rows, when the model uses them
    fn soft_delete_column() -> Option<&'static str> {
        None
    }

    /// The primary key qualified with the table name
    fn qualified_key() -> String {
        Self::qualified_column(Self::PRIMARY_KEY)
    }

    /// Qualify a column with the table name
    fn qualified_column(column: &str) -> String {
        format!("{}.{}", Self::TABLE, column)
    }

    /// Hydrate an instance from a result row
    fn from_row(row: &Row) -> Result<Self>;

    /// Look up a named relation for eager loading
    fn relation(_name: &str) -> Option<Box<dyn Relationship<Self>>> {
        None
    }

    /// Read-time transform for a column, applied by `value` and `pluck`
    fn accessor(_column: &str, _value: &Value) -> Option<Value> {
        None
    }
}
