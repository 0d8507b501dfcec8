//! Postgres-backed [`Connection`] over an existing sqlx pool.
//!
//! Queries run through runtime `sqlx::query` with the crate's `?`
//! placeholders rewritten to Postgres `$n` parameters. Result columns
//! decode into [`Row`] values by column type name; a type this adapter
//! does not know decodes best-effort to text and otherwise reads as
//! NULL with a warning.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, Postgres, Row as _, TypeInfo as _};
use uuid::Uuid;

use crate::connection::Connection;
use crate::error::Result;
use crate::row::Row;

/// sqlx-backed [`Connection`] for Postgres
pub struct PostgresConnection {
    pool: PgPool,
}

impl PostgresConnection {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from a database URL
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn select(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        let sql = positional_placeholders(sql);
        let mut query = sqlx::query(&sql);
        for value in bindings {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64> {
        let sql = positional_placeholders(sql);
        let mut query = sqlx::query(&sql);
        for value in bindings {
            query = bind_value(query, value);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Rewrite `?` placeholders to Postgres positional `$n` parameters.
///
/// Single-quoted sections pass through untouched so literal question
/// marks inside string constants survive.
fn positional_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0usize;
    let mut in_string = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                index += 1;
                out.push_str(&format!("${index}"));
            }
            _ => out.push(ch),
        }
    }
    out
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                query.bind(int)
            } else {
                query.bind(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.clone()),
    }
}

fn decode_row(row: &PgRow) -> Row {
    let mut out = Row::new();
    for column in row.columns() {
        let name = column.name();
        let type_name = column.type_info().name();
        out.insert(name, decode_column(row, column.ordinal(), type_name, name));
    }
    out
}

fn decode_column(row: &PgRow, index: usize, type_name: &str, name: &str) -> Value {
    match type_name {
        "INT2" => fetch::<i16>(row, index)
            .map(|v| Value::from(i64::from(v)))
            .unwrap_or(Value::Null),
        "INT4" => fetch::<i32>(row, index)
            .map(|v| Value::from(i64::from(v)))
            .unwrap_or(Value::Null),
        "INT8" => fetch::<i64>(row, index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT4" => fetch::<f32>(row, index)
            .map(|v| json_f64(f64::from(v)))
            .unwrap_or(Value::Null),
        "FLOAT8" => fetch::<f64>(row, index)
            .map(json_f64)
            .unwrap_or(Value::Null),
        "BOOL" => fetch::<bool>(row, index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => fetch::<String>(row, index)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => fetch::<DateTime<Utc>>(row, index)
            .map(|v| Value::from(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => fetch::<NaiveDateTime>(row, index)
            .map(|v| Value::from(v.and_utc().to_rfc3339()))
            .unwrap_or(Value::Null),
        "DATE" => fetch::<NaiveDate>(row, index)
            .map(|v| Value::from(v.to_string()))
            .unwrap_or(Value::Null),
        "UUID" => fetch::<Uuid>(row, index)
            .map(|v| Value::from(v.to_string()))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => fetch::<Value>(row, index).unwrap_or(Value::Null),
        other => match fetch::<String>(row, index) {
            Some(text) => Value::from(text),
            None => {
                tracing::warn!(column = name, pg_type = other, "undecodable column read as NULL");
                Value::Null
            }
        },
    }
}

fn fetch<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    Option<T>: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(index).ok().flatten()
}

fn json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_placeholder_rewrite() {
        let sql = "SELECT * FROM users WHERE id = ? AND name = ?";
        assert_eq!(
            positional_placeholders(sql),
            "SELECT * FROM users WHERE id = $1 AND name = $2"
        );
    }

    #[test]
    fn test_placeholders_inside_strings_survive() {
        let sql = "SELECT * FROM notes WHERE body = '?' AND id = ?";
        assert_eq!(
            positional_placeholders(sql),
            "SELECT * FROM notes WHERE body = '?' AND id = $1"
        );
    }

    #[test]
    fn test_no_placeholders() {
        let sql = "SELECT COUNT(*) AS aggregate FROM users";
        assert_eq!(positional_placeholders(sql), sql);
    }
}
