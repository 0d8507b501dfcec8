#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Quarry ORM
//!
//! Model-aware query builder with eager loading over a plain SQL builder.
//!
//! ## Overview
//!
//! Quarry layers a typed model builder on top of a generic SQL query
//! builder. The model builder knows a model's table, primary key and
//! soft-delete column, hydrates result rows into model values, and
//! resolves relation names into batched eager loads. Everything below it
//! renders portable SQL with `?` placeholders and talks to the database
//! through a single [`Connection`] trait, so the same builder code runs
//! against Postgres or an in-memory fake.
//!
//! ## Architecture
//!
//! A [`Builder`] starts from a model type and refines a [`QueryBuilder`]
//! owned internally. Refinement methods consume and return the builder;
//! terminal operations take a [`Connection`] and run the query. Relations
//! are plain values implementing [`Relationship`], produced by the model,
//! and eager loading runs one batched query per relation name.
//!
//! ## Module Organization
//!
//! - [`builder`] - Model-aware builder with eager loading
//! - [`query_builder`] - SQL generation with placeholder bindings
//! - [`model`] - The [`Model`] trait models implement
//! - [`relations`] - Relationship trait plus has-many / belongs-to
//! - [`scopes`] - Reusable query scopes and soft-delete filtering
//! - [`row`] - Column-ordered row values passed across the boundary
//! - [`connection`] - The database execution trait
//! - [`database`] - sqlx-backed Postgres adapter
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing subscriber setup
//! - [`test_helpers`] - In-memory connection double for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_orm::{Builder, Connection, Model, Result, Row};
//! use serde_json::json;
//!
//! struct User {
//!     id: i64,
//!     email: String,
//! }
//!
//! impl Model for User {
//!     const TABLE: &'static str = "users";
//!
//!     fn from_row(row: &Row) -> Result<Self> {
//!         Ok(Self {
//!             id: row.get_i64("id")?,
//!             email: row.get_str("email")?,
//!         })
//!     }
//! }
//!
//! # async fn example(conn: &dyn Connection) -> Result<()> {
//! let user = Builder::<User>::new()
//!     .where_eq("email", json!("taylor@example.com"))
//!     .first_or_fail(conn)
//!     .await?;
//!
//! let recent = Builder::<User>::new()
//!     .with(&["orders", "orders.lines"])
//!     .order_desc("id")
//!     .take(10)
//!     .get(conn)
//!     .await?;
//! # let _ = (user, recent);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod connection;
pub mod database;
pub mod error;
pub mod logging;
pub mod model;
pub mod query_builder;
pub mod relations;
pub mod row;
pub mod scopes;
pub mod test_helpers;

pub use builder::{Builder, Constraint, EagerSpec};
pub use connection::Connection;
#[cfg(feature = "postgres")]
pub use database::PostgresConnection;
pub use error::{QuarryError, Result};
pub use model::Model;
pub use query_builder::{Page, QueryBuilder};
pub use relations::{BelongsTo, Constrainable, HasMany, Relationship};
pub use row::Row;
pub use scopes::{Scope, SoftDeletingScope};
