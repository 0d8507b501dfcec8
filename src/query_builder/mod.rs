//! # Query Builder System
//!
//! Generic SQL building with placeholder rendering and positional bindings.
//!
//! ## Overview
//!
//! This module is the grammar-free core the model-aware [`Builder`] delegates
//! to: it assembles SELECT/INSERT/UPDATE/DELETE statements as `?`-placeholder
//! SQL plus a vector of `serde_json::Value` bindings, leaving driver-specific
//! placeholder syntax to the `Connection` implementation.
//!
//! ## Key Components
//!
//! - [`builder`] - Core query builder with SQL generation
//! - [`conditions`] - WHERE clause building, including nested groups
//! - [`joins`] - JOIN clause management (INNER, LEFT)
//! - [`pagination`] - LIMIT/OFFSET plus the [`Page`] result wrapper
//!
//! [`Builder`]: crate::builder::Builder

pub mod builder;
pub mod conditions;
pub mod joins;
pub mod pagination;

pub use builder::QueryBuilder;
pub use conditions::{Condition, LogicalOperator, WhereClause};
pub use joins::{Join, JoinType};
pub use pagination::{Page, Pagination};
