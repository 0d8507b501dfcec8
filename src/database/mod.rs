//! # Database Adapters
//!
//! Driver-backed implementations of the [`Connection`] trait.
//!
//! ## Overview
//!
//! The rest of the crate renders SQL with `?` placeholders and speaks to
//! the database only through [`Connection`], so swapping drivers is a
//! matter of providing another adapter here. Postgres is the one that
//! ships, behind the `postgres` feature.
//!
//! ## Key Components
//!
//! - [`postgres`] - sqlx-backed Postgres adapter with placeholder
//!   rewriting and type-aware row decoding
//!
//! [`Connection`]: crate::connection::Connection

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresConnection;
