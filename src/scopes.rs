//! # Scopes
//!
//! Rails-style named scopes: reusable query refinements that take a
//! builder and hand back the refined builder.
//!
//! ## Conventions
//!
//! A model's named scopes live on an extension trait over its builder,
//! one method per scope:
//!
//! ```rust,ignore
//! trait UserScopes {
//!     fn approved(self) -> Self;
//! }
//!
//! impl UserScopes for Builder<User> {
//!     fn approved(self) -> Self {
//!         self.where_eq("approved", json!(true))
//!     }
//! }
//! ```
//!
//! The [`Scope`] trait covers the cases where a refinement needs to be
//! passed around as a value; closures implement it directly.

use crate::builder::Builder;
use crate::model::Model;

/// A reusable query refinement
pub trait Scope<M: Model>: Send + Sync {
    fn apply(&self, builder: Builder<M>) -> Builder<M>;
}

impl<M, F> Scope<M> for F
where
    M: Model,
    F: Fn(Builder<M>) -> Builder<M> + Send + Sync,
{
    fn apply(&self, builder: Builder<M>) -> Builder<M> {
        self(builder)
    }
}

/// Hides soft-deleted rows from every query on a soft-deleting model
///
/// Applied automatically by [`Builder::new`]; `with_trashed` lifts it
/// from an individual query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDeletingScope;

impl<M: Model> Scope<M> for SoftDeletingScope {
    fn apply(&self, builder: Builder<M>) -> Builder<M> {
        match M::soft_delete_column() {
            Some(column) => builder.where_null(&M::qualified_column(column)),
            None => builder,
        }
    }
}
