//! # Relations
//!
//! Loadable associations between models. A relation is looked up by name
//! through [`Model::relation`] and driven by the eager loader through a
//! fixed sequence: batch constraints for the parent set, an optional
//! user constraint, default initialization on every parent, one query,
//! then matching results back onto their parents.
//!
//! [`HasMany`] and [`BelongsTo`] cover the common shapes; anything more
//! exotic implements [`Relationship`] directly.

use std::mem;

use async_trait::async_trait;
use serde_json::Value;

use crate::builder::{Builder, EagerSpec};
use crate::connection::Connection;
use crate::error::Result;
use crate::model::Model;
use crate::query_builder::{QueryBuilder, WhereClause};

/// Query refinement surface exposed to eager-load constraints
///
/// Constraints receive the relation's query as `&mut dyn Constrainable`,
/// so the generic builder and the model-aware builder can both stand in.
pub trait Constrainable {
    fn where_op(&mut self, column: &str, operator: &str, value: Value);
    fn or_where_op(&mut self, column: &str, operator: &str, value: Value);
    fn where_in(&mut self, column: &str, values: Vec<Value>);
    fn where_null(&mut self, column: &str);
    fn where_not_null(&mut self, column: &str);
    fn order_by(&mut self, column: &str, direction: &str);
    fn limit(&mut self, limit: u64);
    fn offset(&mut self, offset: u64);
    fn select(&mut self, columns: &[&str]);
}

impl Constrainable for QueryBuilder {
    fn where_op(&mut self, column: &str, operator: &str, value: Value) {
        self.add_where(WhereClause::simple(column, operator, value));
    }

    fn or_where_op(&mut self, column: &str, operator: &str, value: Value) {
        self.add_where(WhereClause::or(
            crate::query_builder::Condition::Simple {
                column: column.to_string(),
                operator: operator.to_string(),
                value,
            },
        ));
    }

    fn where_in(&mut self, column: &str, values: Vec<Value>) {
        self.add_where(WhereClause::in_condition(column, values));
    }

    fn where_null(&mut self, column: &str) {
        self.add_where(WhereClause::is_null(column));
    }

    fn where_not_null(&mut self, column: &str) {
        self.add_where(WhereClause::is_not_null(column));
    }

    fn order_by(&mut self, column: &str, direction: &str) {
        self.push_order(column, direction);
    }

    fn limit(&mut self, limit: u64) {
        self.set_limit(limit);
    }

    fn offset(&mut self, offset: u64) {
        self.set_offset(offset);
    }

    fn select(&mut self, columns: &[&str]) {
        self.set_columns(columns);
    }
}

impl<M: Model> Constrainable for Builder<M> {
    fn where_op(&mut self, column: &str, operator: &str, value: Value) {
        Constrainable::where_op(self.query_mut(), column, operator, value);
    }

    fn or_where_op(&mut self, column: &str, operator: &str, value: Value) {
        Constrainable::or_where_op(self.query_mut(), column, operator, value);
    }

    fn where_in(&mut self, column: &str, values: Vec<Value>) {
        Constrainable::where_in(self.query_mut(), column, values);
    }

    fn where_null(&mut self, column: &str) {
        Constrainable::where_null(self.query_mut(), column);
    }

    fn where_not_null(&mut self, column: &str) {
        Constrainable::where_not_null(self.query_mut(), column);
    }

    fn order_by(&mut self, column: &str, direction: &str) {
        Constrainable::order_by(self.query_mut(), column, direction);
    }

    fn limit(&mut self, limit: u64) {
        Constrainable::limit(self.query_mut(), limit);
    }

    fn offset(&mut self, offset: u64) {
        Constrainable::offset(self.query_mut(), offset);
    }

    fn select(&mut self, columns: &[&str]) {
        Constrainable::select(self.query_mut(), columns);
    }
}

/// A loadable association between a parent model and related models
#[async_trait]
pub trait Relationship<P: Model>: Send {
    /// Constrain the relation query to the given set of parents
    fn add_eager_constraints(&mut self, parents: &[P]);

    /// Apply a user-supplied constraint to the relation query
    fn constrain(&mut self, constraint: &(dyn Fn(&mut dyn Constrainable) + Send + Sync));

    /// Hand nested relation paths down to the related model's builder
    fn set_nested(&mut self, specs: Vec<EagerSpec>);

    /// Set the default (empty) relation value on every parent
    fn init_relation(&self, parents: &mut [P]);

    /// Execute the relation query
    async fn load(&mut self, conn: &dyn Connection) -> Result<()>;

    /// Attach loaded results to their parents
    fn match_parents(&mut self, parents: &mut [P]);
}

/// One-to-many association: each parent owns zero or more children
/// carrying the parent's key in a foreign key column.
///
/// Key extraction and attachment are plain function pointers, so the
/// relation stays object-safe without any reflection over attributes.
pub struct HasMany<P: Model, C: Model + Clone> {
    builder: Builder<C>,
    foreign_key: String,
    parent_value: fn(&P) -> Value,
    child_value: fn(&C) -> Value,
    attach: fn(&mut P, Vec<C>),
    results: Vec<C>,
}

impl<P: Model, C: Model + Clone> HasMany<P, C> {
    /// Declare a has-many over `foreign_key` on the child table.
    ///
    /// `parent_value` reads the matched key off a parent, `child_value`
    /// reads the foreign key off a loaded child, and `attach` stores the
    /// matched children on their parent.
    pub fn new(
        foreign_key: &str,
        parent_value: fn(&P) -> Value,
        child_value: fn(&C) -> Value,
        attach: fn(&mut P, Vec<C>),
    ) -> Self {
        Self {
            builder: Builder::new(),
            foreign_key: foreign_key.to_string(),
            parent_value,
            child_value,
            attach,
            results: Vec::new(),
        }
    }

    fn parent_keys(&self, parents: &[P]) -> Vec<Value> {
        distinct_keys(parents, self.parent_value)
    }
}

#[async_trait]
impl<P: Model, C: Model + Clone> Relationship<P> for HasMany<P, C> {
    fn add_eager_constraints(&mut self, parents: &[P]) {
        let keys = self.parent_keys(parents);
        let column = C::qualified_column(&self.foreign_key);
        Constrainable::where_in(&mut self.builder, &column, keys);
    }

    fn constrain(&mut self, constraint: &(dyn Fn(&mut dyn Constrainable) + Send + Sync)) {
        constraint(&mut self.builder);
    }

    fn set_nested(&mut self, specs: Vec<EagerSpec>) {
        for spec in specs {
            self.builder.add_eager_spec(spec);
        }
    }

    fn init_relation(&self, parents: &mut [P]) {
        for parent in parents.iter_mut() {
            (self.attach)(parent, Vec::new());
        }
    }

    async fn load(&mut self, conn: &dyn Connection) -> Result<()> {
        self.results = self.builder.clone().get(conn).await?;
        Ok(())
    }

    fn match_parents(&mut self, parents: &mut [P]) {
        let mut groups: Vec<(Value, Vec<C>)> = Vec::new();
        for child in mem::take(&mut self.results) {
            let key = (self.child_value)(&child);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, bucket)) => bucket.push(child),
                None => groups.push((key, vec![child])),
            }
        }

        for parent in parents.iter_mut() {
            let key = (self.parent_value)(parent);
            let children = groups
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, bucket)| bucket.clone())
                .unwrap_or_default();
            (self.attach)(parent, children);
        }
    }
}

/// Many-to-one association: each parent holds a foreign key pointing at
/// one owning record (or none, when the key is NULL).
pub struct BelongsTo<P: Model, C: Model + Clone> {
    builder: Builder<C>,
    owner_key: String,
    foreign_value: fn(&P) -> Value,
    owner_value: fn(&C) -> Value,
    attach: fn(&mut P, Option<C>),
    results: Vec<C>,
}

impl<P: Model, C: Model + Clone> BelongsTo<P, C> {
    /// Declare a belongs-to over `owner_key` on the owning table.
    pub fn new(
        owner_key: &str,
        foreign_value: fn(&P) -> Value,
        owner_value: fn(&C) -> Value,
        attach: fn(&mut P, Option<C>),
    ) -> Self {
        Self {
            builder: Builder::new(),
            owner_key: owner_key.to_string(),
            foreign_value,
            owner_value,
            attach,
            results: Vec::new(),
        }
    }
}

#[async_trait]
impl<P: Model, C: Model + Clone> Relationship<P> for BelongsTo<P, C> {
    fn add_eager_constraints(&mut self, parents: &[P]) {
        let keys = distinct_keys(parents, self.foreign_value);
        let column = C::qualified_column(&self.owner_key);
        Constrainable::where_in(&mut self.builder, &column, keys);
    }

    fn constrain(&mut self, constraint: &(dyn Fn(&mut dyn Constrainable) + Send + Sync)) {
        constraint(&mut self.builder);
    }

    fn set_nested(&mut self, specs: Vec<EagerSpec>) {
        for spec in specs {
            self.builder.add_eager_spec(spec);
        }
    }

    fn init_relation(&self, parents: &mut [P]) {
        for parent in parents.iter_mut() {
            (self.attach)(parent, None);
        }
    }

    async fn load(&mut self, conn: &dyn Connection) -> Result<()> {
        self.results = self.builder.clone().get(conn).await?;
        Ok(())
    }

    fn match_parents(&mut self, parents: &mut [P]) {
        let owners = mem::take(&mut self.results);
        for parent in parents.iter_mut() {
            let key = (self.foreign_value)(parent);
            let owner = if key.is_null() {
                None
            } else {
                owners
                    .iter()
                    .find(|owner| (self.owner_value)(owner) == key)
                    .cloned()
            };
            (self.attach)(parent, owner);
        }
    }
}

/// Distinct non-null key values across a parent set, in first-seen order
fn distinct_keys<P>(parents: &[P], extract: fn(&P) -> Value) -> Vec<Value> {
    let mut keys = Vec::new();
    for parent in parents {
        let key = extract(parent);
        if !key.is_null() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
