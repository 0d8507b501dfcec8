//! # Model Builder
//!
//! The model-aware query façade. `Builder<M>` composes SQL through the
//! generic [`QueryBuilder`], hydrates result rows into `M` instances,
//! resolves eager-loaded relations, and applies scopes.
//!
//! ## Overview
//!
//! A builder starts from the model's table with its global scopes applied
//! (soft-deleting models hide trashed rows), collects refinements through
//! the fluent methods, and finishes with an async terminal operation that
//! takes the [`Connection`] to run against:
//!
//! ```rust,ignore
//! let users = Builder::<User>::new()
//!     .where_eq("active", json!(true))
//!     .with(&["orders.lines"])
//!     .order_desc("created_at")
//!     .get(&conn)
//!     .await?;
//! ```
//!
//! ## Key Operations
//!
//! - Retrieval: `find`, `find_many`, `first`, `get`, plus the `_or_fail`
//!   forms that raise [`QuarryError::ModelNotFound`]
//! - Columns: `value`, `pluck` (both consult [`Model::accessor`])
//! - Batching: `chunk`, `paginate`
//! - Aggregates: `count`, `exists`
//! - Writes: `insert`, `update`, `delete`, `force_delete`, `restore`

pub mod eager;

pub use eager::{Constraint, EagerSpec};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::connection::Connection;
use crate::error::{QuarryError, Result};
use crate::model::Model;
use crate::query_builder::{Page, QueryBuilder, WhereClause};
use crate::relations::Constrainable;
use crate::row::Row;
use crate::scopes::{Scope, SoftDeletingScope};

/// Model-aware query builder for `M`
pub struct Builder<M: Model> {
    query: QueryBuilder,
    eager: Vec<EagerSpec>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Builder<M> {
    /// Create a builder for the model's table with global scopes applied
    pub fn new() -> Self {
        SoftDeletingScope.apply(Self::without_scopes())
    }

    /// Create a builder without any global scope
    ///
    /// Nested where groups build on a scope-free builder so the group
    /// contains only what the closure adds.
    pub fn without_scopes() -> Self {
        Self {
            query: QueryBuilder::new(M::TABLE),
            eager: Vec::new(),
            _model: PhantomData,
        }
    }

    // --- query refinement -------------------------------------------------

    /// Set specific columns to select
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.query = self.query.select(columns);
        self
    }

    /// Append a raw select expression
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.query = self.query.select_raw(expression);
        self
    }

    /// Add an equality condition
    pub fn where_eq(mut self, column: &str, value: Value) -> Self {
        self.query = self.query.where_eq(column, value);
        self
    }

    /// Add a comparison condition with an explicit operator
    pub fn where_op(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.query = self.query.where_op(column, operator, value);
        self
    }

    /// Add a comparison condition joined with OR
    pub fn or_where_op(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.query = self.query.or_where_op(column, operator, value);
        self
    }

    /// Add a WHERE IN condition
    pub fn where_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.query = self.query.where_in(column, values);
        self
    }

    /// Add a WHERE NOT IN condition
    pub fn where_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.query = self.query.where_not_in(column, values);
        self
    }

    /// Add a WHERE IS NULL condition
    pub fn where_null(mut self, column: &str) -> Self {
        self.query = self.query.where_null(column);
        self
    }

    /// Add a WHERE IS NOT NULL condition
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.query = self.query.where_not_null(column);
        self
    }

    /// Add a WHERE BETWEEN condition
    pub fn where_between(mut self, column: &str, start: Value, end: Value) -> Self {
        self.query = self.query.where_between(column, start, end);
        self
    }

    /// Add a raw WHERE condition with its own bindings
    pub fn where_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        self.query = self.query.where_raw(sql, bindings);
        self
    }

    /// Add a parenthesized group of prepared clauses
    pub fn where_nested(mut self, clauses: Vec<WhereClause>) -> Self {
        self.query = self.query.where_nested(clauses);
        self
    }

    /// Build a parenthesized group through a closure.
    ///
    /// The closure receives a scope-free builder for the same model, so
    /// named scopes compose inside the group. A group that adds nothing
    /// is dropped.
    pub fn where_group<F>(self, group: F) -> Self
    where
        F: FnOnce(Builder<M>) -> Builder<M>,
    {
        let clauses = group(Self::without_scopes()).into_query().into_wheres();
        if clauses.is_empty() {
            return self;
        }
        self.where_nested(clauses)
    }

    /// Build a parenthesized group joined with OR
    pub fn or_where_group<F>(mut self, group: F) -> Self
    where
        F: FnOnce(Builder<M>) -> Builder<M>,
    {
        let clauses = group(Self::without_scopes()).into_query().into_wheres();
        if clauses.is_empty() {
            return self;
        }
        self.query = self.query.or_where_nested(clauses);
        self
    }

    /// Add an INNER JOIN
    pub fn inner_join(mut self, table: &str, on_condition: &str) -> Self {
        self.query = self.query.inner_join(table, on_condition);
        self
    }

    /// Add a LEFT JOIN
    pub fn left_join(mut self, table: &str, on_condition: &str) -> Self {
        self.query = self.query.left_join(table, on_condition);
        self
    }

    /// Add GROUP BY columns
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.query = self.query.group_by(columns);
        self
    }

    /// Add a HAVING comparison
    pub fn having(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.query = self.query.having(column, operator, value);
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.query = self.query.order_by(column, direction);
        self
    }

    /// Add ORDER BY ASC
    pub fn order_asc(mut self, column: &str) -> Self {
        self.query = self.query.order_asc(column);
        self
    }

    /// Add ORDER BY DESC
    pub fn order_desc(mut self, column: &str) -> Self {
        self.query = self.query.order_desc(column);
        self
    }

    /// Add LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    /// Alias of `limit`
    pub fn take(self, count: u64) -> Self {
        self.limit(count)
    }

    /// Add OFFSET clause
    pub fn offset(mut self, offset: u64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    /// Alias of `offset`
    pub fn skip(self, count: u64) -> Self {
        self.offset(count)
    }

    /// Add LIMIT/OFFSET for a 1-indexed page
    pub fn for_page(mut self, page: u64, per_page: u64) -> Self {
        self.query = self.query.for_page(page, per_page);
        self
    }

    /// Select distinct rows
    pub fn distinct(mut self) -> Self {
        self.query = self.query.distinct();
        self
    }

    // --- scopes and soft deletes ------------------------------------------

    /// Apply a named scope
    pub fn scope<S>(self, scope: &S) -> Self
    where
        S: Scope<M> + ?Sized,
    {
        scope.apply(self)
    }

    /// Include soft-deleted rows by lifting the soft-delete scope.
    ///
    /// Only the IS NULL check on the model's soft-delete column is
    /// removed; every other condition stays. No-op for models without
    /// soft deletes.
    pub fn with_trashed(mut self) -> Self {
        if let Some(column) = M::soft_delete_column() {
            let qualified = M::qualified_column(column);
            self.query
                .retain_wheres(|clause| !clause.is_null_check_on(&qualified));
        }
        self
    }

    /// Match only soft-deleted rows
    pub fn only_trashed(self) -> Self {
        match M::soft_delete_column() {
            Some(column) => {
                let qualified = M::qualified_column(column);
                self.with_trashed().where_not_null(&qualified)
            }
            None => self,
        }
    }

    // --- eager loading ----------------------------------------------------

    /// Register relation paths to eager load.
    ///
    /// Dot-paths register each parent ahead of its children, so
    /// `with(&["orders.lines"])` registers `orders` and `orders.lines`.
    pub fn with(mut self, names: &[&str]) -> Self {
        for name in names {
            eager::register_path(&mut self.eager, name, None);
        }
        self
    }

    /// Register a single relation path
    pub fn with_one(self, name: &str) -> Self {
        self.with(&[name])
    }

    /// Register a relation path plus a constraint on its query
    pub fn with_constraint<F>(mut self, name: &str, constraint: F) -> Self
    where
        F: Fn(&mut dyn Constrainable) + Send + Sync + 'static,
    {
        eager::register_path(&mut self.eager, name, Some(Arc::new(constraint)));
        self
    }

    /// Merge an already-built eager spec into this builder
    pub fn add_eager_spec(&mut self, spec: EagerSpec) {
        let EagerSpec { name, constraint } = spec;
        eager::register_path(&mut self.eager, &name, constraint);
    }

    /// The registered eager-load entries, in load order
    pub fn eager_loads(&self) -> &[EagerSpec] {
        &self.eager
    }

    // --- accessors --------------------------------------------------------

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryBuilder {
        &mut self.query
    }

    pub fn into_query(self) -> QueryBuilder {
        self.query
    }

    pub fn to_sql(&self) -> String {
        self.query.to_sql()
    }

    pub fn bindings(&self) -> Vec<Value> {
        self.query.bindings()
    }

    // --- terminal operations ----------------------------------------------

    /// Find one model by primary key
    pub async fn find(
        self,
        conn: &dyn Connection,
        key: impl Into<Value> + Send,
    ) -> Result<Option<M>> {
        self.where_eq(&M::qualified_key(), key.into())
            .first(conn)
            .await
    }

    /// Find the models whose primary keys are in `keys`
    pub async fn find_many(self, conn: &dyn Connection, keys: Vec<Value>) -> Result<Vec<M>> {
        self.where_in(&M::qualified_key(), keys).get(conn).await
    }

    /// Find one model by primary key or fail with `ModelNotFound`
    pub async fn find_or_fail(self, conn: &dyn Connection, key: impl Into<Value> + Send) -> Result<M> {
        self.find(conn, key)
            .await?
            .ok_or_else(|| QuarryError::model_not_found(M::NAME))
    }

    /// The first model the query matches
    pub async fn first(self, conn: &dyn Connection) -> Result<Option<M>> {
        let mut models = self.take(1).get(conn).await?;
        Ok(if models.is_empty() {
            None
        } else {
            Some(models.swap_remove(0))
        })
    }

    /// The first model or `ModelNotFound`
    pub async fn first_or_fail(self, conn: &dyn Connection) -> Result<M> {
        self.first(conn)
            .await?
            .ok_or_else(|| QuarryError::model_not_found(M::NAME))
    }

    /// Run the query, hydrate models, and eager load registered relations.
    ///
    /// Relations only load when the query produced at least one model.
    pub async fn get(self, conn: &dyn Connection) -> Result<Vec<M>> {
        let Self { query, eager, .. } = self;
        let (sql, bindings) = query.render();
        tracing::debug!(table = M::TABLE, sql = %sql, "executing select");

        let rows = conn.select(&sql, &bindings).await?;
        let mut models = hydrate::<M>(&rows)?;

        if !models.is_empty() && !eager.is_empty() {
            eager::load_relations(conn, &eager, &mut models).await?;
        }
        Ok(models)
    }

    /// Run the query and hydrate models without eager loading
    pub async fn get_models(self, conn: &dyn Connection) -> Result<Vec<M>> {
        let (sql, bindings) = self.query.render();
        let rows = conn.select(&sql, &bindings).await?;
        hydrate::<M>(&rows)
    }

    /// A single column from the first matched row
    pub async fn value(self, conn: &dyn Connection, column: &str) -> Result<Option<Value>> {
        let rows = self.select(&[column]).take(1).fetch_rows(conn).await?;
        Ok(rows.first().map(|row| read_column::<M>(column, row)))
    }

    /// A single column across all matched rows
    pub async fn pluck(self, conn: &dyn Connection, column: &str) -> Result<Vec<Value>> {
        let rows = self.select(&[column]).fetch_rows(conn).await?;
        Ok(rows
            .iter()
            .map(|row| read_column::<M>(column, row))
            .collect())
    }

    /// Feed matched models to `callback` a page at a time.
    ///
    /// Pages run until one comes back empty; a short page still triggers
    /// one more query. Returning `false` from the callback stops early.
    pub async fn chunk<F>(self, conn: &dyn Connection, size: u64, mut callback: F) -> Result<()>
    where
        F: FnMut(Vec<M>) -> bool + Send,
    {
        let mut page = 1u64;
        loop {
            let results = self.clone().for_page(page, size).get(conn).await?;
            if results.is_empty() {
                break;
            }
            if !callback(results) {
                break;
            }
            page += 1;
        }
        Ok(())
    }

    /// Count the rows the query matches
    pub async fn count(self, conn: &dyn Connection) -> Result<u64> {
        let (sql, bindings) = self.query.count_query().render();
        let rows = conn.select(&sql, &bindings).await?;
        match rows.first() {
            Some(row) => row.get_u64("aggregate"),
            None => Ok(0),
        }
    }

    /// Whether the query matches any row
    pub async fn exists(self, conn: &dyn Connection) -> Result<bool> {
        let (sql, bindings) = self.query.exists_query().render();
        let rows = conn.select(&sql, &bindings).await?;
        Ok(!rows.is_empty())
    }

    /// One page of models plus pagination metadata.
    ///
    /// `per_page` defaults to the model's `PER_PAGE`. Grouped queries
    /// defeat COUNT(*), so they fetch every model and slice the page in
    /// memory.
    pub async fn paginate(
        self,
        conn: &dyn Connection,
        page: u64,
        per_page: Option<u64>,
    ) -> Result<Page<M>> {
        let per_page = per_page.unwrap_or(M::PER_PAGE);
        let page = page.max(1);

        if self.query.has_group_by() {
            let all = self.get(conn).await?;
            let total = all.len() as u64;
            let start = page.saturating_sub(1).saturating_mul(per_page) as usize;
            let items: Vec<M> = all
                .into_iter()
                .skip(start)
                .take(per_page as usize)
                .collect();
            return Ok(Page::new(items, total, per_page, page));
        }

        let total = self.clone().count(conn).await?;
        let items = if total == 0 {
            Vec::new()
        } else {
            self.for_page(page, per_page).get(conn).await?
        };
        Ok(Page::new(items, total, per_page, page))
    }

    /// Insert rows into the model's table, returning rows affected
    pub async fn insert(self, conn: &dyn Connection, rows: Vec<Row>) -> Result<u64> {
        let (sql, bindings) = self.query.insert_sql(&rows)?;
        tracing::debug!(table = M::TABLE, rows = rows.len(), "executing insert");
        conn.execute(&sql, &bindings).await
    }

    /// Update matched rows with the given changes
    pub async fn update(self, conn: &dyn Connection, changes: Row) -> Result<u64> {
        let (sql, bindings) = self.query.update_sql(&changes)?;
        tracing::debug!(table = M::TABLE, "executing update");
        conn.execute(&sql, &bindings).await
    }

    /// Delete matched rows.
    ///
    /// Soft-deleting models stamp their soft-delete column instead of
    /// removing rows; `force_delete` removes them regardless.
    pub async fn delete(self, conn: &dyn Connection) -> Result<u64> {
        match M::soft_delete_column() {
            Some(column) => {
                let stamp = Value::String(Utc::now().to_rfc3339());
                self.update(conn, Row::from_pairs([(column, stamp)])).await
            }
            None => self.force_delete(conn).await,
        }
    }

    /// Delete matched rows, bypassing soft deletes
    pub async fn force_delete(self, conn: &dyn Connection) -> Result<u64> {
        let (sql, bindings) = self.query.delete_sql();
        tracing::debug!(table = M::TABLE, "executing delete");
        conn.execute(&sql, &bindings).await
    }

    /// Clear the soft-delete stamp on matched rows.
    ///
    /// Returns 0 without a query for models that do not soft delete.
    pub async fn restore(self, conn: &dyn Connection) -> Result<u64> {
        match M::soft_delete_column() {
            Some(column) => {
                self.with_trashed()
                    .update(conn, Row::from_pairs([(column, Value::Null)]))
                    .await
            }
            None => Ok(0),
        }
    }

    async fn fetch_rows(self, conn: &dyn Connection) -> Result<Vec<Row>> {
        let (sql, bindings) = self.query.render();
        conn.select(&sql, &bindings).await
    }
}

/// Column read shared by `value` and `pluck`: missing columns read as
/// NULL, and the model's accessor gets the final say
fn read_column<M: Model>(column: &str, row: &Row) -> Value {
    let value = row.get(column).cloned().unwrap_or(Value::Null);
    M::accessor(column, &value).unwrap_or(value)
}

fn hydrate<M: Model>(rows: &[Row]) -> Result<Vec<M>> {
    rows.iter().map(M::from_row).collect()
}

impl<M: Model> Default for Builder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Builder<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            eager: self.eager.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Builder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("model", &M::NAME)
            .field("query", &self.query)
            .field("eager", &self.eager)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Ticket {
        #[allow(dead_code)]
        id: i64,
    }

    impl Model for Ticket {
        const TABLE: &'static str = "tickets";
        const NAME: &'static str = "Ticket";

        fn soft_delete_column() -> Option<&'static str> {
            Some("deleted_at")
        }

        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                id: row.get_i64("id")?,
            })
        }
    }

    #[test]
    fn test_new_applies_soft_delete_scope() {
        let builder = Builder::<Ticket>::new();
        assert_eq!(
            builder.to_sql(),
            "SELECT * FROM tickets WHERE tickets.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_with_trashed_removes_only_the_soft_delete_check() {
        let builder = Builder::<Ticket>::new()
            .where_eq("status", json!("open"))
            .where_null("closed_at")
            .with_trashed();

        assert_eq!(
            builder.to_sql(),
            "SELECT * FROM tickets WHERE status = ? AND closed_at IS NULL"
        );
    }

    #[test]
    fn test_only_trashed() {
        let builder = Builder::<Ticket>::new().only_trashed();
        assert_eq!(
            builder.to_sql(),
            "SELECT * FROM tickets WHERE tickets.deleted_at IS NOT NULL"
        );
    }

    #[test]
    fn test_with_parses_dot_paths_in_order() {
        let builder = Builder::<Ticket>::new().with(&["assignee", "comments.author"]);
        let names: Vec<&str> = builder
            .eager_loads()
            .iter()
            .map(|spec| spec.name.as_str())
            .collect();
        assert_eq!(names, vec!["assignee", "comments", "comments.author"]);
    }

    #[test]
    fn test_with_constraint_lands_on_its_path() {
        let builder = Builder::<Ticket>::new()
            .with(&["comments.author"])
            .with_constraint("comments", |query| {
                query.where_null("hidden_at");
            });

        let specs = builder.eager_loads();
        assert_eq!(specs.len(), 2);
        assert!(specs[0].has_constraint());
        assert!(!specs[1].has_constraint());
    }

    #[test]
    fn test_where_group_renders_parenthesized() {
        let builder = Builder::<Ticket>::new()
            .where_eq("foo", json!("bar"))
            .where_group(|group| {
                group
                    .where_op("baz", ">", json!(9000))
                    .or_where_op("qux", "=", json!("quux"))
            });

        assert_eq!(
            builder.to_sql(),
            "SELECT * FROM tickets WHERE tickets.deleted_at IS NULL AND foo = ? AND (baz > ? OR qux = ?)"
        );
        assert_eq!(
            builder.bindings(),
            vec![json!("bar"), json!(9000), json!("quux")]
        );
    }

    #[test]
    fn test_empty_where_group_is_dropped() {
        let builder = Builder::<Ticket>::new().where_group(|group| group);
        assert_eq!(
            builder.to_sql(),
            "SELECT * FROM tickets WHERE tickets.deleted_at IS NULL"
        );
    }
}
