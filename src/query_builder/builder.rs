use super::conditions::{render_clause_list, Condition, LogicalOperator};
use super::{Join, Pagination, WhereClause};
use serde_json::Value;

use crate::error::{QuarryError, Result};
use crate::row::Row;

/// Generic SQL builder producing placeholder SQL plus bound values
///
/// All rendering uses `?` placeholders; a `Connection` implementation
/// rewrites them to its driver's positional style and binds the values.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    columns: Vec<String>,
    distinct: bool,
    joins: Vec<Join>,
    wheres: Vec<WhereClause>,
    group_by: Vec<String>,
    havings: Vec<WhereClause>,
    order_by: Vec<String>,
    pagination: Option<Pagination>,
}

impl QueryBuilder {
    /// Create a new query builder for the given table
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: vec!["*".to_string()],
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            group_by: Vec::new(),
            havings: Vec::new(),
            order_by: Vec::new(),
            pagination: None,
        }
    }

    /// Set specific columns to select, replacing the default `*`
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append a raw select expression to the column list
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.columns.push(expression.to_string());
        self
    }

    /// Add a JOIN clause
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add an INNER JOIN
    pub fn inner_join(self, table: &str, on_condition: &str) -> Self {
        self.join(Join::inner(table, on_condition))
    }

    /// Add a LEFT JOIN
    pub fn left_join(self, table: &str, on_condition: &str) -> Self {
        self.join(Join::left(table, on_condition))
    }

    /// Add a WHERE clause
    pub fn where_clause(mut self, clause: WhereClause) -> Self {
        self.wheres.push(clause);
        self
    }

    /// Add a simple equality condition
    pub fn where_eq(self, column: &str, value: Value) -> Self {
        self.where_clause(WhereClause::simple(column, "=", value))
    }

    /// Add a comparison condition with an explicit operator
    pub fn where_op(self, column: &str, operator: &str, value: Value) -> Self {
        self.where_clause(WhereClause::simple(column, operator, value))
    }

    /// Add a comparison condition joined with OR
    pub fn or_where_op(self, column: &str, operator: &str, value: Value) -> Self {
        self.where_clause(WhereClause::or(Condition::Simple {
            column: column.to_string(),
            operator: operator.to_string(),
            value,
        }))
    }

    /// Add WHERE IN condition
    pub fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause(WhereClause::in_condition(column, values))
    }

    /// Add WHERE NOT IN condition
    pub fn where_not_in(self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause(WhereClause::not_in_condition(column, values))
    }

    /// Add WHERE IS NULL condition
    pub fn where_null(self, column: &str) -> Self {
        self.where_clause(WhereClause::is_null(column))
    }

    /// Add WHERE IS NOT NULL condition
    pub fn where_not_null(self, column: &str) -> Self {
        self.where_clause(WhereClause::is_not_null(column))
    }

    /// Add WHERE BETWEEN condition
    pub fn where_between(self, column: &str, start: Value, end: Value) -> Self {
        self.where_clause(WhereClause::between(column, start, end))
    }

    /// Add a raw WHERE condition with its own bindings
    pub fn where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.where_clause(WhereClause::raw(sql, bindings))
    }

    /// Add a parenthesized group of conditions
    pub fn where_nested(self, clauses: Vec<WhereClause>) -> Self {
        self.where_clause(WhereClause::nested(clauses))
    }

    /// Add a parenthesized group joined with OR
    pub fn or_where_nested(self, clauses: Vec<WhereClause>) -> Self {
        self.where_clause(WhereClause::or(Condition::Nested { clauses }))
    }

    /// Add GROUP BY columns
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Add a HAVING comparison
    pub fn having(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.havings
            .push(WhereClause::simple(column, operator, value));
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.order_by.push(format!("{column} {direction}"));
        self
    }

    /// Add ORDER BY ASC
    pub fn order_asc(self, column: &str) -> Self {
        self.order_by(column, "ASC")
    }

    /// Add ORDER BY DESC
    pub fn order_desc(self, column: &str) -> Self {
        self.order_by(column, "DESC")
    }

    /// Add LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.set_limit(limit);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, offset: u64) -> Self {
        self.set_offset(offset);
        self
    }

    /// Add LIMIT/OFFSET for a 1-indexed page
    pub fn for_page(mut self, page: u64, per_page: u64) -> Self {
        self.pagination = Some(Pagination::new(page, per_page));
        self
    }

    /// Select distinct rows
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // Non-consuming mutators, used where the builder is behind a
    // trait object and cannot be moved.

    pub fn add_where(&mut self, clause: WhereClause) {
        self.wheres.push(clause);
    }

    pub fn set_columns(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
    }

    pub fn push_order(&mut self, column: &str, direction: &str) {
        self.order_by.push(format!("{column} {direction}"));
    }

    pub fn set_limit(&mut self, limit: u64) {
        if let Some(ref mut pagination) = self.pagination {
            pagination.limit = Some(limit);
        } else {
            self.pagination = Some(Pagination::limit_only(limit));
        }
    }

    pub fn set_offset(&mut self, offset: u64) {
        if let Some(ref mut pagination) = self.pagination {
            pagination.offset = Some(offset);
        } else {
            self.pagination = Some(Pagination::offset_only(offset));
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn wheres(&self) -> &[WhereClause] {
        &self.wheres
    }

    /// Consume the builder, keeping only its WHERE clauses
    pub fn into_wheres(self) -> Vec<WhereClause> {
        self.wheres
    }

    /// Drop WHERE clauses the predicate rejects, keeping the rest in order
    pub fn retain_wheres<F>(&mut self, predicate: F)
    where
        F: FnMut(&WhereClause) -> bool,
    {
        self.wheres.retain(predicate);
    }

    pub fn has_group_by(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Render the SELECT statement and its bindings
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let mut sql = String::from("SELECT ");

        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.columns.join(", "));
        sql.push_str(&format!(" FROM {}", self.table));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        let where_sql = render_clause_list(&self.wheres, &mut bindings);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by.join(", ")));
        }

        let having_sql = render_clause_list(&self.havings, &mut bindings);
        if !having_sql.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_sql);
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        if let Some(ref pagination) = self.pagination {
            sql.push_str(&pagination.to_sql());
        }

        (sql, bindings)
    }

    /// The SQL text alone
    pub fn to_sql(&self) -> String {
        self.render().0
    }

    /// The bound values alone, in placeholder order
    pub fn bindings(&self) -> Vec<Value> {
        self.render().1
    }

    /// Derive the COUNT(*) form of this query
    ///
    /// Ordering and pagination have no effect on the count and are
    /// stripped; GROUP BY is kept, so callers must treat grouped counts
    /// separately (one row per group comes back).
    pub fn count_query(&self) -> Self {
        let mut counter = self.clone();
        counter.columns = vec!["COUNT(*) AS aggregate".to_string()];
        counter.order_by.clear();
        counter.pagination = None;
        counter.distinct = false;
        counter
    }

    /// Derive a cheap existence probe for this query
    pub fn exists_query(&self) -> Self {
        let mut probe = self.clone();
        probe.columns = vec!["1".to_string()];
        probe.order_by.clear();
        probe.pagination = Some(Pagination::limit_only(1));
        probe
    }

    /// Render a multi-row INSERT for this table
    ///
    /// The column set comes from the first row; later rows bind NULL for
    /// any column they omit.
    pub fn insert_sql(&self, rows: &[Row]) -> Result<(String, Vec<Value>)> {
        let first = rows
            .first()
            .ok_or_else(|| QuarryError::query("insert requires at least one row"))?;
        if first.is_empty() {
            return Err(QuarryError::query("insert rows need at least one column"));
        }

        let columns: Vec<String> = first.column_names().map(str::to_string).collect();
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));

        let mut bindings = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            for column in &columns {
                bindings.push(row.get(column).cloned().unwrap_or(Value::Null));
            }
            tuples.push(tuple.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            columns.join(", "),
            tuples.join(", ")
        );
        Ok((sql, bindings))
    }

    /// Render an UPDATE constrained by the current WHERE clauses
    pub fn update_sql(&self, changes: &Row) -> Result<(String, Vec<Value>)> {
        if changes.is_empty() {
            return Err(QuarryError::query("update requires at least one column"));
        }

        let mut bindings: Vec<Value> = changes.pairs().iter().map(|(_, v)| v.clone()).collect();
        let assignments: Vec<String> = changes.column_names().map(|c| format!("{c} = ?")).collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        let where_sql = render_clause_list(&self.wheres, &mut bindings);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        Ok((sql, bindings))
    }

    /// Render a DELETE constrained by the current WHERE clauses
    pub fn delete_sql(&self) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.table);
        let where_sql = render_clause_list(&self.wheres, &mut bindings);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        (sql, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_basic_query_building() {
        let query = QueryBuilder::new("users")
            .select(&["id", "name"])
            .where_eq("name", json!("sandy"))
            .order_desc("created_at")
            .limit(10);

        let (sql, bindings) = query.render();
        assert_eq!(
            sql,
            "SELECT id, name FROM users WHERE name = ? ORDER BY created_at DESC LIMIT 10"
        );
        assert_eq!(bindings, vec![json!("sandy")]);
    }

    #[test]
    fn test_or_where_booleans() {
        let query = QueryBuilder::new("users")
            .where_eq("foo", json!("bar"))
            .or_where_op("baz", ">", json!(9000));

        let (sql, bindings) = query.render();
        assert_eq!(sql, "SELECT * FROM users WHERE foo = ? OR baz > ?");
        assert_eq!(bindings, vec![json!("bar"), json!(9000)]);
    }

    #[test]
    fn test_where_in_renders_placeholders() {
        let query = QueryBuilder::new("users").where_in("id", vec![json!(1), json!(2), json!(3)]);

        let (sql, bindings) = query.render();
        assert!(sql.contains("id IN (?, ?, ?)"));
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn test_empty_in_lists() {
        let none = QueryBuilder::new("users").where_in("id", vec![]);
        assert!(none.to_sql().contains("0 = 1"));
        assert!(none.bindings().is_empty());

        let all = QueryBuilder::new("users").where_not_in("id", vec![]);
        assert!(all.to_sql().contains("1 = 1"));
    }

    #[test]
    fn test_nested_group_rendering() {
        let query = QueryBuilder::new("users").where_eq("foo", json!("bar")).where_nested(vec![
            WhereClause::simple("baz", ">", json!(9000)),
            WhereClause::or(Condition::Simple {
                column: "qux".to_string(),
                operator: "=".to_string(),
                value: json!("quux"),
            }),
        ]);

        let (sql, bindings) = query.render();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE foo = ? AND (baz > ? OR qux = ?)"
        );
        assert_eq!(bindings, vec![json!("bar"), json!(9000), json!("quux")]);
    }

    #[test]
    fn test_empty_nested_group_is_dropped() {
        let query = QueryBuilder::new("users")
            .where_nested(vec![])
            .where_eq("foo", json!("bar"));

        let sql = query.to_sql();
        assert_eq!(sql, "SELECT * FROM users WHERE foo = ?");
    }

    #[test]
    fn test_join_query_building() {
        let query = QueryBuilder::new("users u")
            .inner_join("orders o", "o.user_id = u.id")
            .left_join("profiles p", "p.user_id = u.id")
            .where_eq("o.status", json!("open"));

        let sql = query.to_sql();
        assert!(sql.contains("INNER JOIN orders o ON o.user_id = u.id"));
        assert!(sql.contains("LEFT JOIN profiles p ON p.user_id = u.id"));
    }

    #[test]
    fn test_group_by_and_having() {
        let query = QueryBuilder::new("orders")
            .select(&["user_id", "COUNT(*) AS order_count"])
            .group_by(&["user_id"])
            .having("COUNT(*)", ">", json!(5));

        let (sql, bindings) = query.render();
        assert!(sql.contains("GROUP BY user_id"));
        assert!(sql.contains("HAVING COUNT(*) > ?"));
        assert_eq!(bindings, vec![json!(5)]);
    }

    #[test]
    fn test_count_query_strips_ordering_and_pagination() {
        let query = QueryBuilder::new("users")
            .where_eq("active", json!(true))
            .order_asc("name")
            .for_page(3, 25);

        let (sql, bindings) = query.count_query().render();
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS aggregate FROM users WHERE active = ?"
        );
        assert_eq!(bindings, vec![json!(true)]);
    }

    #[test]
    fn test_exists_query_probes_one_row() {
        let query = QueryBuilder::new("users").where_eq("email", json!("s@example.com"));
        let sql = query.exists_query().to_sql();
        assert_eq!(sql, "SELECT 1 FROM users WHERE email = ? LIMIT 1");
    }

    #[test]
    fn test_insert_sql() {
        let rows = vec![
            Row::from_pairs([("name", json!("sandy")), ("email", json!("s@example.com"))]),
            Row::from_pairs([("name", json!("robin")), ("email", json!("r@example.com"))]),
        ];

        let (sql, bindings) = QueryBuilder::new("users").insert_sql(&rows).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (name, email) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings[2], json!("robin"));
    }

    #[test]
    fn test_insert_sql_rejects_empty() {
        let err = QueryBuilder::new("users").insert_sql(&[]).unwrap_err();
        assert!(matches!(err, QuarryError::Query { .. }));
    }

    #[test]
    fn test_update_sql_appends_wheres() {
        let changes = Row::from_pairs([("name", json!("robin"))]);
        let query = QueryBuilder::new("users").where_eq("id", json!(7));

        let (sql, bindings) = query.update_sql(&changes).unwrap();
        assert_eq!(sql, "UPDATE users SET name = ? WHERE id = ?");
        assert_eq!(bindings, vec![json!("robin"), json!(7)]);
    }

    #[test]
    fn test_delete_sql() {
        let query = QueryBuilder::new("users").where_eq("id", json!(7));
        let (sql, bindings) = query.delete_sql();
        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(bindings, vec![json!(7)]);
    }

    proptest! {
        /// Placeholders and bindings stay aligned for generated queries
        #[test]
        fn placeholders_match_binding_count(
            ids in proptest::collection::vec(any::<i64>(), 0..8),
            name in "[a-z]{1,12}",
            use_or in any::<bool>(),
        ) {
            let mut query = QueryBuilder::new("users")
                .where_in("id", ids.into_iter().map(|id| json!(id)).collect())
                .where_eq("name", json!(name));
            if use_or {
                query = query.or_where_op("score", ">", json!(10));
            }

            let (sql, bindings) = query.render();
            prop_assert_eq!(sql.matches('?').count(), bindings.len());
        }
    }
}
