//! Integration tests for eager loading.
//!
//! Scripted result sets drive full parent-then-relation query sequences
//! through the fake connection, including dot-nested paths and
//! constrained relation queries.

mod common;

use common::*;
use quarry_orm::test_helpers::FakeConnection;
use quarry_orm::{Builder, QuarryError};
use serde_json::json;

#[tokio::test]
async fn test_with_loads_a_relation_in_one_extra_query() {
    let conn = FakeConnection::new()
        .with_select(vec![
            user_row(1, "dave", "dave@example.com"),
            user_row(2, "bella", "bella@example.com"),
        ])
        .with_select(vec![
            order_row(10, 1, "A-1", 100),
            order_row(11, 2, "A-2", 250),
            order_row(12, 1, "A-3", 75),
        ]);

    let users = Builder::<User>::new()
        .with(&["orders"])
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM orders WHERE orders.user_id IN (?, ?)",
        ]
    );
    assert_eq!(conn.bindings_at(1), vec![json!(1), json!(2)]);

    assert_eq!(users[0].orders.len(), 2);
    assert_eq!(users[1].orders.len(), 1);
    assert_eq!(users[0].orders[1].reference, "A-3");
}

#[tokio::test]
async fn test_nested_dot_paths_load_level_by_level() {
    let conn = FakeConnection::new()
        .with_select(vec![
            user_row(1, "dave", "dave@example.com"),
            user_row(2, "bella", "bella@example.com"),
        ])
        .with_select(vec![
            order_row(10, 1, "A-1", 100),
            order_row(11, 2, "A-2", 250),
        ])
        .with_select(vec![
            order_line_row(100, 10, "SKU-RED"),
            order_line_row(101, 10, "SKU-BLUE"),
            order_line_row(102, 11, "SKU-GREEN"),
        ]);

    let users = Builder::<User>::new()
        .with(&["orders.lines"])
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT * FROM users",
            "SELECT * FROM orders WHERE orders.user_id IN (?, ?)",
            "SELECT * FROM order_lines WHERE order_lines.order_id IN (?, ?)",
        ]
    );

    let first_order = &users[0].orders[0];
    assert_eq!(first_order.lines.len(), 2);
    assert_eq!(first_order.lines[1].sku, "SKU-BLUE");
    assert_eq!(users[1].orders[0].lines[0].sku, "SKU-GREEN");
}

#[tokio::test]
async fn test_relation_constraints_refine_the_relation_query() {
    let conn = FakeConnection::new()
        .with_select(vec![user_row(1, "dave", "dave@example.com")])
        .with_select(vec![order_row(10, 1, "A-1", 250)]);

    let users = Builder::<User>::new()
        .with_constraint("orders", |query| {
            query.where_op("total", ">", json!(100));
        })
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log()[1],
        "SELECT * FROM orders WHERE orders.user_id IN (?) AND total > ?"
    );
    assert_eq!(conn.bindings_at(1), vec![json!(1), json!(100)]);
    assert_eq!(users[0].orders.len(), 1);
}

#[tokio::test]
async fn test_constraints_can_reorder_and_trim_columns() {
    let conn = FakeConnection::new()
        .with_select(vec![user_row(1, "dave", "dave@example.com")])
        .with_select(vec![
            order_row(11, 1, "A-2", 250),
            order_row(10, 1, "A-1", 100),
        ]);

    Builder::<User>::new()
        .with_constraint("orders", |query| {
            query.order_by("total", "DESC");
        })
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log()[1],
        "SELECT * FROM orders WHERE orders.user_id IN (?) ORDER BY total DESC"
    );
}

#[tokio::test]
async fn test_no_relation_queries_when_nothing_matched() {
    let conn = FakeConnection::new();

    let users = Builder::<User>::new()
        .with(&["orders.lines"])
        .get(&conn)
        .await
        .unwrap();

    assert!(users.is_empty());
    assert_eq!(conn.statements().len(), 1);
}

#[tokio::test]
async fn test_unknown_relation_names_error() {
    let conn = FakeConnection::new().with_select(vec![user_row(1, "dave", "dave@example.com")]);

    let err = Builder::<User>::new()
        .with(&["ghosts"])
        .get(&conn)
        .await
        .unwrap_err();

    assert!(matches!(err, QuarryError::RelationNotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Undefined relation on model: User: ghosts"
    );
}

#[tokio::test]
async fn test_belongs_to_attaches_the_owning_model() {
    let conn = FakeConnection::new()
        .with_select(vec![
            order_row(10, 1, "A-1", 100),
            order_row(11, 2, "A-2", 250),
        ])
        .with_select(vec![
            user_row(1, "dave", "dave@example.com"),
            user_row(2, "bella", "bella@example.com"),
        ]);

    let orders = Builder::<Order>::new()
        .with_one("customer")
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT * FROM orders",
            "SELECT * FROM users WHERE users.id IN (?, ?)",
        ]
    );
    assert_eq!(orders[0].customer.as_ref().map(|u| u.id), Some(1));
    assert_eq!(orders[1].customer.as_ref().map(|u| u.id), Some(2));
}

#[tokio::test]
async fn test_belongs_to_without_a_loaded_owner_stays_none() {
    let conn = FakeConnection::new()
        .with_select(vec![
            order_row(10, 1, "A-1", 100),
            order_row(11, 7, "A-2", 250),
        ])
        .with_select(vec![user_row(1, "dave", "dave@example.com")]);

    let orders = Builder::<Order>::new()
        .with_one("customer")
        .get(&conn)
        .await
        .unwrap();

    assert!(orders[0].customer.is_some());
    assert!(orders[1].customer.is_none());
}

#[tokio::test]
async fn test_parent_constraints_survive_nested_registration() {
    let constrained_first = Builder::<User>::new()
        .with_constraint("orders", |query| {
            query.where_op("total", ">", json!(0));
        })
        .with(&["orders.lines"]);

    let names: Vec<&str> = constrained_first
        .eager_loads()
        .iter()
        .map(|spec| spec.name.as_str())
        .collect();
    assert_eq!(names, vec!["orders", "orders.lines"]);
    assert!(constrained_first.eager_loads()[0].has_constraint());

    let constrained_last = Builder::<User>::new()
        .with(&["orders.lines"])
        .with_constraint("orders", |query| {
            query.where_op("total", ">", json!(0));
        });

    assert!(constrained_last.eager_loads()[0].has_constraint());
    assert!(!constrained_last.eager_loads()[1].has_constraint());
}
