//! Row factories for builder integration tests

#![allow(dead_code)] // Not every test file uses every factory

use quarry_orm::Row;
use serde_json::json;

pub fn user_row(id: i64, name: &str, email: &str) -> Row {
    Row::from_pairs([
        ("id", json!(id)),
        ("name", json!(name)),
        ("email", json!(email)),
    ])
}

pub fn order_row(id: i64, user_id: i64, reference: &str, total: i64) -> Row {
    Row::from_pairs([
        ("id", json!(id)),
        ("user_id", json!(user_id)),
        ("reference", json!(reference)),
        ("total", json!(total)),
    ])
}

pub fn order_line_row(id: i64, order_id: i64, sku: &str) -> Row {
    Row::from_pairs([
        ("id", json!(id)),
        ("order_id", json!(order_id)),
        ("sku", json!(sku)),
    ])
}

pub fn post_row(id: i64, title: &str) -> Row {
    Row::from_pairs([
        ("id", json!(id)),
        ("title", json!(title)),
        ("deleted_at", serde_json::Value::Null),
    ])
}

pub fn trashed_post_row(id: i64, title: &str, deleted_at: &str) -> Row {
    Row::from_pairs([
        ("id", json!(id)),
        ("title", json!(title)),
        ("deleted_at", json!(deleted_at)),
    ])
}

pub fn aggregate_row(count: u64) -> Row {
    Row::from_pairs([("aggregate", json!(count))])
}
