//! Shared model fixtures for builder integration tests
//!
//! A small commerce schema: users own orders, orders own lines and point
//! back at their user. Posts soft delete. User carries a name accessor so
//! column reads can be checked end to end.

#![allow(dead_code)] // Not every test file touches every fixture

use quarry_orm::{BelongsTo, HasMany, Model, Relationship, Result, Row};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub orders: Vec<Order>,
}

impl Model for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_str("name")?,
            email: row.get_str("email")?,
            orders: Vec::new(),
        })
    }

    fn relation(name: &str) -> Option<Box<dyn Relationship<Self>>> {
        match name {
            "orders" => Some(Box::new(HasMany::<User, Order>::new(
                "user_id",
                |user| json!(user.id),
                |order| json!(order.user_id),
                |user, orders| user.orders = orders,
            ))),
            _ => None,
        }
    }

    fn accessor(column: &str, value: &Value) -> Option<Value> {
        match (column, value) {
            ("name", Value::String(name)) => Some(json!(name.to_uppercase())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub reference: String,
    pub total: i64,
    pub lines: Vec<OrderLine>,
    pub customer: Option<User>,
}

impl Model for Order {
    const TABLE: &'static str = "orders";
    const NAME: &'static str = "Order";

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_i64("user_id")?,
            reference: row.get_str("reference")?,
            total: row.get_i64("total")?,
            lines: Vec::new(),
            customer: None,
        })
    }

    fn relation(name: &str) -> Option<Box<dyn Relationship<Self>>> {
        match name {
            "lines" => Some(Box::new(HasMany::<Order, OrderLine>::new(
                "order_id",
                |order| json!(order.id),
                |line| json!(line.order_id),
                |order, lines| order.lines = lines,
            ))),
            "customer" => Some(Box::new(BelongsTo::<Order, User>::new(
                "id",
                |order| json!(order.user_id),
                |user| json!(user.id),
                |order, customer| order.customer = customer,
            ))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub sku: String,
}

impl Model for OrderLine {
    const TABLE: &'static str = "order_lines";
    const NAME: &'static str = "OrderLine";

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            order_id: row.get_i64("order_id")?,
            sku: row.get_str("sku")?,
        })
    }
}

/// Soft-deleting fixture
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub deleted_at: Option<String>,
}

impl Model for Post {
    const TABLE: &'static str = "posts";
    const NAME: &'static str = "Post";

    fn soft_delete_column() -> Option<&'static str> {
        Some("deleted_at")
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            title: row.get_str("title")?,
            deleted_at: row.opt_str("deleted_at")?,
        })
    }
}
