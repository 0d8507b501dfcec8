// Test Helpers Module
//
// Shared test doubles for exercising builder operations without a live
// database. Compiled into the library so integration tests and
// downstream crates can reuse them.

pub mod fake_connection;

pub use fake_connection::{FakeConnection, FakeConnectionState};
