//! HTTP CRUD service over Postgres tables.
//!
//! Library surface for the server binary and its integration tests.

pub mod config;
pub mod error;
pub mod routes;
pub mod schema;
pub mod validate;
