//! # EventHub Shared Library
//!
//! Types and business rules shared by the API server and the client.
//!
//! ## Module Organization
//!
//! - `models`: users, events and their PostgreSQL operations
//! - `auth`: password hashing, session tokens, request identity
//! - `store`: persistence traits with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the EventHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
