//! # Sprintboard Shared Library
//!
//! Domain types, persistence and the project authorization service shared by
//! the Sprintboard API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: database models and their queries
//! - `store`: the `Store` trait with PostgreSQL and in-memory implementations
//! - `auth`: passwords, session tokens, request identity and project authorization
//! - `db`: connection pool and embedded migrations
//! - `dates`: sprint date input parsing
//! - `mail`: outgoing email and the invitation template

pub mod auth;
pub mod dates;
pub mod db;
pub mod mail;
pub mod models;
pub mod store;

/// Current version of the Sprintboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
