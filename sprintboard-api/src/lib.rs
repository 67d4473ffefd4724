//! # Sprintboard API Server Library
//!
//! HTTP surface of Sprintboard: accounts, projects, project members and
//! sprints, with every project route gated by the authorization service in
//! `sprintboard_shared::auth::authorization`.
//!
//! ## Modules
//!
//! - `app`: application state, router builder and the identity middleware
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
