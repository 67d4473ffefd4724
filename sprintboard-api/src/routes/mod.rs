/// API route handlers, one module per resource
///
/// - `health`: liveness and database check
/// - `auth`: register, login, refresh, logout, me
/// - `projects`: project CRUD
/// - `members`: project membership and invitations
/// - `sprints`: sprint CRUD within a project

pub mod auth;
pub mod health;
pub mod members;
pub mod projects;
pub mod sprints;
