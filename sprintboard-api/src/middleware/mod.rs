/// Middleware for the API server
///
/// - `security`: OWASP response headers

pub mod security;
