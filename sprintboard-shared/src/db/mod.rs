/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Table access itself lives in `models`; `store` puts those behind a trait.

pub mod migrations;
pub mod pool;
