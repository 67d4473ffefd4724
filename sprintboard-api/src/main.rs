//! # Sprintboard API Server
//!
//! Project management backend: users, projects with owner and role-based
//! members, and sprints.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/sprintboard \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p sprintboard-api
//! ```

use sprintboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use sprintboard_shared::{
    db::{migrations::run_migrations, pool},
    mail::ConsoleMailer,
    store::PgStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sprintboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Sprintboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    let address = config.bind_address();
    let state = AppState::new(
        Arc::new(PgStore::new(db.clone())),
        Arc::new(ConsoleMailer),
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
