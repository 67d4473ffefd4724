/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sprintboard_api::{app::{build_router, AppState}, config::Config};
/// use sprintboard_shared::{mail::ConsoleMailer, store::MemoryStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(ConsoleMailer), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::security_headers};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use sprintboard_shared::{
    auth::{
        identity::{AuthError, CurrentUser},
        jwt,
    },
    mail::Mailer,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Name of the HTTP-only session cookie
pub const SESSION_COOKIE: &str = "token";

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register, /login, /refresh, /logout
///     │   └── GET  /me                               (authenticated)
///     └── /projects/                                 (authenticated)
///         ├── GET, POST /
///         ├── GET, PATCH, DELETE /:id
///         ├── GET, POST /:id/members
///         ├── PATCH, DELETE /:id/members/:member_id
///         ├── GET, POST /:id/sprints
///         └── PATCH, DELETE /:id/sprints/:sprint_id
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing, then identity
/// on the authenticated groups.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let identity = middleware::from_fn_with_state(state.clone(), identity_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .layer(identity.clone()),
        );

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            get(routes::members::list_members).post(routes::members::invite_member),
        )
        .route(
            "/:id/members/:member_id",
            patch(routes::members::update_member_role).delete(routes::members::remove_member),
        )
        .route(
            "/:id/sprints",
            get(routes::sprints::list_sprints).post(routes::sprints::create_sprint),
        )
        .route(
            "/:id/sprints/:sprint_id",
            patch(routes::sprints::update_sprint).delete(routes::sprints::delete_sprint),
        )
        .layer(identity);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            security_headers(production, req, next)
        }))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session token from `Authorization: Bearer`, else the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolves the caller and stores a [`CurrentUser`] in the request extensions
///
/// The user is re-loaded on every request, so tokens of deleted accounts
/// stop working immediately.
async fn identity_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token(req.headers()).ok_or(AuthError::MissingCredentials)?;

    let claims = jwt::validate_access_token(&token, state.jwt_secret())?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, user_id = %claims.sub, "Failed to load identity");
            AuthError::Internal
        })?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "Token for unknown user");
            AuthError::InvalidToken("User not found".to_string())
        })?;

    req.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(req).await)
}
