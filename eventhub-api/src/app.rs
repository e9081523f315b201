/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use eventhub_api::{app::AppState, config::Config};
/// use eventhub_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(MemoryStore::new(), config);
/// let app = eventhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use eventhub_shared::{
    auth::{jwt, middleware::create_jwt_middleware},
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// User and event persistence
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: impl Store + 'static, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Issues a session token for `user_id` with the configured lifetime
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, jwt::JwtError> {
        jwt::issue_session_token(user_id, self.jwt_secret(), self.config.jwt.expiration_days)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /guest-login
///     │   ├── GET  /profile         (authenticated)
///     │   └── POST /convert-guest   (authenticated)
///     └── /events/
///         ├── GET    /              # List events
///         ├── POST   /              (authenticated)
///         ├── GET    /:id           # Event details
///         ├── PUT    /:id           (authenticated, organizer)
///         ├── DELETE /:id           (authenticated, organizer)
///         ├── POST   /:id/join      (authenticated)
///         └── POST   /:id/leave     (authenticated)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let auth = from_fn(create_jwt_middleware(state.jwt_secret().to_string()));

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/guest-login", post(routes::auth::guest_login))
        .route(
            "/profile",
            get(routes::auth::profile).route_layer(auth.clone()),
        )
        .route(
            "/convert-guest",
            post(routes::auth::convert_guest).route_layer(auth.clone()),
        );

    // Reads are public; every mutation goes through the JWT layer
    let event_routes = Router::new()
        .route(
            "/",
            get(routes::events::list_events)
                .merge(post(routes::events::create_event).route_layer(auth.clone())),
        )
        .route(
            "/:id",
            get(routes::events::get_event).merge(
                axum::routing::put(routes::events::update_event)
                    .delete(routes::events::delete_event)
                    .route_layer(auth.clone()),
            ),
        )
        .route(
            "/:id/join",
            post(routes::events::join_event).route_layer(auth.clone()),
        )
        .route(
            "/:id/leave",
            post(routes::events::leave_event).route_layer(auth),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/events", event_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
