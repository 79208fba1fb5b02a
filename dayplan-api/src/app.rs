/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use dayplan_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = dayplan_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use dayplan_shared::auth::session::SessionManager;
use dayplan_shared::models::user::User;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session manager (token issuance, rotation, authentication)
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let sessions = Arc::new(SessionManager::new(config.session_config()));
        Self {
            db,
            config: Arc::new(config),
            sessions,
        }
    }
}

/// The authenticated user, injected into request extensions by
/// [`auth_layer`]
///
/// Handlers behind the auth middleware extract it with
/// `Extension<CurrentUser>`.
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                      # Health check (public)
/// ├── /uploads/*                   # Profile pictures (static)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register       # Public
///     │   ├── POST /login          # Public
///     │   ├── POST /refresh        # Public (refresh token in body)
///     │   └── POST /logout         # Authenticated
///     ├── /users/
///     │   ├── GET  /me
///     │   ├── PUT  /profile
///     │   ├── PUT  /profile/password
///     │   └── POST /profile/picture
///     └── /tasks/
///         ├── GET    /             # List, enriched with completion
///         ├── POST   /             # Create
///         ├── GET    /history      # Completion history
///         ├── PUT    /:id          # Update
///         ├── DELETE /:id          # Delete
///         └── POST   /:id/complete # Mark complete
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Logout needs a valid access token
    let logout_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // User routes (authenticated)
    let user_routes = Router::new()
        .route("/me", get(routes::users::me))
        .route("/profile", put(routes::users::update_profile))
        .route("/profile/password", put(routes::users::change_password))
        .route("/profile/picture", post(routes::users::upload_profile_picture))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Task routes (authenticated)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route("/history", get(routes::tasks::completion_history))
        .route("/:id", put(routes::tasks::update_task).delete(routes::tasks::delete_task))
        .route("/:id/complete", post(routes::tasks::mark_complete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes.merge(logout_routes))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
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
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .nest_service(
            "/uploads",
            ServeDir::new(&state.config.api.uploads_dir),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Access-token authentication middleware
///
/// Extracts the Bearer token from the Authorization header, resolves it to
/// a user through the session manager, and injects [`CurrentUser`] into
/// request extensions.
async fn auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let user = state.sessions.authenticate(&state.db, token).await?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
