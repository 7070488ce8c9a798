/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use xfinance_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use xfinance_shared::auth::middleware::authenticate;

/// Journal sheets are posted whole, so ledger routes accept larger bodies
pub const LEDGER_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
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
/// ├── GET /health                          (public)
/// └── /api
///     ├── /auth/login, /auth/refresh       (public)
///     ├── /auth/me, /auth/password
///     ├── /companies[/:company_id]
///     │   ├── /accounts[/import]
///     │   ├── /customers
///     │   └── /cf-items
///     ├── /accounts/:id, /customers/:id, /cf-items/:id
///     ├── /roles[/:id[/permissions|/actions]], /permissions, /actions
///     ├── /users[/:id[/roles|/password]]
///     ├── /settings[/:key], /me/settings[/:key]
///     ├── /daily-tasks[/:id[/toggle]], /notes[/:id]
///     ├── /logs
///     ├── /ledger, /ledger/trial-balance
///     └── /journal/prepare
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing. Everything
/// under `/api` except login and refresh sits behind the JWT layer.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let ledger_routes = Router::new()
        .route("/ledger", post(routes::ledger::ledger))
        .route("/ledger/trial-balance", post(routes::ledger::trial_balance))
        .route("/journal/prepare", post(routes::ledger::prepare_journal))
        .layer(DefaultBodyLimit::max(LEDGER_BODY_LIMIT));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/password", put(routes::auth::change_password))
        // Companies and their masters
        .route(
            "/companies",
            get(routes::companies::list).post(routes::companies::create),
        )
        .route(
            "/companies/:company_id",
            get(routes::companies::get)
                .put(routes::companies::update)
                .delete(routes::companies::delete),
        )
        .route(
            "/companies/:company_id/accounts",
            get(routes::accounts::list).post(routes::accounts::create),
        )
        .route("/companies/:company_id/accounts/import", put(routes::accounts::import))
        .route(
            "/accounts/:id",
            get(routes::accounts::get)
                .put(routes::accounts::update)
                .delete(routes::accounts::delete),
        )
        .route(
            "/companies/:company_id/customers",
            get(routes::customers::list).post(routes::customers::create),
        )
        .route(
            "/customers/:id",
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::delete),
        )
        .route(
            "/companies/:company_id/cf-items",
            get(routes::cf_items::list).post(routes::cf_items::create),
        )
        .route(
            "/cf-items/:id",
            get(routes::cf_items::get)
                .put(routes::cf_items::update)
                .delete(routes::cf_items::delete),
        )
        // Access administration
        .route("/roles", get(routes::roles::list).post(routes::roles::create))
        .route(
            "/roles/:id",
            get(routes::roles::get)
                .put(routes::roles::update)
                .delete(routes::roles::delete),
        )
        .route("/roles/:id/permissions", put(routes::roles::set_permissions))
        .route("/roles/:id/actions", put(routes::roles::set_actions))
        .route(
            "/permissions",
            get(routes::roles::list_permissions).post(routes::roles::create_permission),
        )
        .route("/permissions/:id", axum::routing::delete(routes::roles::delete_permission))
        .route(
            "/actions",
            get(routes::roles::list_actions).post(routes::roles::create_action),
        )
        .route("/actions/:code", axum::routing::delete(routes::roles::delete_action))
        .route("/users", get(routes::users::list).post(routes::users::create))
        .route(
            "/users/:id",
            get(routes::users::get)
                .put(routes::users::update)
                .delete(routes::users::delete),
        )
        .route("/users/:id/roles", put(routes::users::set_roles))
        .route("/users/:id/password", put(routes::users::reset_password))
        // Workspace
        .route("/settings", get(routes::settings::list))
        .route(
            "/settings/:key",
            get(routes::settings::get)
                .put(routes::settings::put)
                .delete(routes::settings::delete),
        )
        .route("/me/settings", get(routes::settings::list_mine))
        .route(
            "/me/settings/:key",
            put(routes::settings::put_mine).delete(routes::settings::delete_mine),
        )
        .route(
            "/daily-tasks",
            get(routes::daily_tasks::list).post(routes::daily_tasks::create),
        )
        .route(
            "/daily-tasks/:id",
            put(routes::daily_tasks::update).delete(routes::daily_tasks::delete),
        )
        .route("/daily-tasks/:id/toggle", post(routes::daily_tasks::toggle))
        .route("/notes", get(routes::notes::list).post(routes::notes::create))
        .route(
            "/notes/:id",
            put(routes::notes::update).delete(routes::notes::delete),
        )
        .route("/logs", get(routes::logs::list))
        .merge(ledger_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
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

/// Validates the access token and injects the `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
