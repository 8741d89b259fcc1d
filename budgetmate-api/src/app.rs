/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use budgetmate_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
    routes,
};
use axum::{
    routing::{get, post},
    Router,
};
use budgetmate_shared::auth::session::SessionManager;
use budgetmate_shared::auth::session_cache::{InMemorySessionCache, SessionCache};
use budgetmate_shared::categorize::Categorizer;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Session store with its in-memory cache
    pub sessions: SessionManager,

    pub categorizer: Categorizer,
}

impl AppState {
    /// State with a fresh in-memory session cache.
    pub fn new(db: PgPool, config: Config) -> Self {
        let cache = Arc::new(InMemorySessionCache::new(chrono::Duration::seconds(
            config.session.cache_ttl_secs,
        )));
        Self::with_cache(db, config, cache)
    }

    pub fn with_cache(db: PgPool, config: Config, cache: Arc<dyn SessionCache>) -> Self {
        let sessions = SessionManager::new(
            db.clone(),
            cache,
            chrono::Duration::days(config.session.ttl_days),
        );
        let categorizer = Categorizer::from_api_key(
            config.categorizer.api_key.as_deref(),
            &config.categorizer.model,
        );

        Self {
            db,
            config: Arc::new(config),
            sessions,
            categorizer,
        }
    }

    /// Replaces the categorizer, e.g. with a scripted client in tests.
    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = categorizer;
        self
    }
}

/// Builds the complete router.
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /signup, /login, /demo-login, /logout
/// ├── GET|POST /join/:code
/// └── /app                          # session cookie required
///     ├── GET  /                    # dashboard
///     ├── /transactions[/:id]
///     ├── /budgets, /budgets/category, /budgets/requests, /budgets/vote
///     ├── /goals[/:id], /goals/contribute
///     ├── /subscriptions[/:id]
///     ├── /notifications, /notifications/count, /notifications/read[-all]
///     ├── /family, /family/invite
///     ├── /settings/profile, /settings/password
///     ├── /settings/invite, /settings/invite/:id/accept|decline
///     └── POST /categorize
/// ```
///
/// Middleware, outermost first: security headers, compression, tracing.
/// Session authentication wraps `/app` only.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/demo-login", post(routes::auth::demo_login))
        .route("/logout", post(routes::auth::logout))
        .route(
            "/join/:code",
            get(routes::family::join_preview).post(routes::family::join),
        );

    let app_routes = Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .route(
            "/transactions",
            get(routes::transactions::list_transactions)
                .post(routes::transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(routes::transactions::get_transaction)
                .post(routes::transactions::update_transaction)
                .delete(routes::transactions::delete_transaction),
        )
        .route(
            "/budgets",
            get(routes::budgets::budget_grid).post(routes::budgets::save_budget),
        )
        .route("/budgets/category", post(routes::budgets::add_category))
        .route("/budgets/requests", post(routes::budgets::create_request))
        .route("/budgets/vote", post(routes::budgets::vote))
        .route(
            "/goals",
            get(routes::goals::list_goals).post(routes::goals::create_goal),
        )
        .route("/goals/contribute", post(routes::goals::contribute))
        .route("/goals/:id", axum::routing::delete(routes::goals::delete_goal))
        .route(
            "/subscriptions",
            get(routes::subscriptions::list_subscriptions)
                .post(routes::subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            axum::routing::delete(routes::subscriptions::delete_subscription),
        )
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/count", get(routes::notifications::unread_count))
        .route("/notifications/read/:id", post(routes::notifications::mark_read))
        .route("/notifications/read-all", post(routes::notifications::mark_all_read))
        .route("/family", get(routes::family::overview))
        .route("/family/invite", post(routes::family::create_invite))
        .route("/settings/profile", post(routes::settings::update_profile))
        .route("/settings/password", post(routes::settings::change_password))
        .route("/settings/invite", post(routes::family::invite_member))
        .route(
            "/settings/invite/:id/accept",
            post(routes::family::accept_invite),
        )
        .route(
            "/settings/invite/:id/decline",
            post(routes::family::decline_invite),
        )
        .route("/categorize", post(routes::categorize::categorize))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let enable_hsts = state.config.session.secure_cookies;

    Router::new()
        .merge(public_routes)
        .nest("/app", app_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new().gzip(true))
        .layer(SecurityHeadersLayer::new(enable_hsts))
        .with_state(state)
}
