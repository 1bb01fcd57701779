mod admin;
mod page;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{create_pool, init_database_with_pool};
use crate::models::{ApiResponse, Snapshot, StatusReport};
use crate::services::{spawn_scheduler, Refresher, SharedSnapshot};

/// Shared state handed to every handler; replaces any global snapshot.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub snapshot: SharedSnapshot,
    pub refresher: Arc<Refresher>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Arc<Config>, refresher: Arc<Refresher>) -> Self {
        Self {
            pool,
            config,
            snapshot: refresher.snapshot(),
            refresher,
        }
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: msg.into() }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: msg.into() }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::FORBIDDEN, message: msg.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.message));
        (self.status, body).into_response()
    }
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    let snapshot = Arc::new(RwLock::new(Snapshot::default()));
    let refresher = Arc::new(Refresher::from_config(pool.clone(), config.clone(), snapshot)?);
    let scheduler = spawn_scheduler(refresher.clone(), config.refresh_interval);

    let app = create_router(AppState::new(pool, config.clone(), refresher));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("matchcast listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/status", get(status_handler))
        .route("/health", get(health_check))
        .route("/api/matches", get(matches_handler))
        .route("/admin/matches", get(admin::list_matches).post(admin::create_match))
        .route("/admin/matches/{id}", put(admin::update_match).delete(admin::delete_match))
        .route("/admin/refresh", post(admin::refresh_now))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("matchcast is running"))
}

// GET /status - size, source and age of the current snapshot
async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    let snapshot = state.snapshot.read().await;
    Json(StatusReport::from(&*snapshot))
}

// GET /api/matches - the snapshot as JSON
async fn matches_handler(State(state): State<AppState>) -> Json<ApiResponse<Snapshot>> {
    let snapshot = state.snapshot.read().await.clone();
    Json(ApiResponse::success(snapshot))
}
