mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{AppError, AppResult};
pub use extractors::SESSION_COOKIE;
pub use state::AppState;

use crate::services::auth;
use crate::{Config, Database};
use anyhow::Result;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// The full application with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout);

    Router::new()
        .merge(routes::blog_routes())
        .merge(routes::account_routes())
        .merge(routes::community_routes())
        .merge(routes::json_routes())
        .fallback(not_found)
        .layer(request_timeout(timeout))
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers requests still running after `timeout` with 408.
pub fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "status": "NOTFOUND",
            "message": "Page not found",
        })),
    )
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db)?);

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        run_cleanup_job(cleanup_state).await;
    });

    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_cleanup_job(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        match auth::cleanup_expired_sessions(&state.db) {
            Ok(0) => {}
            Ok(n) => tracing::info!("Removed {} expired sessions", n),
            Err(e) => tracing::error!("Session cleanup failed: {}", e),
        }
        state.rate_limiter.cleanup();
    }
}
