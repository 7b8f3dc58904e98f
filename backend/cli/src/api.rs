use axum::{routing::get, Router};

/// Build the Axum router: health check plus the channel's webhook routes.
pub fn build_router(channel_router: Router) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(channel_router)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
