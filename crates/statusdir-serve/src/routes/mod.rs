//! API route definitions.

mod directory;
mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
///
/// - `GET /` - Directory listing, filterable with `?valid=all|true|false`
///   (default `true`)
/// - `GET /v1` - Alias for `/`
/// - `GET /health` - Health check
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(directory::directory))
        .route("/v1", get(directory::directory))
        .route("/health", get(health::health_check))
        .with_state(state)
}
