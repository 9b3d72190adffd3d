//! HTTP trigger surface -- axum routes and handlers.

mod routes;
pub mod state;

use self::state::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the application router. The trigger route lives at the configured
/// `trigger_path`.
pub fn router(state: AppState) -> Router {
    let trigger_path = state.runner.config().trigger_path.clone();
    Router::new()
        .merge(routes::routes(&trigger_path))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "Not Found")
}
