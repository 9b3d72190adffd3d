//! Route definitions.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use super::state::AppState;
use crate::runner::{compose_notice, Trigger};

pub fn routes(trigger_path: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(trigger_path, get(trigger).post(trigger))
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=UTF-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn index(State(state): State<AppState>) -> Response {
    let mut body = format!(
        "Visit {} to trigger a check-in\n\nNotification channels:\n",
        state.runner.config().trigger_path
    );
    for notifier in state.runner.notifiers() {
        let mark = if notifier.is_configured() { "✅" } else { "❌" };
        body.push_str(&format!("{mark} {}\n", notifier.name()));
    }
    plain_text(StatusCode::OK, body)
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339()
        }
    }))
}

/// Run one batch and answer with its report. Notifications are dispatched in
/// the background so they never delay or alter the response.
async fn trigger(State(state): State<AppState>) -> Response {
    info!("Check-in triggered over HTTP");
    let result = state.runner.run().await;

    let notice = compose_notice(Trigger::Http, &result, state.runner.config());
    let runner = state.runner.clone();
    tokio::spawn(async move {
        runner.notify(&notice).await;
    });

    match result {
        Ok(report) => plain_text(StatusCode::OK, report.lines().join("\n")),
        Err(e) => {
            error!(error = %e, "Triggered check-in failed");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}"))
        }
    }
}
