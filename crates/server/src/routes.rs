use std::path::Path;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::metrics;
use crate::state::AppState;

pub mod invite;

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

async fn metrics_endpoint() -> (axum::http::StatusCode, String) {
    metrics::encode_metrics()
}

/// API routes plus the built frontend as fallback for every other path.
pub fn build_router(state: AppState, cors: CorsLayer, frontend_dir: &str) -> Router {
    let index = Path::new(frontend_dir).join("index.html");
    let static_dir = ServeDir::new(frontend_dir).fallback(ServeFile::new(index));

    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/send-invite", post(invite::send_invite))
        .route("/api/bulk-invite", post(invite::bulk_invite))
        .route("/api/bulk-invite/template", get(invite::bulk_invite_template))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    api.fallback_service(static_dir)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
