//! Lightweight admin HTTP server spawner
//!
//! Exposes `/healthz` and `/metrics` endpoints, with metrics provided by caller.

use std::thread;
use axum::{routing::get, Router};
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tracing::{error, info};

async fn healthz() -> &'static str { "OK" }

async fn metrics_handler(f: fn() -> (StatusCode, String)) -> (StatusCode, String) {
    f()
}

/// Spawn an admin HTTP server on its own thread and runtime.
/// Failures to start are logged; the main server keeps running without it.
pub fn spawn_admin_server(addr: &str, metrics_fn: fn() -> (StatusCode, String)) {
    let addr = addr.to_string();
    thread::spawn(move || {
        let rt = match Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                error!(error = %e, "failed to build admin runtime");
                return;
            }
        };
        rt.block_on(async move {
            let mf = metrics_fn;
            let router = Router::new()
                .route("/healthz", get(healthz))
                .route("/metrics", get(move || metrics_handler(mf)));
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(%addr, error = %e, "admin server bind failed");
                    return;
                }
            };
            info!(%addr, "admin server listening");
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "admin server stopped");
            }
        });
    });
}
