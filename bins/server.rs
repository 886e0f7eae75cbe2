use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn main() -> ExitCode {
    dotenv().ok();
    let cfg = match configs::AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "server", event = "config_invalid", error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging_with_format(&cfg.server.log_format);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "server", event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "faxinar server starting"
    );

    rt.block_on(async move {
        let server_task = tokio::spawn(server::startup::run_with(cfg));
        tokio::select! {
            res = server_task => match res {
                Ok(Ok(())) => {
                    info!(service = "server", event = "stop", %service_id, pid, "server stopped normally");
                    ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    error!(service = "server", event = "run_failed", error = %e, "server returned error");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    error!(service = "server", event = "task_join_error", error = %e, "server task join error");
                    ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                // in-flight requests are dropped
                info!(service = "server", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                ExitCode::SUCCESS
            }
        }
    })
}
