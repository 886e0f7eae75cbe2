use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::metrics;
use crate::routes;
use crate::state::AppState;
use service::{
    audit::{AuditSink, TracingAuditSink},
    bulk_invite::BulkInviteService,
    invite::{InviteService, Mailer, OutboxMailer},
    resume::ResumeLinks,
    runtime::{self, SignupStores},
    wizard::WizardSettings,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Handler state from config. Without an outbox the invite routes answer 501.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let mailer: Option<Arc<dyn Mailer>> = match &cfg.mail.outbox_path {
        Some(path) => {
            let outbox = OutboxMailer::new(path).await?;
            info!(%path, "mail outbox enabled");
            Some(outbox)
        }
        None => {
            warn!("no mail outbox configured; invite relay disabled");
            None
        }
    };
    let invites = InviteService::new(mailer, cfg.mail.from.clone());
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let bulk = BulkInviteService::new(invites.clone(), Some(audit), cfg.registration.public_origin.clone());
    Ok(AppState::new(invites, bulk))
}

/// Signup storage from `[registration]`; expired resume tokens are purged on open.
pub fn open_signup_stores(cfg: &AppConfig) -> Result<SignupStores, StartupError> {
    let reg = &cfg.registration;
    let stores = SignupStores::open_file(
        Path::new(&reg.storage_path),
        reg.namespace.as_deref(),
        ResumeLinks::new(reg.public_origin.clone(), reg.signup_path.clone()),
    )
    .map_err(|e| StartupError::Storage(e.to_string()))?;
    Ok(stores.with_settings(WizardSettings {
        resume_ttl_minutes: reg.resume_ttl_minutes,
        autosave_debounce: Duration::from_millis(reg.autosave_debounce_ms),
        ..WizardSettings::default()
    }))
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    routes::build_router(state, build_cors(), &cfg.server.frontend_dir)
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_default()?;
    run_with(cfg).await
}

pub async fn run_with(cfg: AppConfig) -> anyhow::Result<()> {
    runtime::ensure_env(&cfg.server.frontend_dir, &cfg.server.data_dir).await?;

    let signup = open_signup_stores(&cfg)?;
    info!(
        ttl_minutes = signup.settings.resume_ttl_minutes,
        debounce_ms = signup.settings.autosave_debounce.as_millis() as u64,
        "signup defaults"
    );

    metrics::init();
    if let Some(admin_addr) = &cfg.server.admin_addr {
        common::admin_http::spawn_admin_server(admin_addr, metrics::encode_metrics);
    }

    let state = build_state(&cfg).await?;
    let app = build_app(&cfg, state);

    let addr = bind_addr(&cfg)?;
    info!(%addr, frontend = %cfg.server.frontend_dir, "starting faxinar server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 4100;
        assert_eq!(bind_addr(&cfg).unwrap().port(), 4100);
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn signup_stores_follow_registration_config() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut cfg = AppConfig::default();
        cfg.registration.storage_path = dir.path().join("signup.json").to_string_lossy().to_string();
        cfg.registration.resume_ttl_minutes = 30;
        cfg.registration.autosave_debounce_ms = 100;
        let stores = open_signup_stores(&cfg)?;
        assert_eq!(stores.settings.resume_ttl_minutes, 30);
        assert_eq!(stores.settings.autosave_debounce, Duration::from_millis(100));
        let link = stores.wizard().create_resume_link().unwrap_or_default();
        assert!(link.starts_with("http://127.0.0.1:4001/cadastro?resume="));
        Ok(())
    }

    #[tokio::test]
    async fn state_without_outbox_is_unconfigured() -> anyhow::Result<()> {
        let state = build_state(&AppConfig::default()).await?;
        assert!(!state.invites.is_configured());
        Ok(())
    }
}
