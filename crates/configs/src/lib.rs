use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Optional `host:port` for the separate healthz/metrics listener.
    #[serde(default)]
    pub admin_addr: Option<String>,
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4001,
            worker_threads: Some(4),
            frontend_dir: default_frontend_dir(),
            data_dir: default_data_dir(),
            admin_addr: None,
            log_format: default_log_format(),
        }
    }
}

/// Settings for the signup wizard, its progress store and resume links.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// JSON file backing the key-value storage port.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Optional key prefix; keys become `<namespace>:<key>`.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_resume_ttl_minutes")]
    pub resume_ttl_minutes: u64,
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
    /// Scheme + host (+ port) used to build resume and activation links.
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
    #[serde(default = "default_signup_path")]
    pub signup_path: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            namespace: None,
            resume_ttl_minutes: default_resume_ttl_minutes(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            public_origin: default_public_origin(),
            signup_path: default_signup_path(),
        }
    }
}

/// Invite relay settings. Without `outbox_path` the relay answers 501.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub outbox_path: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self { outbox_path: None, from: default_mail_from() }
    }
}

fn default_frontend_dir() -> String { "dist".into() }
fn default_data_dir() -> String { "data".into() }
fn default_log_format() -> String { "compact".into() }
fn default_storage_path() -> String { "data/signup_storage.json".into() }
fn default_resume_ttl_minutes() -> u64 { 24 * 60 }
fn default_autosave_debounce_ms() -> u64 { 250 }
fn default_public_origin() -> String { "http://127.0.0.1:4001".into() }
fn default_signup_path() -> String { "/cadastro".into() }
fn default_mail_from() -> String { "noreply@faxinar.local".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults; env overrides applied either way.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::normalize_and_validate`] with an explicit env lookup.
    pub fn normalize_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.apply_env(&lookup);
        self.server.normalize()?;
        self.registration.apply_env(&lookup);
        self.registration.validate()?;
        self.mail.apply_env(&lookup);
        self.mail.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        Ok(())
    }
}

impl RegistrationConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(origin) = lookup("PUBLIC_ORIGIN") {
            self.public_origin = origin;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_path.trim().is_empty() {
            return Err(anyhow!("registration.storage_path is empty"));
        }
        if self.resume_ttl_minutes == 0 {
            return Err(anyhow!("registration.resume_ttl_minutes must be >= 1"));
        }
        let lower = self.public_origin.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("registration.public_origin must start with http:// or https://"));
        }
        if self.public_origin.ends_with('/') {
            return Err(anyhow!("registration.public_origin must not end with '/'"));
        }
        if !self.signup_path.starts_with('/') {
            return Err(anyhow!("registration.signup_path must start with '/'"));
        }
        Ok(())
    }
}

impl MailConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if self.outbox_path.as_deref().map_or(true, |p| p.trim().is_empty()) {
            self.outbox_path = lookup("MAIL_OUTBOX").filter(|p| !p.trim().is_empty());
        }
        if let Some(from) = lookup("MAIL_FROM") {
            self.from = from;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.from.contains('@') {
            return Err(anyhow!("mail.from must be an email address"));
        }
        Ok(())
    }
}
