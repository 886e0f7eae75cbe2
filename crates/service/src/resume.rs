//! Resume tokens: short-lived handles on a progress snapshot, shared as a link,
//! a `mailto:` URI or an SMS text.
//!
//! The registry lives in the same storage as the wizard progress, so a token
//! only resolves where that storage is reachable. Like the progress store,
//! every operation degrades to `None`/`false` on storage failure.

use std::sync::Arc;

use models::{FormProgress, ResumeTokenEntry, ResumeTokenMap};
use rand::{rngs::OsRng, Rng};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::errors::{ServiceError, StorageError};
use crate::storage::{read_json, write_json, KeyValueStorage, StorageKeys};

pub const DEFAULT_TTL_MINUTES: u64 = 24 * 60;
pub const TOKEN_LEN: usize = 8;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_TOKEN_ATTEMPTS: usize = 8;

pub const RESUME_EMAIL_SUBJECT: &str = "Retomar cadastro — Leidy Cleaner";

/// Host navigation, e.g. handing a `mailto:` URI to the user's mail client.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ServiceError>;
}

/// Builds `<origin><path>?resume=<token>` links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeLinks {
    origin: String,
    path: String,
}

impl ResumeLinks {
    pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self { origin, path }
    }

    pub fn origin(&self) -> &str { &self.origin }

    pub fn generate_resume_link(&self, token: &str) -> String {
        format!("{}{}?resume={}", self.origin, self.path, urlencoding::encode(token))
    }
}

/// Extract the `resume` parameter from a query string (leading `?` optional).
pub fn resume_token_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "resume")
        .and_then(|(_, v)| urlencoding::decode(&v.replace('+', " ")).ok().map(|v| v.into_owned()))
        .filter(|v| !v.is_empty())
}

/// `mailto:` URI carrying the resume link, or `None` when either part is empty.
pub fn resume_mailto(email: &str, link: &str) -> Option<String> {
    if email.trim().is_empty() || link.trim().is_empty() {
        return None;
    }
    let body = format!(
        "Olá,\r\n\r\nVocê pode retomar seu cadastro usando o link abaixo:\r\n{link}\r\n\r\nAtenciosamente,\r\nLeidy Cleaner"
    );
    Some(format!(
        "mailto:{}?subject={}&body={}",
        email.trim(),
        urlencoding::encode(RESUME_EMAIL_SUBJECT),
        urlencoding::encode(&body)
    ))
}

/// Text the UI copies for an SMS.
pub fn resume_sms_text(link: &str) -> String {
    format!("Retome seu cadastro Leidy Cleaner: {link}")
}

/// Hand the resume `mailto:` URI to the opener. Best-effort.
pub fn send_resume_email(opener: &dyn UrlOpener, email: &str, link: &str) -> bool {
    let Some(uri) = resume_mailto(email, link) else {
        return false;
    };
    match opener.open(&uri) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "could not open mail client");
            false
        }
    }
}

fn random_token() -> String {
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[OsRng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

pub struct ResumeTokenRegistry {
    storage: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
    clock: Arc<dyn Clock>,
    links: ResumeLinks,
}

impl ResumeTokenRegistry {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        keys: StorageKeys,
        clock: Arc<dyn Clock>,
        links: ResumeLinks,
    ) -> Self {
        Self { storage, keys, clock, links }
    }

    pub fn links(&self) -> &ResumeLinks { &self.links }

    /// A corrupt map is dropped so the next write replaces it.
    fn load_map(&self) -> Result<ResumeTokenMap, StorageError> {
        match read_json(self.storage.as_ref(), &self.keys.resume_tokens) {
            Ok(map) => Ok(map.unwrap_or_default()),
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!(%reason, "corrupt resume token map, starting over");
                Ok(ResumeTokenMap::new())
            }
            Err(e) => Err(e),
        }
    }

    fn save_map(&self, map: &ResumeTokenMap) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), &self.keys.resume_tokens, map)
    }

    /// Store a snapshot under a fresh token valid for `ttl_minutes`.
    #[instrument(skip(self, progress), fields(step = %progress.step))]
    pub fn create_resume_token(&self, progress: &FormProgress, ttl_minutes: u64) -> Option<String> {
        match self.try_create(progress, ttl_minutes) {
            Ok(token) => {
                info!(ttl_minutes, "resume token created");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "create_resume_token failed");
                None
            }
        }
    }

    fn try_create(&self, progress: &FormProgress, ttl_minutes: u64) -> Result<String, StorageError> {
        let mut map = self.load_map()?;
        let token = (0..MAX_TOKEN_ATTEMPTS)
            .map(|_| random_token())
            .find(|t| !map.contains_key(t))
            .ok_or_else(|| StorageError::Unavailable("no free resume token".into()))?;
        let ttl_ms = i64::try_from(ttl_minutes).unwrap_or(i64::MAX / 60_000).saturating_mul(60_000);
        let expires = self.clock.now_millis().saturating_add(ttl_ms);
        map.insert(token.clone(), ResumeTokenEntry { progress: progress.clone(), expires });
        self.save_map(&map)?;
        Ok(token)
    }

    /// Snapshot behind `token` while it is valid. An expired entry is deleted.
    #[instrument(skip_all)]
    pub fn get_progress_by_token(&self, token: &str) -> Option<FormProgress> {
        match self.try_get(token) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "get_progress_by_token failed");
                None
            }
        }
    }

    fn try_get(&self, token: &str) -> Result<Option<FormProgress>, StorageError> {
        let mut map = self.load_map()?;
        let Some(entry) = map.get(token) else {
            debug!("unknown resume token");
            return Ok(None);
        };
        if entry.is_expired(self.clock.now_millis()) {
            map.remove(token);
            self.save_map(&map)?;
            info!("expired resume token removed");
            return Ok(None);
        }
        Ok(Some(entry.progress.clone()))
    }

    /// Delete a token once it has been used. Unknown tokens are a no-op.
    pub fn remove_resume_token(&self, token: &str) -> bool {
        let res = self.load_map().and_then(|mut map| {
            if map.remove(token).is_some() {
                self.save_map(&map)?;
            }
            Ok(())
        });
        match res {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "remove_resume_token failed");
                false
            }
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let res = self.load_map().and_then(|mut map| {
            let before = map.len();
            map.retain(|_, entry| !entry.is_expired(now));
            let removed = before - map.len();
            if removed > 0 {
                self.save_map(&map)?;
            }
            Ok(removed)
        });
        match res {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "purge_expired failed");
                0
            }
        }
    }

    pub fn generate_resume_link(&self, token: &str) -> String { self.links.generate_resume_link(token) }
}
