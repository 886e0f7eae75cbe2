//! Bulk invites from an uploaded CSV.

use std::sync::Arc;

use chrono::Duration;
use models::{AuditEntry, BulkInviteReport, InvitePayload, RowError};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::audit::{audit_log, AuditSink};
use crate::clock::{Clock, SystemClock};
use crate::csv_import::{first_field, CsvRecord};
use crate::invite::InviteService;
use crate::validators::looks_like_email;

pub const INVITE_TTL_DAYS: i64 = 7;
pub const DEFAULT_USER_TYPE: &str = "client";

const EMAIL_KEYS: [&str; 3] = ["email", "Email", "E-mail"];
const USER_TYPE_KEYS: [&str; 3] = ["userType", "type", "tipo"];
const NAME_KEYS: [&str; 3] = ["full_name", "name", "Nome"];

pub struct BulkInviteService {
    invites: InviteService,
    audit: Option<Arc<dyn AuditSink>>,
    origin: String,
    clock: Arc<dyn Clock>,
}

impl BulkInviteService {
    pub fn new(invites: InviteService, audit: Option<Arc<dyn AuditSink>>, origin: impl Into<String>) -> Self {
        Self {
            invites,
            audit,
            origin: origin.into().trim_end_matches('/').to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn activation_link(&self, token: &str) -> String {
        format!("{}/activate?token={}", self.origin, urlencoding::encode(token))
    }

    /// Invite every row in order. A bad row is reported and skipped; it never
    /// stops the batch.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn run(&self, rows: &[CsvRecord], actor: &str) -> BulkInviteReport {
        let mut report = BulkInviteReport { total: rows.len(), ..Default::default() };
        for (i, rec) in rows.iter().enumerate() {
            match self.invite_row(rec, actor).await {
                Ok(()) => report.sent += 1,
                Err(reason) => report.errors.push(RowError { row: i + 1, reason }),
            }
            report.done += 1;
        }
        info!(sent = report.sent, failed = report.errors.len(), "bulk invite finished");
        report
    }

    async fn invite_row(&self, rec: &CsvRecord, actor: &str) -> Result<(), String> {
        let email = first_field(rec, &EMAIL_KEYS).unwrap_or("");
        if !looks_like_email(email) {
            return Err("email inválido".to_string());
        }
        let user_type = first_field(rec, &USER_TYPE_KEYS).unwrap_or(DEFAULT_USER_TYPE);
        let token = Uuid::new_v4().to_string();
        let now = self.clock.now();
        let expires_at = now + Duration::days(INVITE_TTL_DAYS);

        let entry = AuditEntry {
            actor: actor.to_string(),
            action: "bulk_invite_create".into(),
            entity: "invite".into(),
            entity_id: token.clone(),
            details: json!({
                "email": email,
                "userType": user_type,
                "fullName": first_field(rec, &NAME_KEYS).unwrap_or(""),
                "expiresAt": expires_at.to_rfc3339(),
            }),
            created_at: now,
        };
        audit_log(self.audit.as_deref(), entry).await;

        let payload = InvitePayload {
            email: email.to_string(),
            link: self.activation_link(&token),
            kind: user_type.to_string(),
            from: Some(actor.to_string()),
        };
        self.invites.send_invite(&payload).await.map_err(|e| e.to_string())
    }
}
