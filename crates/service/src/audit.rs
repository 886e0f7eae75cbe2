use async_trait::async_trait;
use models::AuditEntry;
use tracing::{info, warn};

use crate::errors::ServiceError;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), ServiceError>;
}

/// Emits each entry as a structured `audit` tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), ServiceError> {
        info!(
            target: "audit",
            actor = %entry.actor,
            action = %entry.action,
            entity = %entry.entity,
            entity_id = %entry.entity_id,
            details = %entry.details,
            created_at = %entry.created_at,
        );
        Ok(())
    }
}

/// Record an audit entry. Never fails; returns whether the entry was stored.
pub async fn audit_log(sink: Option<&dyn AuditSink>, entry: AuditEntry) -> bool {
    let Some(sink) = sink else {
        info!(action = %entry.action, "no audit sink; skipping audit entry");
        return false;
    };
    match sink.record(&entry).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, action = %entry.action, "audit_log error");
            false
        }
    }
}
