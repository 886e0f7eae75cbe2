use std::sync::Arc;

use async_trait::async_trait;
use models::OutgoingMail;
use uuid::Uuid;

use super::mailer::Mailer;
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// Mailer that spools messages to a JSON outbox file keyed by message id.
/// Delivery is left to whatever drains the outbox.
#[derive(Clone)]
pub struct OutboxMailer {
    store: Arc<JsonMapStore<Uuid, OutgoingMail>>,
}

impl OutboxMailer {
    /// Open the outbox at `path`, creating it if missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<Uuid, OutgoingMail>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub async fn pending(&self) -> Vec<OutgoingMail> {
        let mut mails = self.store.values().await;
        mails.sort_by_key(|m| m.queued_at);
        mails
    }

    /// Take every queued message, oldest first.
    pub async fn drain(&self) -> Result<Vec<OutgoingMail>, ServiceError> {
        let mut mails = self.store.drain().await?;
        mails.sort_by_key(|m| m.queued_at);
        Ok(mails)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), ServiceError> {
        self.store.insert(mail.id, mail).await?;
        Ok(())
    }
}
