use async_trait::async_trait;
use models::OutgoingMail;

use crate::errors::ServiceError;

/// Outbound mail provider.
/// Implementations can spool to disk, call an HTTP API, or talk SMTP.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), ServiceError>;
}
