//! Invite relay: composes the invitation mail and hands it to a [`Mailer`].

pub mod mailer;
pub mod outbox;

use std::sync::Arc;

use models::{InvitePayload, OutgoingMail};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};

pub use mailer::Mailer;
pub use outbox::OutboxMailer;

pub const INVITE_SUBJECT: &str = "Convite Faxinar";
pub const NOTIFICATION_SUBJECT: &str = "Notificação Faxinar";

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("email and link are required")]
    MissingFields,
    #[error("mail provider not configured on server")]
    NotConfigured,
    #[error("failed to send: {0}")]
    Provider(String),
}

#[derive(Clone)]
pub struct InviteService {
    mailer: Option<Arc<dyn Mailer>>,
    from: String,
    clock: Arc<dyn Clock>,
}

impl InviteService {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, from: impl Into<String>) -> Self {
        Self { mailer, from: from.into(), clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_configured(&self) -> bool { self.mailer.is_some() }

    pub fn compose(&self, payload: &InvitePayload) -> OutgoingMail {
        let subject = if payload.is_invite() { INVITE_SUBJECT } else { NOTIFICATION_SUBJECT };
        let link = payload.link.trim();
        let sender = payload.from.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or("admin");
        OutgoingMail {
            id: Uuid::new_v4(),
            to: payload.email.trim().to_string(),
            from: self.from.clone(),
            subject: subject.to_string(),
            text: format!("Olá, você foi convidado. Ative sua conta aqui: {link}"),
            html: format!(
                "<p>Olá,</p><p>Você foi convidado para a plataforma. Clique no link abaixo para ativar sua conta:</p>\
                 <p><a href=\"{link}\">{link}</a></p><p>Enviado por: {sender}</p>"
            ),
            queued_at: self.clock.now(),
        }
    }

    /// Validate, compose and hand off one invite.
    ///
    /// ```
    /// use models::InvitePayload;
    /// use service::invite::{InviteError, InviteService};
    ///
    /// let svc = InviteService::new(None, "noreply@faxinar.local");
    /// let res = tokio_test::block_on(svc.send_invite(&InvitePayload::new("ana@example.com", "https://x")));
    /// assert!(matches!(res, Err(InviteError::NotConfigured)));
    /// ```
    #[instrument(skip_all, fields(kind = %payload.kind))]
    pub async fn send_invite(&self, payload: &InvitePayload) -> Result<(), InviteError> {
        if !payload.has_required_fields() {
            return Err(InviteError::MissingFields);
        }
        let Some(mailer) = &self.mailer else {
            return Err(InviteError::NotConfigured);
        };
        let mail = self.compose(payload);
        let id = mail.id;
        match mailer.send(mail).await {
            Ok(()) => {
                info!(%id, "invite queued");
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "invite delivery failed");
                Err(InviteError::Provider(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), ServiceError> {
            if self.fail {
                return Err(ServiceError::External("smtp down".into()));
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_fields_rejected_before_mailer() {
        let svc = InviteService::new(None, "noreply@faxinar.local");
        let err = svc.send_invite(&InvitePayload::new(" ", "https://x")).await.unwrap_err();
        assert!(matches!(err, InviteError::MissingFields));
        let err = svc.send_invite(&InvitePayload::new("a@b.com", "")).await.unwrap_err();
        assert!(matches!(err, InviteError::MissingFields));
    }

    #[tokio::test]
    async fn no_mailer_is_not_configured() {
        let svc = InviteService::new(None, "noreply@faxinar.local");
        assert!(!svc.is_configured());
        let err = svc.send_invite(&InvitePayload::new("a@b.com", "https://x")).await.unwrap_err();
        assert!(matches!(err, InviteError::NotConfigured));
    }

    #[tokio::test]
    async fn composes_and_sends() {
        let mailer = Arc::new(RecordingMailer::default());
        let svc = InviteService::new(Some(mailer.clone()), "noreply@faxinar.local");
        svc.send_invite(&InvitePayload::new("ana@example.com", "https://faxinar.example/activate?token=t"))
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert_eq!(sent[0].subject, INVITE_SUBJECT);
        assert!(sent[0].text.ends_with("https://faxinar.example/activate?token=t"));
        assert!(sent[0].html.contains("Enviado por: admin"));
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let mailer = Arc::new(RecordingMailer { fail: true, ..Default::default() });
        let svc = InviteService::new(Some(mailer), "noreply@faxinar.local");
        let err = svc.send_invite(&InvitePayload::new("a@b.com", "https://x")).await.unwrap_err();
        assert!(matches!(err, InviteError::Provider(_)));
    }

    #[test]
    fn notification_subject_and_sender() {
        let svc = InviteService::new(None, "noreply@faxinar.local");
        let mut payload = InvitePayload::new("a@b.com", "https://x");
        payload.kind = "reminder".into();
        payload.from = Some("maria@faxinar.local".into());
        let mail = svc.compose(&payload);
        assert_eq!(mail.subject, NOTIFICATION_SUBJECT);
        assert!(mail.html.contains("Enviado por: maria@faxinar.local"));
        assert_eq!(mail.from, "noreply@faxinar.local");
    }
}
