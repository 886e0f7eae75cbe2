//! Serde domain types shared by the service and server crates.

pub mod errors;
pub mod step;
pub mod form;
pub mod progress;
pub mod invite;
pub mod audit;

pub use audit::AuditEntry;
pub use form::{FormData, TrainingItem};
pub use invite::{BulkInviteReport, InvitePayload, OutgoingMail, RowError};
pub use progress::{FormProgress, ProgressVersion, ResumeTokenEntry, ResumeTokenMap};
pub use step::WizardStep;

#[cfg(test)]
mod tests;
