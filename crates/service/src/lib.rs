//! Signup core for the Faxinar marketplace.
//! - Form validators and the five-step wizard with debounced autosave.
//! - Progress store with version history and single-use resume tokens,
//!   both over a pluggable key-value storage port.
//! - Invite relay, CSV bulk invites and audit logging used by the server.

pub mod errors;
pub mod storage;
pub mod clock;
pub mod validators;
pub mod progress_store;
pub mod resume;
pub mod wizard;
pub mod invite;
pub mod csv_import;
pub mod bulk_invite;
pub mod audit;
pub mod runtime;
