//! Progress snapshots, version history entries and resume token entries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::form::FormData;
use crate::step::WizardStep;

/// `{ step, form }` pair describing the wizard at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FormProgress {
    pub step: WizardStep,
    #[serde(default)]
    pub form: FormData,
}

impl FormProgress {
    pub fn new(step: WizardStep, form: FormData) -> Self { Self { step, form } }
}

/// Immutable snapshot pushed to history whenever current progress is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressVersion {
    pub id: String,
    pub at: DateTime<Utc>,
    pub data: FormProgress,
}

/// Value stored under a resume token. `expires` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeTokenEntry {
    pub progress: FormProgress,
    pub expires: i64,
}

impl ResumeTokenEntry {
    /// Readable only while `now < expires`.
    pub fn is_expired(&self, now_ms: i64) -> bool { now_ms >= self.expires }
}

/// Registry layout: token string to entry.
pub type ResumeTokenMap = HashMap<String, ResumeTokenEntry>;
