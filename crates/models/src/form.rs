//! Signup form contents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Items of the training checklist shown once the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrainingItem {
    Alignment,
    Photo,
    Bio,
    Verify,
    Chat,
}

impl TrainingItem {
    pub const ALL: [TrainingItem; 5] = [
        TrainingItem::Alignment,
        TrainingItem::Photo,
        TrainingItem::Bio,
        TrainingItem::Verify,
        TrainingItem::Chat,
    ];

    /// Key inside [`FormData::training`].
    pub fn key(self) -> &'static str {
        match self {
            TrainingItem::Alignment => "alignment",
            TrainingItem::Photo => "photo",
            TrainingItem::Bio => "bio",
            TrainingItem::Verify => "verify",
            TrainingItem::Chat => "chat",
        }
    }
}

pub fn default_training() -> BTreeMap<String, bool> {
    TrainingItem::ALL.iter().map(|item| (item.key().to_string(), false)).collect()
}

/// Everything the wizard collects. Missing JSON fields take their defaults so
/// partial snapshots still load.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub full_name: String,
    pub phone: String,
    pub cpf: String,
    pub email: String,
    pub state: String,
    pub city: String,
    pub password: String,
    pub password_confirm: String,
    pub terms: bool,
    pub training: BTreeMap<String, bool>,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone: String::new(),
            cpf: String::new(),
            email: String::new(),
            state: String::new(),
            city: String::new(),
            password: String::new(),
            password_confirm: String::new(),
            terms: false,
            training: default_training(),
        }
    }
}

impl FormData {
    /// Changing the state invalidates the chosen city.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
        self.city.clear();
    }

    pub fn training_done(&self, item: TrainingItem) -> bool {
        self.training.get(item.key()).copied().unwrap_or(false)
    }

    pub fn set_training(&mut self, item: TrainingItem, done: bool) {
        self.training.insert(item.key().to_string(), done);
    }
}

// Passwords stay out of logs.
impl fmt::Debug for FormData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormData")
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .field("cpf", &self.cpf)
            .field("email", &self.email)
            .field("state", &self.state)
            .field("city", &self.city)
            .field("password", &"<redacted>")
            .field("password_confirm", &"<redacted>")
            .field("terms", &self.terms)
            .field("training", &self.training)
            .finish()
    }
}
