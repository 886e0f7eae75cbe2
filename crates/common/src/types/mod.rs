use serde::{Deserialize, Serialize};

/// Liveness payload returned by `/api/health`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub ok: bool,
}

impl Health {
    pub fn ok() -> Self { Self { ok: true } }
}
