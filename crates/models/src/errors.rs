use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("step out of range: {0} (expected 1..=5)")]
    StepOutOfRange(i64),
}
