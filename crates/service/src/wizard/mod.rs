//! Five-step signup wizard: contact, earnings info, example earnings,
//! credentials, training checklist.

pub mod autosave;
pub mod machine;
pub mod session;

pub use autosave::Autosave;
pub use machine::{can_advance_step1, WizardAction, WizardError, WizardEvent, WizardMachine};
pub use session::{MountSource, SignupWizard, WizardSettings};
