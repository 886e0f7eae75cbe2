//! Pure transition table for the signup wizard.

use models::{FormData, WizardStep};
use thiserror::Error;

use crate::validators::{validate_cpf, validate_email};

/// Events that drive the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    Next,
    Back,
}

/// Side-effects produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    /// The signup was submitted; the local draft is no longer needed.
    ClearProgress,
}

/// A blocked transition. Display text is the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Preencha todos os campos obrigatórios corretamente.")]
    IncompleteContactInfo,
    #[error("As senhas devem ser iguais e não podem estar vazias.")]
    PasswordMismatch,
    #[error("Aceite os termos para continuar.")]
    TermsNotAccepted,
    #[error("Informe um e-mail válido no formulário para enviar o link.")]
    InvalidResumeEmail,
    #[error("Não foi possível gerar o link de retomada.")]
    ResumeUnavailable,
}

/// Guard for leaving the contact step.
pub fn can_advance_step1(form: &FormData) -> bool {
    !form.full_name.trim().is_empty()
        && validate_email(&form.email)
        && !form.phone.trim().is_empty()
        && validate_cpf(&form.cpf)
        && !form.state.is_empty()
        && !form.city.is_empty()
}

/// Guard for submitting the credentials step.
pub fn check_credentials(form: &FormData) -> Result<(), WizardError> {
    if form.password.is_empty() || form.password != form.password_confirm {
        return Err(WizardError::PasswordMismatch);
    }
    if !form.terms {
        return Err(WizardError::TermsNotAccepted);
    }
    Ok(())
}

pub struct WizardMachine;

impl WizardMachine {
    pub fn transition(
        step: WizardStep,
        form: &FormData,
        event: WizardEvent,
    ) -> Result<(WizardStep, Vec<WizardAction>), WizardError> {
        match (step, event) {
            (_, WizardEvent::Back) => Ok((step.predecessor(), Vec::new())),
            (WizardStep::ContactInfo, WizardEvent::Next) => {
                if !can_advance_step1(form) {
                    return Err(WizardError::IncompleteContactInfo);
                }
                Ok((WizardStep::EarningsInfo, Vec::new()))
            }
            (WizardStep::EarningsInfo, WizardEvent::Next) => Ok((WizardStep::ExampleEarnings, Vec::new())),
            (WizardStep::ExampleEarnings, WizardEvent::Next) => Ok((WizardStep::Credentials, Vec::new())),
            (WizardStep::Credentials, WizardEvent::Next) => {
                check_credentials(form)?;
                Ok((WizardStep::Training, vec![WizardAction::ClearProgress]))
            }
            (WizardStep::Training, WizardEvent::Next) => Ok((WizardStep::Training, Vec::new())),
        }
    }
}
