//! Wizard steps.
//!
//! The signup wizard is strictly linear. Steps serialize as their integer
//! (`1..=5`) so snapshots keep the `{ "step": 2, ... }` layout.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i64", into = "u8")]
pub enum WizardStep {
    /// Name, phone, CPF, email, state and city.
    #[default]
    ContactInfo,
    /// Earnings table, read-only.
    EarningsInfo,
    /// Worked example of monthly earnings, read-only.
    ExampleEarnings,
    /// Password, confirmation and terms.
    Credentials,
    /// Training checklist. Terminal.
    Training,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::ContactInfo => 1,
            WizardStep::EarningsInfo => 2,
            WizardStep::ExampleEarnings => 3,
            WizardStep::Credentials => 4,
            WizardStep::Training => 5,
        }
    }

    pub fn from_number(n: i64) -> Result<Self, ModelError> {
        match n {
            1 => Ok(WizardStep::ContactInfo),
            2 => Ok(WizardStep::EarningsInfo),
            3 => Ok(WizardStep::ExampleEarnings),
            4 => Ok(WizardStep::Credentials),
            5 => Ok(WizardStep::Training),
            other => Err(ModelError::StepOutOfRange(other)),
        }
    }

    /// Previous step, floored at [`WizardStep::ContactInfo`].
    pub fn predecessor(self) -> Self {
        match self {
            WizardStep::ContactInfo | WizardStep::EarningsInfo => WizardStep::ContactInfo,
            WizardStep::ExampleEarnings => WizardStep::EarningsInfo,
            WizardStep::Credentials => WizardStep::ExampleEarnings,
            WizardStep::Training => WizardStep::Credentials,
        }
    }

    pub fn is_terminal(self) -> bool { matches!(self, WizardStep::Training) }

    /// Steps 1-4 are the editable wizard.
    pub fn is_editable(self) -> bool { !self.is_terminal() }

    /// Progress caption shown above the form.
    pub fn label(self) -> String {
        if self.is_terminal() {
            "Fase de Treinamento".to_string()
        } else {
            format!("{} de 4", self.number())
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> u8 { step.number() }
}

impl TryFrom<i64> for WizardStep {
    type Error = ModelError;

    fn try_from(n: i64) -> Result<Self, Self::Error> { WizardStep::from_number(n) }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip_and_only_training_is_terminal() {
        for n in 1..=5 {
            let step = WizardStep::from_number(n).unwrap();
            assert_eq!(i64::from(step.number()), n);
            assert_eq!(step.is_terminal(), n == 5);
        }
        assert!(WizardStep::from_number(0).is_err());
    }

    #[test]
    fn predecessor_is_floored() {
        assert_eq!(WizardStep::ContactInfo.predecessor(), WizardStep::ContactInfo);
        assert_eq!(WizardStep::Training.predecessor(), WizardStep::Credentials);
    }

    #[test]
    fn serializes_as_integer_and_rejects_out_of_range() {
        assert_eq!(serde_json::to_string(&WizardStep::Credentials).unwrap(), "4");
        let step: WizardStep = serde_json::from_str("2").unwrap();
        assert_eq!(step, WizardStep::EarningsInfo);
        assert!(serde_json::from_str::<WizardStep>("0").is_err());
        assert!(serde_json::from_str::<WizardStep>("6").is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(WizardStep::ContactInfo.label(), "1 de 4");
        assert_eq!(WizardStep::Credentials.label(), "4 de 4");
        assert_eq!(WizardStep::Training.label(), "Fase de Treinamento");
    }
}
