use serde::Serialize;

use super::domain::{NewApplication, RegisterNumber};

pub const ONE_SUBMISSION_NOTICE: &str =
    "IMPORTANT: You can only submit one time with one register number.";
pub const NOT_EDITABLE_WARNING: &str =
    "Please verify all the details. Once submitted, the application cannot be edited.";

/// Shown to the applicant before the final submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationPrompt {
    pub register_number: RegisterNumber,
    pub notice: &'static str,
    pub warning: &'static str,
    pub application: NewApplication,
}

impl ConfirmationPrompt {
    pub(crate) fn new(application: NewApplication) -> Self {
        Self {
            register_number: application.register_number().clone(),
            notice: ONE_SUBMISSION_NOTICE,
            warning: NOT_EDITABLE_WARNING,
            application,
        }
    }

    /// The applicant accepted the prompt.
    pub fn confirm(self) -> ConfirmedSubmission {
        ConfirmedSubmission {
            application: self.application,
        }
    }
}

/// Only obtainable through [`ConfirmationPrompt::confirm`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedSubmission {
    application: NewApplication,
}

impl ConfirmedSubmission {
    pub fn register_number(&self) -> &RegisterNumber {
        self.application.register_number()
    }

    pub(crate) fn into_application(self) -> NewApplication {
        self.application
    }
}
