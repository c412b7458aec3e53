//! Public application intake: validation, register-number uniqueness,
//! confirmation and the token-gated success view.

pub mod catalog;
pub mod confirmation;
pub mod domain;
pub mod register;
pub mod router;
pub mod service;
pub mod store;
pub mod success;
pub mod validation;

#[cfg(test)]
pub(crate) mod tests;

pub use catalog::{Course, CourseCatalog};
pub use confirmation::{ConfirmationPrompt, ConfirmedSubmission};
pub use domain::{
    ApplicationId, ApplicationNumber, ApplicationRecord, ApplicationSubmission,
    ApplicationSummary, ExamType, NewApplication, RegisterNumber, SubjectGrades,
};
pub use register::{
    RegisterAvailability, RegisterCheckState, RegisterNumberDebouncer, DEBOUNCE_DELAY,
};
pub use router::application_router;
pub use service::{AdmissionService, SubmissionError, SubmissionReceipt};
pub use store::{
    find_duplicate_register_numbers, ApplicationQuery, ApplicationStore,
    InMemoryApplicationStore, JsonFileApplicationStore, RegisterNumberConflict, StoreError,
};
pub use success::{AccessDenied, ConfirmationCache, ConfirmationView, SuccessToken};
pub use validation::{FieldError, SubmissionGuard, ValidationErrors};
