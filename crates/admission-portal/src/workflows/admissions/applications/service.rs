use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::confirmation::{ConfirmationPrompt, ConfirmedSubmission};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationSubmission, RegisterNumber,
};
use super::register::{check_availability, RegisterAvailability};
use super::store::{
    find_duplicate_register_numbers, ApplicationQuery, ApplicationStore, RegisterNumberConflict,
    StoreError,
};
use super::success::{AccessDenied, ConfirmationCache, ConfirmationView, SuccessToken};
use super::validation::{SubmissionGuard, ValidationErrors};
use crate::config::AdmissionsStatus;

pub const SUCCESS_PATH: &str = "/apply/success";

/// Service composing the submission guard, the store and the success-token cache.
pub struct AdmissionService<S> {
    guard: SubmissionGuard,
    store: Arc<S>,
    confirmations: ConfirmationCache,
    status: AdmissionsStatus,
}

/// Returned to the applicant after a successful insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub register_number: RegisterNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SuccessToken>,
    pub success_url: String,
}

impl<S> AdmissionService<S>
where
    S: ApplicationStore + 'static,
{
    pub fn new(store: Arc<S>, confirmations: ConfirmationCache, status: AdmissionsStatus) -> Self {
        Self::with_guard(SubmissionGuard::default(), store, confirmations, status)
    }

    pub fn with_guard(
        guard: SubmissionGuard,
        store: Arc<S>,
        confirmations: ConfirmationCache,
        status: AdmissionsStatus,
    ) -> Self {
        Self {
            guard,
            store,
            confirmations,
            status,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn ensure_open(&self) -> Result<(), SubmissionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SubmissionError::Closed)
        }
    }

    /// `Ok(None)` for blank input; no lookup is made.
    pub fn check_register_number(
        &self,
        raw: &str,
    ) -> Result<Option<RegisterAvailability>, SubmissionError> {
        self.ensure_open()?;
        let Some(register_number) = RegisterNumber::normalize(raw) else {
            return Ok(None);
        };
        let availability = check_availability(self.store.as_ref(), &register_number)?;
        Ok(Some(availability))
    }

    /// Validates and re-runs the register check before the confirmation dialog.
    pub fn prepare(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ConfirmationPrompt, SubmissionError> {
        self.ensure_open()?;
        let application = self.guard.validate(submission)?;

        let register_number = application.register_number();
        match check_availability(self.store.as_ref(), register_number) {
            Ok(RegisterAvailability::Available) => {}
            Ok(RegisterAvailability::Taken) => {
                return Err(SubmissionError::RegisterNumberTaken(register_number.clone()));
            }
            Err(store_error) => {
                warn!(
                    register_number = %register_number,
                    error = %store_error,
                    "register number check failed before confirmation"
                );
                return Err(SubmissionError::Store(store_error));
            }
        }

        Ok(ConfirmationPrompt::new(application))
    }

    /// Inserts a confirmed submission. The store rejects a taken register
    /// number even if the earlier checks passed.
    pub fn submit(
        &self,
        confirmed: ConfirmedSubmission,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.ensure_open()?;
        let register_number = confirmed.register_number().clone();

        let record = match self.store.insert(confirmed.into_application(), now) {
            Ok(record) => record,
            Err(StoreError::DuplicateRegisterNumber(taken)) => {
                info!(register_number = %taken, "rejected duplicate register number");
                return Err(SubmissionError::RegisterNumberTaken(taken));
            }
            Err(store_error) => {
                error!(
                    register_number = %register_number,
                    error = %store_error,
                    "failed to store application"
                );
                return Err(SubmissionError::Store(store_error));
            }
        };

        info!(
            application_id = %record.id,
            application_number = %record.application_number,
            register_number = %register_number,
            "application submitted"
        );

        let token = self
            .confirmations
            .issue(ConfirmationView::from_record(&record), now);
        let success_url = match &token {
            Some(token) => format!("{SUCCESS_PATH}?token={token}"),
            None => SUCCESS_PATH.to_string(),
        };

        Ok(SubmissionReceipt {
            application_id: record.id,
            application_number: record.application_number.to_string(),
            register_number,
            token,
            success_url,
        })
    }

    pub fn success_view(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationView, AccessDenied> {
        self.confirmations.redeem(token, now)
    }

    pub fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, SubmissionError> {
        Ok(self.store.list(query)?)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, SubmissionError> {
        self.store
            .fetch(id)?
            .ok_or(SubmissionError::NotFound(*id))
    }

    pub fn register_number_conflicts(&self) -> Result<Vec<RegisterNumberConflict>, SubmissionError> {
        let records = self.store.list(&ApplicationQuery::all())?;
        Ok(find_duplicate_register_numbers(&records))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("admissions are closed")]
    Closed,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("register number {0} is already in use")]
    RegisterNumberTaken(RegisterNumber),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
