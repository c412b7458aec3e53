use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{sort_newest_first, ApplicationQuery, ApplicationStore, StoreError};
use crate::workflows::admissions::applications::domain::{
    ApplicationId, ApplicationNumber, ApplicationRecord, NewApplication, RegisterNumber,
};

/// Rows plus the numbering cursor, shared by the in-memory and file stores.
#[derive(Debug, Default)]
pub(super) struct StoreState {
    pub(super) records: Vec<ApplicationRecord>,
    next_number: u64,
    reserved: Vec<RegisterNumber>,
}

impl StoreState {
    pub(super) fn from_records(records: Vec<ApplicationRecord>) -> Self {
        let next_number = records
            .iter()
            .map(|record| record.application_number.0)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            records,
            next_number,
            reserved: Vec::new(),
        }
    }

    /// Holds back numbers and register numbers owned by rows that are kept on
    /// disk but could not be decoded.
    pub(super) fn reserve(
        &mut self,
        application_number: Option<u64>,
        register_number: Option<RegisterNumber>,
    ) {
        if let Some(number) = application_number {
            self.next_number = self.next_number.max(number.saturating_add(1));
        }
        self.reserved.extend(register_number);
    }

    pub(super) fn register_number_taken(&self, register_number: &RegisterNumber) -> bool {
        self.records
            .iter()
            .any(|record| record.application.register_number().matches(register_number))
            || self
                .reserved
                .iter()
                .any(|reserved| reserved.matches(register_number))
    }

    /// Checks uniqueness and appends in one step; callers hold the lock.
    pub(super) fn insert(
        &mut self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        if self.register_number_taken(application.register_number()) {
            return Err(StoreError::DuplicateRegisterNumber(
                application.register_number().clone(),
            ));
        }

        let application_number = ApplicationNumber(self.next_number.max(1));
        if self
            .records
            .iter()
            .any(|record| record.application_number == application_number)
        {
            return Err(StoreError::DuplicateApplicationNumber);
        }

        let record = ApplicationRecord {
            id: ApplicationId::generate(),
            application_number,
            created_at: now,
            application,
        };
        self.next_number = application_number.0 + 1;
        self.records.push(record.clone());
        Ok(record)
    }

    /// Undoes the most recent insert after a failed persist.
    pub(super) fn rollback(&mut self, id: &ApplicationId) {
        if let Some(position) = self.records.iter().rposition(|record| &record.id == id) {
            let removed = self.records.remove(position);
            if removed.application_number.0 + 1 == self.next_number {
                self.next_number = removed.application_number.0;
            }
        }
    }

    pub(super) fn fetch(&self, id: &ApplicationId) -> Option<ApplicationRecord> {
        self.records.iter().find(|record| &record.id == id).cloned()
    }

    pub(super) fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Option<ApplicationRecord> {
        self.records
            .iter()
            .find(|record| record.application.register_number().matches(register_number))
            .cloned()
    }

    pub(super) fn list(&self, query: &ApplicationQuery) -> Vec<ApplicationRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        records
    }
}

/// Mutex-guarded store for tests and deployments without `APP_DATA_PATH`.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    state: Mutex<StoreState>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing rows, duplicates included.
    pub fn with_records(records: Vec<ApplicationRecord>) -> Self {
        Self {
            state: Mutex::new(StoreState::from_records(records)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(
        &self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        self.lock()?.insert(application, now)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self.lock()?.fetch(id))
    }

    fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self.lock()?.find_by_register_number(register_number))
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(self.lock()?.list(query))
    }
}
