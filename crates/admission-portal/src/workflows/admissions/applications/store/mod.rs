use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationId, ApplicationRecord, NewApplication, RegisterNumber};

mod file;
mod memory;

pub use file::JsonFileApplicationStore;
pub use memory::InMemoryApplicationStore;

/// Storage abstraction owning id assignment, application numbering and
/// register-number uniqueness.
///
/// `insert` must reject a register number already held by another record in the
/// same atomic step that assigns the application number.
pub trait ApplicationStore: Send + Sync {
    fn insert(
        &self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError>;
    fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError>;
    /// Matching records, newest first.
    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("register number {0} is already in use")]
    DuplicateRegisterNumber(RegisterNumber),
    #[error("application number collision")]
    DuplicateApplicationNumber,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Admin listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    register_number_contains: Option<String>,
}

impl ApplicationQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Blank search text means no filter.
    pub fn search(fragment: Option<&str>) -> Self {
        let register_number_contains = fragment
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self {
            register_number_contains,
        }
    }

    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        match &self.register_number_contains {
            Some(fragment) => record.application.register_number().contains_fragment(fragment),
            None => true,
        }
    }
}

/// A register number held by more than one stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterNumberConflict {
    pub register_number: String,
    pub application_ids: Vec<ApplicationId>,
}

/// Groups records by case-insensitive register number and keeps the groups
/// with more than one member.
pub fn find_duplicate_register_numbers(records: &[ApplicationRecord]) -> Vec<RegisterNumberConflict> {
    let mut groups: BTreeMap<String, Vec<ApplicationId>> = BTreeMap::new();
    for record in records {
        let key = record
            .application
            .register_number()
            .as_str()
            .trim()
            .to_ascii_uppercase();
        groups.entry(key).or_default().push(record.id);
    }

    groups
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(register_number, application_ids)| RegisterNumberConflict {
            register_number,
            application_ids,
        })
        .collect()
}

fn sort_newest_first(records: &mut [ApplicationRecord]) {
    records.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then(right.application_number.cmp(&left.application_number))
    });
}
