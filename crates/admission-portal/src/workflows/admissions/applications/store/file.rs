use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::memory::StoreState;
use super::{ApplicationQuery, ApplicationStore, StoreError};
use crate::workflows::admissions::applications::domain::{
    ApplicationId, ApplicationRecord, NewApplication, RegisterNumber,
};

/// Store persisted as a JSON array of records.
///
/// Every insert rewrites the file through a temporary sibling and a rename, so
/// a crash leaves either the old or the new array on disk. Rows that fail to
/// decode are hidden from reads but written back verbatim on every save, and
/// their application and register numbers stay reserved.
#[derive(Debug)]
pub struct JsonFileApplicationStore {
    path: PathBuf,
    state: Mutex<StoreState>,
    retained: Vec<Value>,
}

impl JsonFileApplicationStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let LoadedRows { records, retained } = if path.exists() {
            load_rows(&path)?
        } else {
            LoadedRows::default()
        };
        info!(
            path = %path.display(),
            records = records.len(),
            retained = retained.len(),
            "opened application store"
        );

        let mut state = StoreState::from_records(records);
        for row in &retained {
            state.reserve(retained_application_number(row), retained_register_number(row));
        }
        Ok(Self {
            path,
            state: Mutex::new(state),
            retained,
        })
    }

    /// Rows kept on disk that no longer decode as records.
    pub fn retained_rows(&self) -> usize {
        self.retained.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn persist(&self, records: &[ApplicationRecord]) -> Result<(), StoreError> {
        let mut rows = Vec::with_capacity(records.len() + self.retained.len());
        for record in records {
            rows.push(serde_json::to_value(record)?);
        }
        rows.extend(self.retained.iter().cloned());
        let payload = serde_json::to_vec_pretty(&rows)?;
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&staging)?;
        file.write_all(&payload)?;
        file.sync_all()?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LoadedRows {
    records: Vec<ApplicationRecord>,
    retained: Vec<Value>,
}

fn load_rows(path: &Path) -> Result<LoadedRows, StoreError> {
    let raw = fs::read(path)?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(LoadedRows::default());
    }
    let rows: Vec<Value> = serde_json::from_slice(&raw)?;
    let mut loaded = LoadedRows {
        records: Vec::with_capacity(rows.len()),
        retained: Vec::new(),
    };
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<ApplicationRecord>(row.clone()) {
            Ok(record) => loaded.records.push(record),
            Err(error) => {
                warn!(path = %path.display(), row = index, %error, "retaining undecodable application row");
                loaded.retained.push(row);
            }
        }
    }
    Ok(loaded)
}

fn retained_application_number(row: &Value) -> Option<u64> {
    row.get("application_number").and_then(Value::as_u64)
}

fn retained_register_number(row: &Value) -> Option<RegisterNumber> {
    row.pointer("/application/academic/register_number")
        .and_then(Value::as_str)
        .and_then(RegisterNumber::normalize)
}

impl ApplicationStore for JsonFileApplicationStore {
    fn insert(
        &self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut state = self.lock()?;
        let record = state.insert(application, now)?;
        if let Err(error) = self.persist(&state.records) {
            state.rollback(&record.id);
            return Err(error);
        }
        Ok(record)
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
