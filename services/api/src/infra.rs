use admission_portal::config::{AdmissionsConfig, AuthConfig, StorageConfig};
use admission_portal::error::AppError;
use admission_portal::workflows::admissions::admin::{AdminDirectory, Authenticator, SessionStore};
use admission_portal::workflows::admissions::applications::{
    ApplicationId, ApplicationQuery, ApplicationRecord, ApplicationStore, ConfirmationCache,
    InMemoryApplicationStore, JsonFileApplicationStore, NewApplication, RegisterNumber,
    StoreError,
};
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store selected by `APP_DATA_PATH`: a JSON file when set, memory otherwise.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryApplicationStore),
    File(JsonFileApplicationStore),
}

impl ConfiguredStore {
    pub(crate) fn open(config: &StorageConfig) -> Result<Self, AppError> {
        match &config.data_path {
            Some(path) => {
                let store = JsonFileApplicationStore::open(path)?;
                info!(path = %path.display(), "using json application store");
                Ok(Self::File(store))
            }
            None => {
                info!("APP_DATA_PATH unset; applications are kept in memory");
                Ok(Self::Memory(InMemoryApplicationStore::new()))
            }
        }
    }

    fn inner(&self) -> &dyn ApplicationStore {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

impl ApplicationStore for ConfiguredStore {
    fn insert(
        &self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        self.inner().insert(application, now)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner().fetch(id)
    }

    fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner().find_by_register_number(register_number)
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.inner().list(query)
    }
}

pub(crate) fn confirmation_cache(config: &AdmissionsConfig) -> ConfirmationCache {
    ConfirmationCache::new(
        Duration::minutes(config.success_token_ttl_minutes),
        config.confirmation_cache_capacity,
    )
}

pub(crate) fn authenticator(config: &AuthConfig) -> Result<Authenticator, AppError> {
    let directory = AdminDirectory::parse_entries(&config.admin_accounts)?;
    info!(accounts = directory.len(), "admin directory loaded");
    Ok(Authenticator::new(
        directory,
        SessionStore::new(Duration::minutes(config.session_ttl_minutes)),
    ))
}
