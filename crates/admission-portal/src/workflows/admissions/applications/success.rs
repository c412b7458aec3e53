use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::domain::{ApplicationId, ApplicationRecord, ExamType, NewApplication};

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Opaque 64-character hex token from two random UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SuccessToken(String);

impl SuccessToken {
    fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display model for the success page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationView {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub register_number: String,
    pub applicant_name: String,
    pub exam_type: ExamType,
    pub submitted_at: DateTime<Utc>,
    /// Rendered as `"<code> - <name>"`, in preference order.
    pub course_preferences: Vec<String>,
    pub application: NewApplication,
}

impl ConfirmationView {
    pub fn from_record(record: &ApplicationRecord) -> Self {
        let mut preferences = record.application.course_preferences.clone();
        preferences.sort_by_key(|preference| preference.preference);

        Self {
            application_id: record.id,
            application_number: record.application_number.to_string(),
            register_number: record.application.register_number().to_string(),
            applicant_name: record.application.applicant.applicant_name.clone(),
            exam_type: record.application.exam_type(),
            submitted_at: record.created_at,
            course_preferences: preferences.iter().map(|p| p.display()).collect(),
            application: record.application.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("no access token supplied")]
    MissingToken,
    #[error("access token not recognised")]
    UnknownToken,
    #[error("access token expired")]
    Expired,
    #[error("confirmation cache unavailable")]
    Unavailable,
}

#[derive(Debug)]
struct CachedView {
    view: ConfirmationView,
    issued_at: DateTime<Utc>,
}

/// Server-side store of success views keyed by one-time-issued token.
#[derive(Debug)]
pub struct ConfirmationCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CachedView>>,
}

impl Default for ConfirmationCache {
    fn default() -> Self {
        Self::new(
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            DEFAULT_CACHE_CAPACITY,
        )
    }
}

impl ConfirmationCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `None` when the cache is full of live entries or unusable.
    pub fn issue(&self, view: ConfirmationView, now: DateTime<Utc>) -> Option<SuccessToken> {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("confirmation cache lock poisoned; issuing no token");
            return None;
        };

        let ttl = self.ttl;
        entries.retain(|_, cached| now - cached.issued_at <= ttl);
        if entries.len() >= self.capacity {
            warn!(
                capacity = self.capacity,
                "confirmation cache full; issuing no token"
            );
            return None;
        }

        let token = SuccessToken::generate();
        entries.insert(
            token.as_str().to_string(),
            CachedView {
                view,
                issued_at: now,
            },
        );
        Some(token)
    }

    /// Repeatable within the validity window so the page survives a reload.
    pub fn redeem(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationView, AccessDenied> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AccessDenied::MissingToken)?;

        let mut entries = self.entries.lock().map_err(|_| AccessDenied::Unavailable)?;
        let cached = entries.get(token).ok_or(AccessDenied::UnknownToken)?;
        if now - cached.issued_at > self.ttl {
            entries.remove(token);
            return Err(AccessDenied::Expired);
        }
        Ok(cached.view.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
