use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;

/// Role claim carried by every admin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salted SHA-256 digest stored as `<salt>$<hex digest>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    pub fn derive(password: &str) -> Self {
        Self::with_salt(Uuid::new_v4().simple().to_string(), password)
    }

    pub fn with_salt(salt: impl Into<String>, password: &str) -> Self {
        let salt = salt.into();
        let digest = digest_hex(&salt, password);
        Self { salt, digest }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (salt, digest) = raw.trim().split_once('$')?;
        let valid_digest = digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit());
        if salt.is_empty() || !valid_digest {
            return None;
        }
        Some(Self {
            salt: salt.to_string(),
            digest: digest.to_ascii_lowercase(),
        })
    }

    pub fn verify(&self, password: &str) -> bool {
        constant_time_eq(
            digest_hex(&self.salt, password).as_bytes(),
            self.digest.as_bytes(),
        )
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.salt, self.digest)
    }
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub email: String,
    pub role: Role,
    pub password_hash: PasswordHash,
}

impl AdminAccount {
    /// `email|role|salt$digest`, the form accepted in `APP_ADMIN_ACCOUNTS`.
    pub fn entry(&self) -> String {
        format!("{}|{}|{}", self.email, self.role, self.password_hash)
    }
}

/// Provisioned admin identities keyed by lower-cased email.
#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
    accounts: HashMap<String, AdminAccount>,
}

impl AdminDirectory {
    pub fn parse_entries<I, T>(entries: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut accounts = HashMap::new();
        for entry in entries {
            let account = parse_entry(entry.as_ref())?;
            accounts.insert(account.email.clone(), account);
        }
        Ok(Self { accounts })
    }

    pub fn provision(email: &str, password: &str, role: Role) -> AdminAccount {
        AdminAccount {
            email: email.trim().to_ascii_lowercase(),
            role,
            password_hash: PasswordHash::derive(password),
        }
    }

    pub fn insert(&mut self, account: AdminAccount) {
        self.accounts.insert(account.email.clone(), account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn verify(&self, email: &str, password: &str) -> Option<&AdminAccount> {
        let account = self.accounts.get(&email.trim().to_ascii_lowercase())?;
        account.password_hash.verify(password).then_some(account)
    }
}

fn parse_entry(raw: &str) -> Result<AdminAccount, AuthError> {
    let invalid = |reason: &'static str| AuthError::InvalidAccountEntry {
        entry: raw.split('|').next().unwrap_or_default().trim().to_string(),
        reason,
    };

    let mut parts = raw.trim().splitn(3, '|');
    let email = parts.next().map(str::trim).unwrap_or_default();
    let role = parts.next().map(str::trim).unwrap_or_default();
    let hash = parts.next().map(str::trim).unwrap_or_default();

    if email.is_empty() || !email.contains('@') {
        return Err(invalid("email is missing or malformed"));
    }
    let role = Role::parse(role).ok_or_else(|| invalid("role must be admin or viewer"))?;
    let password_hash =
        PasswordHash::parse(hash).ok_or_else(|| invalid("password hash must be salt$sha256hex"))?;

    Ok(AdminAccount {
        email: email.to_ascii_lowercase(),
        role,
        password_hash,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Opaque bearer sessions with a fixed lifetime.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_SESSION_TTL_MINUTES))
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn issue(&self, account: &AdminAccount, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let session = Session {
            token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            email: account.email.clone(),
            role: account.role,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.lock().map_err(|_| AuthError::Unavailable)?;
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let mut sessions = self.sessions.lock().map_err(|_| AuthError::Unavailable)?;
        let session = sessions.get(token).ok_or(AuthError::InvalidToken)?;
        if session.expires_at <= now {
            sessions.remove(token);
            return Err(AuthError::Expired);
        }
        Ok(session.clone())
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .map(|mut sessions| sessions.remove(token).is_some())
            .unwrap_or(false)
    }
}

/// Login plus per-request authorization for admin routes.
#[derive(Debug, Default)]
pub struct Authenticator {
    directory: AdminDirectory,
    sessions: SessionStore,
}

impl Authenticator {
    pub fn new(directory: AdminDirectory, sessions: SessionStore) -> Self {
        if directory.is_empty() {
            warn!("no admin accounts configured; admin routes will reject every request");
        }
        Self {
            directory,
            sessions,
        }
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let account = self
            .directory
            .verify(email, password)
            .ok_or(AuthError::InvalidCredentials)?;
        let session = self.sessions.issue(account, now)?;
        info!(email = %session.email, role = %session.role, "admin session started");
        Ok(session)
    }

    /// Resolves `Authorization: Bearer <token>` and checks the role claim.
    pub fn authorize(
        &self,
        authorization: Option<&str>,
        required: Role,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let token = bearer_token(authorization).ok_or(AuthError::MissingToken)?;
        let session = self.sessions.resolve(token, now)?;
        if session.role != required {
            return Err(AuthError::Forbidden {
                role: session.role,
            });
        }
        Ok(session)
    }

    pub fn logout(&self, authorization: Option<&str>) -> bool {
        bearer_token(authorization)
            .map(|token| self.sessions.revoke(token))
            .unwrap_or(false)
    }
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Every variant reaches clients as the same 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingToken,
    #[error("unknown session")]
    InvalidToken,
    #[error("session expired")]
    Expired,
    #[error("role {role} may not perform this operation")]
    Forbidden { role: Role },
    #[error("invalid admin account entry for '{entry}': {reason}")]
    InvalidAccountEntry { entry: String, reason: &'static str },
    #[error("session store unavailable")]
    Unavailable,
}
