use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_INSTITUTION_NAME: &str = "EMEAHSS, KONDOTTY, THURAKKAL P.O.";
const DEFAULT_ADMISSION_TITLE: &str = "APPLICATION FOR PLUS ONE ADMISSION 2025-26(COMMUNITY QUOTA)";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Whether the public application form accepts new submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionsStatus {
    Open,
    Closed,
}

impl AdmissionsStatus {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ConfigError::InvalidAdmissionsStatus {
                value: value.to_string(),
            }),
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub admissions: AdmissionsConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let status = match env::var("APP_ADMISSIONS_STATUS") {
            Ok(value) => AdmissionsStatus::parse(&value)?,
            Err(_) => AdmissionsStatus::Open,
        };

        let admissions = AdmissionsConfig {
            status,
            institution_name: env::var("APP_INSTITUTION_NAME")
                .unwrap_or_else(|_| DEFAULT_INSTITUTION_NAME.to_string()),
            admission_title: env::var("APP_ADMISSION_TITLE")
                .unwrap_or_else(|_| DEFAULT_ADMISSION_TITLE.to_string()),
            success_token_ttl_minutes: positive_var("APP_SUCCESS_TOKEN_TTL_MINUTES", 10)?,
            confirmation_cache_capacity: positive_var("APP_CONFIRMATION_CACHE_CAPACITY", 10_000)?
                as usize,
        };

        let admin_accounts = env::var("APP_ADMIN_ACCOUNTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let auth = AuthConfig {
            admin_accounts,
            session_ttl_minutes: positive_var("APP_SESSION_TTL_MINUTES", 480)?,
        };

        let storage = StorageConfig {
            data_path: env::var("APP_DATA_PATH")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            admissions,
            auth,
            storage,
        })
    }
}

fn positive_var(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Public form behavior and document branding.
#[derive(Debug, Clone)]
pub struct AdmissionsConfig {
    pub status: AdmissionsStatus,
    pub institution_name: String,
    pub admission_title: String,
    pub success_token_ttl_minutes: i64,
    pub confirmation_cache_capacity: usize,
}

/// Admin identities are provisioned out of band and passed in as raw entries.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_accounts: Vec<String>,
    pub session_ttl_minutes: i64,
}

/// Location of the JSON application store; in-memory when unset.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub data_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAdmissionsStatus { value: String },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAdmissionsStatus { value } => {
                write!(
                    f,
                    "APP_ADMISSIONS_STATUS must be 'open' or 'closed' (found '{value}')"
                )
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a positive integer (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidAdmissionsStatus { .. }
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
