use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::forms::SessionLimits;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub submissions: SubmissionConfig,
    pub forms: FormsConfig,
    pub cors: CorsConfig,
    pub sessions: SessionConfig,
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

        let sink = SinkKind::parse(&env::var("APP_SINK").unwrap_or_else(|_| "memory".to_string()))?;
        let sink_dir = env::var("APP_SINK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("submissions"));

        let catalog_path = env::var("APP_FORMS_CATALOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let allowed_origins = CorsConfig::parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let defaults = SessionLimits::default();
        let idle_ttl_secs = match env::var("APP_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionLimit("APP_SESSION_IDLE_SECS"))?,
            Err(_) => defaults.idle_ttl.as_secs(),
        };
        let max_sessions = match env::var("APP_MAX_SESSIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|max| *max > 0)
                .ok_or(ConfigError::InvalidSessionLimit("APP_MAX_SESSIONS"))?,
            Err(_) => defaults.max_sessions,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_targets: environment == AppEnvironment::Development,
            },
            submissions: SubmissionConfig { sink, sink_dir },
            forms: FormsConfig { catalog_path },
            cors: CorsConfig { allowed_origins },
            sessions: SessionConfig {
                idle_ttl: Duration::from_secs(idle_ttl_secs),
                max_sessions,
            },
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub include_targets: bool,
}

/// Where accepted submissions are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Memory,
    Csv,
}

impl SinkKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "" => Ok(Self::Memory),
            "csv" => Ok(Self::Csv),
            other => Err(ConfigError::InvalidSink(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub sink: SinkKind,
    /// Output directory for the CSV sink; ignored by the memory sink.
    pub sink_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct FormsConfig {
    /// JSON catalog replacing the built-in form schemas.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn parse_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

/// Lifetime bounds for hosted form instances.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub idle_ttl: Duration,
    pub max_sessions: usize,
}

impl SessionConfig {
    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            idle_ttl: self.idle_ttl,
            max_sessions: self.max_sessions,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSink(String),
    InvalidSessionLimit(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSink(value) => {
                write!(f, "APP_SINK must be 'memory' or 'csv', got '{value}'")
            }
            ConfigError::InvalidSessionLimit(key) => {
                write!(f, "{key} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidSink(_)
            | ConfigError::InvalidSessionLimit(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
