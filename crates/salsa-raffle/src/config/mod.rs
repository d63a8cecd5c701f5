use crate::workflows::raffle::{
    parse_cutoff, ConfigurationError, Level, LevelCatalog, DEFAULT_CAPACITY_PER_ROLE,
};
use chrono::NaiveDateTime;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub raffle: RaffleConfig,
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

        let capacity_per_role = match env::var("RAFFLE_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidCapacity(raw))?,
            Err(_) => DEFAULT_CAPACITY_PER_ROLE,
        };

        let levels = match env::var("RAFFLE_LEVELS") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_levels(&raw)?),
            _ => None,
        };

        let cutoff = match env::var("RAFFLE_CUTOFF") {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(parse_cutoff(&raw).map_err(ConfigError::InvalidCutoff)?)
            }
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            raffle: RaffleConfig {
                capacity_per_role,
                levels,
                cutoff,
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
}

/// Class catalog, capacity and cutoff for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleConfig {
    pub capacity_per_role: i64,
    /// `(id, name)` pairs; `None` means the standard six classes.
    pub levels: Option<Vec<(String, String)>>,
    pub cutoff: Option<NaiveDateTime>,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            capacity_per_role: DEFAULT_CAPACITY_PER_ROLE,
            levels: None,
            cutoff: None,
        }
    }
}

impl RaffleConfig {
    pub fn catalog(&self) -> Result<LevelCatalog, ConfigurationError> {
        match &self.levels {
            None => LevelCatalog::standard(self.capacity_per_role),
            Some(levels) => LevelCatalog::new(
                levels
                    .iter()
                    .map(|(id, name)| Level::new(id.clone(), name.clone(), self.capacity_per_role))
                    .collect(),
            ),
        }
    }
}

/// Parse `ID=Name;ID=Name`. A bare `ID` uses the id as its name.
pub fn parse_levels(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = match entry.split_once('=') {
                Some((id, name)) => (id.trim(), name.trim()),
                None => (entry, entry),
            };
            if id.is_empty() || name.is_empty() {
                return Err(ConfigError::InvalidLevels(ConfigurationError::MalformedLevel(
                    entry.to_string(),
                )));
            }
            Ok((id.to_string(), name.to_string()))
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCapacity(String),
    InvalidLevels(ConfigurationError),
    InvalidCutoff(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCapacity(raw) => {
                write!(f, "RAFFLE_CAPACITY must be an integer (got '{}')", raw)
            }
            ConfigError::InvalidLevels(err) => write!(f, "RAFFLE_LEVELS is invalid: {}", err),
            ConfigError::InvalidCutoff(message) => write!(f, "RAFFLE_CUTOFF: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidLevels(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidCapacity(_)
            | ConfigError::InvalidCutoff(_) => None,
        }
    }
}
