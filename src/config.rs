use std::env;
use std::time::Duration;

use uuid::Uuid;

/// Window length used when a plan leaves `hours_window` unset
pub const DEFAULT_HOURS_WINDOW: i32 = 24;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub quota: QuotaConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Upper bound on waiting for a contended counter row lock
    pub lock_timeout: Duration,
}

/// Plan lookup settings injected into the period resolver
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Plan applied to companies without a covering paid subscription.
    /// `None` makes every free-tier resolution fail with a configuration error.
    pub free_plan_id: Option<Uuid>,
    /// Window length in hours for plans that do not define one
    pub default_hours_window: i32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_plan_id: None,
            default_hours_window: DEFAULT_HOURS_WINDOW,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            quota: QuotaConfig::from_env()?,
        })
    }
}

impl QuotaConfig {
    /// Load quota configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let free_plan_id = match env::var("FREE_PLAN_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Uuid::parse_str(raw.trim()).map_err(|_| ConfigError::InvalidFreePlanId(raw))?,
            ),
            _ => None,
        };

        let default_hours_window = env::var("DEFAULT_HOURS_WINDOW")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_HOURS_WINDOW);

        Ok(Self {
            free_plan_id,
            default_hours_window,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
            lock_timeout: Duration::from_millis(
                env::var("DATABASE_LOCK_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .unwrap_or(5000),
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
    InvalidFreePlanId(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::InvalidFreePlanId(raw) => {
                write!(f, "FREE_PLAN_ID must be a valid UUID, got '{}'", raw)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
