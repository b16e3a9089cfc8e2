//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Token authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token lifetime in seconds (default: 2592000 = 30 days)
    pub token_max_age: i64,
}

/// Bootstrap staff account
///
/// When both `email` and `password` are set, a privileged account
/// is created on startup if none exists for that email.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    #[serde(default = "default_admin_first_name")]
    pub first_name: String,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            first_name: default_admin_first_name(),
            last_name: None,
            password: None,
        }
    }
}

fn default_admin_first_name() -> String {
    "Admin".to_string()
}

/// Request and paging limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,
    /// Page size when the client does not pass `limit`
    pub default_page_size: usize,
    /// Upper bound for client supplied `limit`
    pub max_page_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (PROFILEFEED__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "data/profilefeed.db")?
            .set_default("auth.token_max_age", 2_592_000)?
            .set_default("admin.first_name", "Admin")?
            .set_default("limits.max_body_bytes", 65_536)?
            .set_default("limits.default_page_size", 50)?
            .set_default("limits.max_page_size", 200)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("PROFILEFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Clamp a client supplied page size to the configured bounds
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.limits.default_page_size)
            .clamp(1, self.limits.max_page_size)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.token_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token_max_age must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_page_size == 0 || self.limits.default_page_size == 0 {
            return Err(crate::error::AppError::Config(
                "limits.default_page_size and limits.max_page_size must be greater than 0"
                    .to_string(),
            ));
        }

        match (&self.admin.email, &self.admin.password) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(crate::error::AppError::Config(
                    "admin.email and admin.password must be set together".to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}
