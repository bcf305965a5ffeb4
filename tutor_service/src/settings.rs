//! Layered configuration: embedded defaults, optional file, then environment.

use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted `security.max_request_size_mb`.
pub const MAX_REQUEST_SIZE_MB: usize = 1024;

/// Client application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Name used to build the `X-{name}-alert` response headers
    pub name: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "tutorApp".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Memory,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite://tutors.db".to_string(),
            max_connections: 5,
            connect_timeout_seconds: 10,
        }
    }
}

impl DatabaseConfig {
    /// In-memory SQLite configuration, mostly useful in tests.
    pub fn sqlite_in_memory() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        }
    }

    /// Each connection to an in-memory SQLite URL opens a separate database.
    pub fn is_sqlite_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            enable_target: false,
        }
    }
}

/// HTTP hardening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub allowed_origins: Vec<String>,
    pub enable_rate_limiting: bool,
    pub rate_limit_per_minute: u32,
    pub max_request_size_mb: usize,
    pub enable_security_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            allowed_origins: vec!["http://localhost:9000".to_string()],
            enable_rate_limiting: true,
            rate_limit_per_minute: 600,
            max_request_size_mb: 1,
            enable_security_headers: true,
        }
    }
}

/// Main settings structure with all configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub application: ApplicationConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Settings {
    /// Load settings from the embedded defaults, an optional configuration
    /// file and `TUTOR_`-prefixed environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../config.toml"),
            FileFormat::Toml,
        ));

        builder = match config_path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("TUTOR")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        Self::apply_env_overrides(&mut settings)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Conventional variables that bypass the nested `TUTOR_` layout.
    fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        }
        if let Ok(host) = std::env::var("TUTOR_SERVER_HOST") {
            settings.server.host = host;
        }
        if let Ok(port) = std::env::var("TUTOR_SERVER_PORT") {
            settings.server.port = port
                .parse()
                .map_err(|e| anyhow!("Invalid TUTOR_SERVER_PORT '{}': {}", port, e))?;
        }

        Ok(())
    }

    /// Validate settings for consistency
    pub fn validate(&self) -> Result<()> {
        let name = &self.application.name;
        if name.is_empty()
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow!("Application name must be a non-empty header token: '{}'", name));
        }
        if self.server.port == 0 {
            return Err(anyhow!("Server port cannot be 0"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow!("Database pool needs at least one connection"));
        }
        if self.database.backend == DatabaseBackend::Sqlite && self.database.url.is_empty() {
            return Err(anyhow!("SQLite backend requires a database url"));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(anyhow!("Unknown log format: {}", self.logging.format));
        }
        if self.security.enable_rate_limiting && self.security.rate_limit_per_minute == 0 {
            return Err(anyhow!("Rate limit must be positive when rate limiting is enabled"));
        }
        if self.security.max_request_size_mb == 0 {
            return Err(anyhow!("Max request size cannot be 0"));
        }
        if self.security.max_request_size_mb > MAX_REQUEST_SIZE_MB {
            return Err(anyhow!(
                "Max request size cannot exceed {} MB",
                MAX_REQUEST_SIZE_MB
            ));
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
