use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;
use std::path::Path;

use crate::errors::StoreError;

/// Application configuration module
/// This module handles the application configuration including loading
/// from TOML and validating settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// XLIFF import/export settings
    #[serde(default)]
    pub xliff: XliffConfig,

    /// Background export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Supported database back-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Sqlite3,
    Postgres,
}

impl DbDriver {
    pub const ALL: [DbDriver; 2] = [DbDriver::Postgres, DbDriver::Sqlite3];

    // @returns: Driver name as written in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite3 => "sqlite3",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DbDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DbDriver {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sqlite3" => Ok(Self::Sqlite3),
            "postgres" => Ok(Self::Postgres),
            _ => Err(StoreError::Config(format!(
                "no adapter available for database driver '{}'",
                s
            ))),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    // @field: Either 'sqlite3' or 'postgres'
    #[serde(default = "default_driver")]
    pub driver: String,

    // @field: SQLite database file
    #[serde(default = "default_db_file")]
    pub file: String,

    #[serde(default)]
    pub host: String,

    #[serde(default = "default_pg_port")]
    pub port: u16,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl DatabaseConfig {
    /// Configuration for a SQLite database file
    pub fn sqlite<P: AsRef<Path>>(file: P) -> Self {
        Self {
            driver: DbDriver::Sqlite3.to_string(),
            file: file.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    /// Parsed driver, failing for unknown names
    pub fn driver(&self) -> std::result::Result<DbDriver, StoreError> {
        self.driver.parse()
    }

    /// PostgreSQL connection parameters, passed to the client unescaped
    pub fn postgres_config(&self) -> postgres::Config {
        let mut pg = postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .dbname(&self.name)
            .user(&self.user)
            .ssl_mode(postgres::config::SslMode::Disable);
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        pg
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            file: default_db_file(),
            host: String::new(),
            port: default_pg_port(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Port that the server should listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

/// XLIFF import/export configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct XliffConfig {
    /// Directory to import XLIFF files from
    #[serde(default = "default_import_path")]
    pub import_path: String,

    /// Directory to export XLIFF files to
    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// Language whose content fills the `source` element of exported units
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

impl Default for XliffConfig {
    fn default() -> Self {
        Self {
            import_path: default_import_path(),
            export_path: default_export_path(),
            source_language: default_source_language(),
        }
    }
}

/// Background export queue configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Number of pending domain exports before enqueueing blocks
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_driver() -> String {
    DbDriver::Sqlite3.to_string()
}

fn default_db_file() -> String {
    "./translations.db".to_string()
}

fn default_pg_port() -> u16 {
    5432 // Postgres default port
}

fn default_server_port() -> u16 {
    8181
}

fn default_import_path() -> String {
    "./xliff-in".to_string()
}

fn default_export_path() -> String {
    "./xliff-out".to_string()
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_queue_capacity() -> usize {
    100
}

impl Config {
    /// Load a TOML config file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate().context("Configuration validation failed")?;
        Ok(config)
    }

    /// Parse a config from TOML text, filling in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let driver = self.database.driver().map_err(|_| {
            let drivers: Vec<&str> = DbDriver::ALL.iter().map(|d| d.as_str()).collect();
            anyhow!(
                "config: invalid database.driver value. (Must be one of: '{}')",
                drivers.join(", ")
            )
        })?;

        match driver {
            DbDriver::Sqlite3 => {
                if self.database.file.is_empty() {
                    return Err(anyhow!("config: missing database.file value"));
                }
            }
            DbDriver::Postgres => {
                if self.database.host.is_empty() {
                    return Err(anyhow!("config: missing database.host value"));
                }
                if self.database.name.is_empty() {
                    return Err(anyhow!("config: missing database.name value"));
                }
                if self.database.user.is_empty() {
                    return Err(anyhow!("config: missing database.user value"));
                }
            }
        }

        if self.xliff.import_path.is_empty() {
            return Err(anyhow!("config: missing xliff.import_path value"));
        }
        if self.xliff.export_path.is_empty() {
            return Err(anyhow!("config: missing xliff.export_path value"));
        }
        if self.xliff.source_language.is_empty() {
            return Err(anyhow!("config: missing xliff.source_language value"));
        }
        if self.export.queue_capacity == 0 {
            return Err(anyhow!("config: export.queue_capacity must be greater than 0"));
        }

        Ok(())
    }

    /// Check that the import directory exists; only import needs it
    pub fn validate_import_path(&self) -> Result<()> {
        if !Path::new(&self.xliff.import_path).is_dir() {
            return Err(anyhow!(
                "xliff: import_path '{}' does not exist",
                self.xliff.import_path
            ));
        }
        Ok(())
    }
}
