use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ingest::DimensionPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    pub dimension: usize,
    pub batch_size: usize,
    #[serde(default)]
    pub dimension_policy: DimensionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceEntry {
    pub file: PathBuf,
    pub module: String,
    pub label: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid host: '{0}' (cannot be empty)")]
    InvalidHost(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid database name: '{0}' (cannot be empty)")]
    InvalidDatabaseName(String),
    #[error("Invalid database user: '{0}' (cannot be empty)")]
    InvalidUser(String),
    #[error("Invalid max connections: {0} (must be between 1 and 100)")]
    InvalidMaxConnections(u32),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 16000)")]
    InvalidDimension(usize),
    #[error("Invalid batch size: {0} (must be between 1 and 10000)")]
    InvalidBatchSize(usize),
    #[error("Invalid source entry: {0}")]
    InvalidSource(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ingest: IngestConfig::default(),
            sources: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    #[inline]
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "pgvector_db".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 5,
        }
    }
}

impl Default for IngestConfig {
    #[inline]
    fn default() -> Self {
        Self {
            dimension: 384,
            batch_size: 100,
            dimension_policy: DimensionPolicy::Strict,
        }
    }
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".docvec"))
            .or_else(|| {
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("docvec"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    #[inline]
    pub fn log_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("docvec.log"))
    }

    /// Loads the configuration from the default location, falling back to
    /// defaults when no config file exists yet.
    #[inline]
    pub fn load() -> Result<Self> {
        let config_path =
            Self::config_file_path().context("Failed to determine config file path")?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads the configuration from an explicit path. Unlike [`Config::load`],
    /// a missing file is an error here.
    #[inline]
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = Self::config_dir().context("Failed to determine config directory")?;

        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.ingest.validate()?;
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }
}

impl DatabaseConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.dbname.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseName(self.dbname.clone()));
        }

        if self.user.trim().is_empty() {
            return Err(ConfigError::InvalidUser(self.user.clone()));
        }

        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(ConfigError::InvalidMaxConnections(self.max_connections));
        }

        Ok(())
    }

    #[inline]
    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidHost(host));
        }
        self.host = host;
        Ok(())
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    #[inline]
    pub fn set_dbname(&mut self, dbname: String) -> Result<(), ConfigError> {
        if dbname.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseName(dbname));
        }
        self.dbname = dbname;
        Ok(())
    }

    #[inline]
    pub fn set_user(&mut self, user: String) -> Result<(), ConfigError> {
        if user.trim().is_empty() {
            return Err(ConfigError::InvalidUser(user));
        }
        self.user = user;
        Ok(())
    }

    #[inline]
    pub fn set_max_connections(&mut self, max_connections: u32) -> Result<(), ConfigError> {
        if max_connections == 0 || max_connections > 100 {
            return Err(ConfigError::InvalidMaxConnections(max_connections));
        }
        self.max_connections = max_connections;
        Ok(())
    }
}

impl IngestConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimension == 0 || self.dimension > 16_000 {
            return Err(ConfigError::InvalidDimension(self.dimension));
        }

        if self.batch_size == 0 || self.batch_size > 10_000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    #[inline]
    pub fn set_dimension(&mut self, dimension: usize) -> Result<(), ConfigError> {
        if dimension == 0 || dimension > 16_000 {
            return Err(ConfigError::InvalidDimension(dimension));
        }
        self.dimension = dimension;
        Ok(())
    }

    #[inline]
    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 10_000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }
}

impl SourceEntry {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module.trim().is_empty() {
            return Err(ConfigError::InvalidSource(format!(
                "missing module name for file {}",
                self.file.display()
            )));
        }
        Ok(())
    }
}
