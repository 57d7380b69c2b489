use std::{fs, path::Path, path::PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::repositories::postgres::PostgresConfig;

/// Storage backend behind the served resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Postgres,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "postgres" => Ok(Backend::Postgres),
            other => bail!("unknown backend '{}', expected 'memory' or 'postgres'", other),
        }
    }
}

/// Configuration for the resource registry server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,
    pub port: u16,
    /// Number of HTTP workers, defaults to the number of CPUs when unset
    pub workers: Option<usize>,
    /// Path the document collection is mounted under
    pub resource_path: String,
    pub backend: Backend,
    pub postgres: PostgresConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            resource_path: "/documents".to_string(),
            backend: Backend::Memory,
            postgres: PostgresConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Default location: `<config dir>/resource-registry/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("resource-registry")
            .join("config.toml")
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location is created with defaults;
    /// a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    let config = Self::default();
                    config.save(&path)?;
                    config
                }
            }
        };

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.postgres.connection_string = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        Ok(toml::from_str::<ServerConfig>(config_str)?)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.resource_path.starts_with('/') || self.resource_path.len() < 2 {
            bail!(
                "resource_path must start with '/' and name a collection, got '{}'",
                self.resource_path
            );
        }
        if self.resource_path.ends_with('/') {
            bail!("resource_path must not end with '/'");
        }
        if self.workers == Some(0) {
            bail!("workers must be at least 1");
        }
        Ok(())
    }

    /// Collection name used in logs, derived from the mount path
    pub fn resource_name(&self) -> &str {
        self.resource_path.rsplit('/').next().unwrap_or_default()
    }
}
