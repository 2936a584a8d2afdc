use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use tracing::warn;

use crate::endpoint::Endpoint;
use crate::storage::Durability;

pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Preset name (`local`, `lan`, `production`) or a literal base URL
    pub endpoint: Option<String>,
    pub durability: Option<Durability>,
    pub greeting: Option<String>,
    /// Where the message database lives; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint: Some(Endpoint::Production.as_str().to_string()),
            durability: Some(Durability::Strict),
            greeting: None,
            data_dir: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_endpoint(endpoint: &Endpoint) -> Result<()> {
        Self::save_endpoint_to(&Self::get_config_path()?, endpoint)
    }

    /// Record `endpoint` in the file at `config_path`, keeping its other settings.
    pub fn save_endpoint_to(config_path: &Path, endpoint: &Endpoint) -> Result<()> {
        let mut config = Self::load_from(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable config file, starting from defaults");
            Self::new()
        });
        config.endpoint = Some(endpoint.as_str().to_string());
        config.save_to(config_path)
    }

    /// Configured endpoint, falling back to production when unset or invalid.
    pub fn endpoint(&self) -> Endpoint {
        match self.endpoint.as_deref() {
            None => Endpoint::default(),
            Some(raw) => Endpoint::from_str(raw).unwrap_or_else(|| {
                warn!(endpoint = raw, "Unknown endpoint in config, using production");
                Endpoint::default()
            }),
        }
    }

    pub fn durability(&self) -> Durability {
        self.durability.unwrap_or_default()
    }

    pub fn greeting(&self) -> String {
        self.greeting
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_GREETING)
            .to_string()
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("parley"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("parley").join("config.json"))
    }
}
