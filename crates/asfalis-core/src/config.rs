//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API base URL, extra trusted root certificate, network timeouts, session
//! storage backend and the last used username.
//!
//! Configuration is stored at `~/.config/asfalis/config.json`. Environment
//! variables (`ASFALIS_BASE_URL`, `ASFALIS_CA_CERT`, `ASFALIS_STORE`) override
//! the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::{
    normalize_base_url, ClientOptions, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_READ_TIMEOUT_SECS, DEFAULT_WRITE_TIMEOUT_SECS,
};
use crate::auth::{FileSessionStore, KeyringSessionStore, SessionStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "asfalis";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "ASFALIS_BASE_URL";
const ENV_CA_CERT: &str = "ASFALIS_CA_CERT";
const ENV_STORE: &str = "ASFALIS_STORE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "keyring" => Ok(StoreBackend::Keyring),
            other => Err(anyhow::anyhow!("Unknown session store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
    pub write_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
            write_secs: DEFAULT_WRITE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// PEM root certificate trusted in addition to the system roots.
    pub ca_certificate: Option<PathBuf>,
    pub timeouts: Timeouts,
    pub store: StoreBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ca_certificate: None,
            timeouts: Timeouts::default(),
            store: StoreBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(path) = lookup(ENV_CA_CERT).filter(|v| !v.trim().is_empty()) {
            self.ca_certificate = Some(PathBuf::from(path));
        }
        if let Some(store) = lookup(ENV_STORE).filter(|v| !v.trim().is_empty()) {
            self.store = store.parse()?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session record for the file backend.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build HTTP client options, reading the extra root certificate if set.
    pub fn client_options(&self) -> Result<ClientOptions> {
        let extra_root_pem = match self.ca_certificate {
            Some(ref path) => Some(std::fs::read(path).with_context(|| {
                format!("Failed to read CA certificate {}", path.display())
            })?),
            None => None,
        };

        Ok(ClientOptions {
            base_url: normalize_base_url(&self.base_url)?,
            connect_timeout: Duration::from_secs(self.timeouts.connect_secs),
            read_timeout: Duration::from_secs(self.timeouts.read_secs),
            write_timeout: Duration::from_secs(self.timeouts.write_secs),
            extra_root_pem,
        })
    }

    /// Open the configured session store backend.
    pub fn open_store(&self) -> Result<Arc<dyn SessionStore>> {
        let store: Arc<dyn SessionStore> = match self.store {
            StoreBackend::File => Arc::new(FileSessionStore::new(&self.data_dir()?)),
            StoreBackend::Keyring => {
                Arc::new(KeyringSessionStore::new().context("Failed to open keychain entry")?)
            }
        };
        Ok(store)
    }
}
