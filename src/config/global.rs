//! Global configuration management for xcforge.
//!
//! This module handles the user configuration file (`~/.xcforge/config.toml`), which holds
//! settings that belong to a machine rather than a project: where the remote artifact
//! cache lives and which package-manager executables to run.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.xcforge/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\xcforge\config.toml`
//!
//! The binary accepts `--config <PATH>` (or `XCFORGE_CONFIG`) to point elsewhere.
//!
//! # File Format
//!
//! ```toml
//! [cache]
//! url = "https://cache.example.com/artifacts"
//! timeout_secs = 60
//!
//! [dependencies]
//! carthage_path = "/opt/homebrew/bin/carthage"
//! swift_path = "/usr/bin/swift"
//! timeout_secs = 1800
//! ```
//!
//! Every section and field is optional; a missing file yields the defaults.
//!
//! # Examples
//!
//! ```rust,no_run
//! use xcforge_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = GlobalConfig::load().await?;
//! config.cache.url = Some("https://cache.example.com".to_string());
//! config.save().await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Remote cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Base URL artifacts are stored under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request timeout for cache transfers. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl CacheConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Package-manager executable overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenciesConfig {
    /// Carthage executable; looked up in `PATH` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carthage_path: Option<PathBuf>,

    /// Swift executable; looked up in `PATH` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_path: Option<PathBuf>,

    /// Longest a single tool run may take. No limit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl DependenciesConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// User-wide xcforge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,
}

impl GlobalConfig {
    /// Load from the default location, falling back to defaults when the file is absent.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from [`GlobalConfig::default_path`].
    ///
    /// A missing file yields the default configuration; an unreadable or malformed one is
    /// an error.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load global configuration from a specific file path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save to the default location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path).await
    }

    /// Save to `path`, creating parent directories as needed.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// Platform-appropriate location of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("xcforge")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".xcforge")
        };

        Ok(config_dir.join("config.toml"))
    }
}
