//! Application settings file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::repository::RepositorySettings;
use super::{ConfigError, Result};
use crate::tracking::TrackingSettings;

/// Directory name under the platform config directory.
const APP_DIR: &str = "ytsetup";

/// Settings file name.
const CONFIG_FILE: &str = "config.toml";

/// Environment variables consulted when no proxy host is configured here.
const PROXY_ENV_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];

/// HTTP proxy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxySettings {
    /// Proxy host name; empty or absent means not configured.
    pub host: Option<String>,
    /// Proxy port, 80 when absent.
    pub port: Option<u16>,
}

impl ProxySettings {
    /// Whether a proxy host is set here or in the environment.
    pub fn is_host_configured(&self) -> bool {
        self.proxy_url().is_some()
    }

    /// Check the configured host and port.
    ///
    /// The host is a bare name or address; a port belongs in `port`.
    pub fn validate(&self) -> Result<()> {
        if self.port == Some(0) {
            return Err(ConfigError::ValidationError(
                "proxy port cannot be 0".to_string(),
            ));
        }

        let Some(host) = self.host.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(());
        };
        let bare = strip_scheme(host);
        if bare.contains('/') || bare.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "proxy host '{}' must be a host name without a path",
                host
            )));
        }
        // Bracketed IPv6 literals carry colons of their own.
        let has_port = match bare.strip_prefix('[') {
            Some(rest) => rest.split_once(']').is_some_and(|(_, tail)| !tail.is_empty()),
            None => bare.contains(':'),
        };
        if has_port {
            return Err(ConfigError::ValidationError(format!(
                "proxy host '{}' includes a port; set [proxy] port instead",
                host
            )));
        }

        Ok(())
    }

    /// The proxy URL to send traffic through, if any.
    ///
    /// A host configured here wins over the environment.
    pub fn proxy_url(&self) -> Option<String> {
        if let Some(host) = self.host.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            return Some(format!(
                "http://{}:{}",
                strip_scheme(host),
                self.port.unwrap_or(80)
            ));
        }

        PROXY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }
}

fn strip_scheme(host: &str) -> &str {
    host.strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host)
}

/// Everything ytsetup persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub repository: RepositorySettings,
    pub proxy: ProxySettings,
    pub tracking: TrackingSettings,
}

impl Settings {
    /// The default settings file location.
    ///
    /// - Linux: `~/.config/ytsetup/config.toml`
    /// - macOS: `~/Library/Application Support/ytsetup/config.toml`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\ytsetup\config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let settings: Settings = toml::from_str(&contents)?;
        settings.validate()?;

        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Save settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;

        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.repository.validate()?;
        self.tracking.validate(self.repository.verified)?;
        self.proxy.validate()
    }
}
