//! Configuration management for ytsetup.
//!
//! This module handles loading and saving the settings file: the YouTrack
//! repository, proxy and time tracker settings.

mod repository;
mod settings;

use thiserror::Error;

pub use repository::RepositorySettings;
pub use settings::{ProxySettings, Settings};

/// Errors that can occur while reading, writing or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no configuration directory.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("invalid configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Settings are readable but not acceptable.
    #[error("{0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
