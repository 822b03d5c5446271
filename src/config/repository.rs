//! YouTrack repository configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::setup::address::has_recognized_scheme;

/// Connection details for a YouTrack server.
///
/// Tokens are stored separately in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositorySettings {
    /// The server URL, as confirmed by the last connection test when there
    /// was one.
    pub url: String,

    /// Whether the URL is shared with other users of the project.
    pub shared: bool,

    /// Whether requests go through the configured proxy.
    pub use_proxy: bool,

    /// Keep the token in the OS keyring; otherwise for this session only.
    pub remember_token: bool,

    /// Whether the last connection test for `url` succeeded.
    pub verified: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            shared: false,
            use_proxy: false,
            remember_token: true,
            verified: false,
        }
    }
}

impl RepositorySettings {
    /// Whether a server has been configured.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Validate the stored repository.
    ///
    /// An empty URL is allowed (nothing configured yet); otherwise it must
    /// carry an `http` or `https` scheme.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Ok(());
        }

        if self.url.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "repository URL '{}' cannot contain whitespace",
                self.url
            )));
        }

        if !has_recognized_scheme(&self.url) {
            return Err(ConfigError::ValidationError(format!(
                "repository URL '{}' must start with http:// or https://",
                self.url
            )));
        }

        Ok(())
    }

    /// The credential store account holding this repository's token.
    pub fn credential_account(&self) -> &str {
        &self.url
    }
}
