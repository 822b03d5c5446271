//! Authentication handling for the YouTrack API.
//!
//! YouTrack accepts permanent tokens as a bearer credential. Anything else is
//! sent as the password half of HTTP Basic auth with a placeholder login,
//! which the server ignores when the password is a token.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Prefix carried by YouTrack permanent tokens.
pub const PERMANENT_TOKEN_PREFIX: &str = "perm:";

/// Login sent alongside a token in Basic auth.
const PLACEHOLDER_LOGIN: &str = "random";

/// A credential typed by the user.
///
/// The `Debug` output is masked so the token can sit inside structs that get
/// logged. Use [`SecretToken::expose`] only where the raw value must leave
/// the process (HTTP headers, the keyring).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the user supplied nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A loggable form: the permanent-token prefix at most, never the secret.
    pub fn masked(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else if self.0.starts_with(PERMANENT_TOKEN_PREFIX) {
            format!("{}***", PERMANENT_TOKEN_PREFIX)
        } else {
            "***".to_string()
        }
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretToken").field(&self.masked()).finish()
    }
}

impl From<String> for SecretToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SecretToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Authentication credentials for YouTrack requests.
#[derive(Clone)]
pub struct Auth {
    /// The complete `Authorization` header value.
    auth_header: String,
}

impl Auth {
    /// Create authentication from a token.
    ///
    /// The header is built immediately and the token itself is not kept.
    pub fn new(token: &SecretToken) -> Self {
        Self {
            auth_header: build_auth_header(token.expose()),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Whether the header uses the bearer scheme.
    pub fn is_bearer(&self) -> bool {
        self.auth_header.starts_with("Bearer ")
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.is_bearer() { "Bearer" } else { "Basic" };
        f.debug_struct("Auth").field("scheme", &scheme).finish()
    }
}

fn build_auth_header(token: &str) -> String {
    if token.starts_with(PERMANENT_TOKEN_PREFIX) {
        format!("Bearer {}", token)
    } else {
        let credentials = format!("{}:{}", PLACEHOLDER_LOGIN, token);
        format!("Basic {}", BASE64.encode(credentials.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_token_uses_bearer() {
        let auth = Auth::new(&SecretToken::new("perm:cm9vdA==.NDctMA==.abc"));
        assert!(auth.is_bearer());
        assert_eq!(auth.header_value(), "Bearer perm:cm9vdA==.NDctMA==.abc");
    }

    #[test]
    fn test_other_token_uses_basic_with_placeholder_login() {
        let auth = Auth::new(&SecretToken::new("a1b2c3d4e5f6g7h8i9j0"));
        assert!(!auth.is_bearer());

        let encoded = auth.header_value().strip_prefix("Basic ").unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, "random:a1b2c3d4e5f6g7h8i9j0");
    }

    #[test]
    fn test_secret_token_debug_is_masked() {
        let token = SecretToken::new("perm:super-secret");
        let debug_output = format!("{:?}", token);
        assert!(!debug_output.contains("super-secret"));
        assert!(debug_output.contains("perm:***"));

        let token = SecretToken::new("hunter2hunter2");
        assert!(!format!("{:?}", token).contains("hunter2"));
    }

    #[test]
    fn test_auth_debug_does_not_contain_raw_token() {
        let auth = Auth::new(&SecretToken::new("perm:secret_token"));
        let debug_output = format!("{:?}", auth);
        assert!(!debug_output.contains("secret_token"));
        assert!(debug_output.contains("Bearer"));
    }

    #[test]
    fn test_empty_token() {
        let token = SecretToken::default();
        assert!(token.is_empty());
        assert_eq!(token.masked(), "");
    }
}
