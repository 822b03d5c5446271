//! Token format recognition.

use regex::Regex;

use crate::api::PERMANENT_TOKEN_PREFIX;

/// Answers whether a token has one of the shapes YouTrack issues.
///
/// Only the shape is judged here; whether the server accepts the token is
/// the probe's business.
pub trait TokenClassifier {
    /// An application password: a fixed-length alphanumeric secret.
    fn is_application_password(&self, token: &str) -> bool;

    /// A permanent token sent as a bearer credential.
    fn is_bearer_token(&self, token: &str) -> bool;

    /// Whether either known shape matches.
    fn is_recognized(&self, token: &str) -> bool {
        self.is_application_password(token) || self.is_bearer_token(token)
    }
}

/// Regex-backed classifier for the two YouTrack credential formats.
#[derive(Debug, Clone)]
pub struct PatternTokenClassifier {
    app_password: Regex,
    bearer: Regex,
}

impl PatternTokenClassifier {
    pub fn new() -> Self {
        // Both patterns are literals; failing to compile them is a programming error.
        Self {
            app_password: Regex::new(r"^[0-9A-Za-z]{20}$").expect("valid app password pattern"),
            bearer: Regex::new(&format!(
                r"^{}[0-9A-Za-z+/=._\-]+$",
                regex::escape(PERMANENT_TOKEN_PREFIX)
            ))
            .expect("valid bearer token pattern"),
        }
    }
}

impl Default for PatternTokenClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClassifier for PatternTokenClassifier {
    fn is_application_password(&self, token: &str) -> bool {
        self.app_password.is_match(token)
    }

    fn is_bearer_token(&self, token: &str) -> bool {
        self.bearer.is_match(token)
    }
}
