//! Centralized error types for ytsetup.
//!
//! Expected connection-test results are not errors; they are reported as a
//! [`NotifierState`](crate::setup::NotifierState). The types here cover what
//! can go wrong around them: settings files, the keyring, HTTP lookups.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::tracking::ScheduleError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A scheduled time that does not parse.
    #[error("{0}")]
    Schedule(#[from] ScheduleError),
}

impl AppError {
    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Use --config to choose a file."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file is readable."
                        .to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. The server rejected the token.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. The token lacks permission for this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => {
                    "YouTrack server error. Please try again later.".to_string()
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check your network connection.".to_string()
                }
                ApiError::InvalidUrl(msg) => format!("Invalid URL: {}", msg),
                ApiError::Keyring(_) => {
                    "Could not access secure storage for the token.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from YouTrack. Please try again.".to_string()
                }
                ApiError::ConnectionFailed(_) => {
                    "Could not connect to YouTrack. Please check your URL and network.".to_string()
                }
            },
            AppError::Schedule(e) => format!("Invalid schedule: {}", e),
        }
    }

    /// Check if this error is critical and requires user action before
    /// anything else can work.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::Unauthorized)
                | AppError::Api(ApiError::Forbidden)
                | AppError::Api(ApiError::Keyring(_))
        )
    }

    /// Check if this error is recoverable by simply trying again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::RateLimited)
                | AppError::Api(ApiError::ServerError(_))
                | AppError::Api(ApiError::Network(_))
                | AppError::Api(ApiError::ConnectionFailed(_))
        )
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ParseError(_)) => {
                Some("Fix or delete the configuration file and run 'ytsetup save' again.")
            }
            AppError::Api(ApiError::Unauthorized) => Some(
                "Generate a permanent token: https://www.jetbrains.com/help/youtrack/incloud/Manage-Permanent-Token.html",
            ),
            AppError::Api(ApiError::RateLimited) => Some("Wait a few seconds and try again."),
            AppError::Api(ApiError::Network(_)) | AppError::Api(ApiError::ConnectionFailed(_)) => {
                Some("Check your network connection, proxy settings and the YouTrack URL.")
            }
            AppError::Api(ApiError::Keyring(_)) => {
                Some("Use --no-remember-token to keep the token for this session only.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoConfigDir.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::Unauthorized.into();
        assert!(matches!(app_err, AppError::Api(ApiError::Unauthorized)));
    }

    #[test]
    fn test_user_message_unauthorized() {
        let msg = AppError::Api(ApiError::Unauthorized).user_message();
        assert!(msg.contains("Authentication failed"));
        assert!(msg.contains("token"));
    }

    #[test]
    fn test_user_message_connection_failed() {
        let err = AppError::Api(ApiError::ConnectionFailed("no answer".to_string()));
        assert!(err.user_message().contains("Could not connect to YouTrack"));
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = AppError::Config(ConfigError::ValidationError(
            "comment cannot be set in Disabled mode".to_string(),
        ));
        assert!(err.user_message().contains("comment cannot be set"));
    }

    #[test]
    fn test_user_message_schedule() {
        let err: AppError = ScheduleError::Hour(25).into();
        assert_eq!(
            err.user_message(),
            "Invalid schedule: hour 25 is out of range (0-23)"
        );
    }

    #[test]
    fn test_is_critical() {
        assert!(AppError::Api(ApiError::Unauthorized).is_critical());
        assert!(AppError::Config(ConfigError::NoConfigDir).is_critical());
        assert!(!AppError::Api(ApiError::RateLimited).is_critical());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(AppError::Api(ApiError::RateLimited).is_recoverable());
        assert!(AppError::Api(ApiError::ConnectionFailed("x".to_string())).is_recoverable());
        assert!(!AppError::Api(ApiError::Unauthorized).is_recoverable());
    }

    #[test]
    fn test_suggested_action_unauthorized() {
        let action = AppError::Api(ApiError::Unauthorized).suggested_action();
        assert!(action.unwrap().contains("Permanent-Token"));
    }

    #[test]
    fn test_suggested_action_keyring() {
        let action = AppError::Api(ApiError::Keyring("locked".to_string())).suggested_action();
        assert!(action.unwrap().contains("--no-remember-token"));
    }

    #[test]
    fn test_schedule_error_has_no_suggested_action() {
        let err: AppError = ScheduleError::Minute(75).into();
        assert!(err.suggested_action().is_none());
        assert!(!err.is_critical());
        assert!(!err.is_recoverable());
    }
}
