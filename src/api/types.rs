//! YouTrack API response types.

use serde::{Deserialize, Serialize};

/// Path of the endpoint used to check that a token is accepted.
pub const CURRENT_USER_PATH: &str = "/api/users/me";

/// Path of the endpoint listing time-tracking work item types.
pub const WORK_ITEM_TYPES_PATH: &str = "/api/admin/timeTrackingSettings/workItemTypes";

/// The current authenticated user.
///
/// Returned by `GET /api/users/me?fields=login,name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// The user's login.
    pub login: String,
    /// The user's full name, if the server reports one.
    #[serde(default)]
    pub name: Option<String>,
}

impl CurrentUser {
    /// The name to show in messages, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.login)
    }
}

/// A time-tracking work item type (e.g. "Development", "Testing").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItemType {
    /// The type's database ID.
    pub id: String,
    /// The type's display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_deserialize() {
        let json = r#"{"login":"root","name":"Admin","$type":"Me"}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.login, "root");
        assert_eq!(user.display_name(), "Admin");
    }

    #[test]
    fn test_current_user_display_name_falls_back_to_login() {
        let user: CurrentUser = serde_json::from_str(r#"{"login":"jdoe"}"#).unwrap();
        assert_eq!(user.display_name(), "jdoe");

        let user: CurrentUser = serde_json::from_str(r#"{"login":"jdoe","name":""}"#).unwrap();
        assert_eq!(user.display_name(), "jdoe");
    }

    #[test]
    fn test_work_item_types_deserialize() {
        let json = r#"[{"id":"67-0","name":"Development","$type":"WorkItemType"},
                       {"id":"67-1","name":"Testing","$type":"WorkItemType"}]"#;
        let types: Vec<WorkItemType> = serde_json::from_str(json).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[1].name, "Testing");
    }
}
