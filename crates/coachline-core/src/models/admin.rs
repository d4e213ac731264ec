use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account as listed by `/admin/users/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    pub fn roles_display(&self) -> String {
        if self.roles.is_empty() {
            "-".to_string()
        } else {
            self.roles.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_user() {
        let json = r#"{"id": "u1", "email": "admin@example.com", "roles": ["admin", "coach"],
            "disabled_at": null, "disabled_reason": null, "created_at": "2025-11-02T08:15:00Z"}"#;
        let user: AdminUser = serde_json::from_str(json).unwrap();
        assert!(!user.is_disabled());
        assert_eq!(user.roles_display(), "admin, coach");
    }

    #[test]
    fn test_disabled_user() {
        let json = r#"{"id": "u2", "email": "x@example.com", "disabled_at": "2026-01-05T12:00:00Z",
            "disabled_reason": "chargeback", "created_at": "2025-11-02T08:15:00Z"}"#;
        let user: AdminUser = serde_json::from_str(json).unwrap();
        assert!(user.is_disabled());
        assert_eq!(user.disabled_reason.as_deref(), Some("chargeback"));
        assert_eq!(user.roles_display(), "-");
    }
}
