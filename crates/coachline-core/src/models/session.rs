//! Coaching session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A coaching session as returned by `/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    pub id: String,
    pub coach_id: String,
    #[serde(default)]
    pub coach_name: Option<String>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub currency: String,
    pub status: String,
}

impl Session {
    pub fn duration_minutes(&self) -> i64 {
        (self.ends_at - self.starts_at).num_minutes()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.eq_ignore_ascii_case("cancelled") || self.status.eq_ignore_ascii_case("canceled")
    }

    /// Coach name if the service joined it in, else the coach id
    pub fn coach_display(&self) -> &str {
        self.coach_name.as_deref().unwrap_or(&self.coach_id)
    }
}

/// Body of `POST /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewSession {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl NewSession {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            starts_at,
            ends_at,
            max_participants: None,
            price_cents: None,
            currency: None,
        }
    }

    /// Catch the obvious mistakes before bothering the service
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.ends_at <= self.starts_at {
            return Err("session must end after it starts".to_string());
        }
        if self.max_participants == Some(0) {
            return Err("max participants must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_json() -> &'static str {
        r#"{
            "id": "5f0c6c1e-6a53-4a0e-9d6f-1f0f3d2b8a11",
            "coach_id": "0e65066c-ab20-4da0-b3bf-79dfd0668049",
            "title": "Serve practice",
            "starts_at": "2026-03-01T10:00:00Z",
            "ends_at": "2026-03-01T11:30:00Z",
            "status": "scheduled"
        }"#
    }

    #[test]
    fn test_parse_minimal_session() {
        let session: Session = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(session.title, "Serve practice");
        assert_eq!(session.duration_minutes(), 90);
        assert_eq!(session.price_cents, 0);
        assert!(session.max_participants.is_none());
        assert!(!session.is_cancelled());
        assert_eq!(session.coach_display(), "0e65066c-ab20-4da0-b3bf-79dfd0668049");
    }

    #[test]
    fn test_cancelled_status_spellings() {
        let mut session: Session = serde_json::from_str(sample_json()).unwrap();
        session.status = "CANCELLED".to_string();
        assert!(session.is_cancelled());
        session.status = "canceled".to_string();
        assert!(session.is_cancelled());
    }

    #[test]
    fn test_new_session_omits_unset_fields() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let body = serde_json::to_value(NewSession::new("Footwork", start, start + Duration::hours(1))).unwrap();
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["title"], "Footwork");
        assert_eq!(obj["starts_at"], "2026-03-01T10:00:00Z");
    }

    #[test]
    fn test_new_session_validate() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        assert!(NewSession::new("Ok", start, start + Duration::minutes(30)).validate().is_ok());
        assert!(NewSession::new("  ", start, start + Duration::minutes(30)).validate().is_err());
        assert!(NewSession::new("Backwards", start, start).validate().is_err());

        let mut zero = NewSession::new("Empty", start, start + Duration::minutes(30));
        zero.max_participants = Some(0);
        assert!(zero.validate().is_err());
    }
}
