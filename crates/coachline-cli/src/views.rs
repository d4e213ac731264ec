//! Plain-text rendering of service responses.

use std::fmt::Write;

use coachline_core::models::{AdminUser, Me, Page, Session};
use serde_json::Value;

use crate::format::{format_duration, format_optional, format_price, format_timestamp, truncate};

const TITLE_WIDTH: usize = 28;
const EMAIL_WIDTH: usize = 32;

pub fn render_me(me: &Me) -> String {
    let roles = if me.roles.is_empty() {
        "none".to_string()
    } else {
        me.roles.join(", ")
    };
    format!("Signed in as {}\nRoles: {}", me.email, roles)
}

pub fn render_sessions(page: &Page<Session>) -> String {
    if page.items.is_empty() {
        return "No sessions.".to_string();
    }

    let mut out = String::new();
    for session in &page.items {
        let _ = writeln!(
            out,
            "{:<12} {:<width$} {}  {:>7}  {}{}",
            truncate(&session.id, 12),
            truncate(&session.title, TITLE_WIDTH),
            format_timestamp(&session.starts_at),
            format_duration(session.duration_minutes()),
            format_price(session.price_cents, &session.currency),
            if session.is_cancelled() { "  [cancelled]" } else { "" },
            width = TITLE_WIDTH,
        );
    }
    if let Some(next) = page.next_offset() {
        let _ = writeln!(out, "More results from offset {}", next);
    }
    out.trim_end().to_string()
}

pub fn render_session(session: &Session) -> String {
    let capacity = session
        .max_participants
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unlimited".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", session.title, session.id);
    let _ = writeln!(out, "Coach:    {}", session.coach_display());
    let _ = writeln!(
        out,
        "When:     {} ({})",
        format_timestamp(&session.starts_at),
        format_duration(session.duration_minutes())
    );
    let _ = writeln!(out, "Capacity: {}", capacity);
    let _ = writeln!(out, "Price:    {}", format_price(session.price_cents, &session.currency));
    let _ = write!(out, "Status:   {}", session.status);
    out
}

pub fn render_users(page: &Page<AdminUser>) -> String {
    if page.items.is_empty() {
        return "No users.".to_string();
    }

    let mut out = String::new();
    for user in &page.items {
        let status = if user.is_disabled() {
            format!(
                "disabled ({})",
                format_optional(user.disabled_reason.as_deref(), "no reason")
            )
        } else {
            "active".to_string()
        };
        let _ = writeln!(
            out,
            "{:<12} {:<width$} {:<20} {}",
            truncate(&user.id, 12),
            truncate(&user.email, EMAIL_WIDTH),
            user.roles_display(),
            status,
            width = EMAIL_WIDTH,
        );
    }
    if let Some(next) = page.next_offset() {
        let _ = writeln!(out, "More results from offset {}", next);
    }
    out.trim_end().to_string()
}

/// Admin actions answer with loosely shaped JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "Done.".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(id: &str, status: &str) -> Session {
        serde_json::from_value(json!({
            "id": id,
            "coach_id": "c1",
            "coach_name": "Dana",
            "title": "Serve practice",
            "starts_at": "2026-03-01T10:00:00Z",
            "ends_at": "2026-03-01T11:30:00Z",
            "max_participants": 4,
            "price_cents": 2500,
            "currency": "EUR",
            "status": status
        }))
        .unwrap()
    }

    #[test]
    fn test_render_me() {
        let me = Me {
            email: "a@example.com".to_string(),
            roles: vec![],
        };
        assert_eq!(render_me(&me), "Signed in as a@example.com\nRoles: none");
    }

    #[test]
    fn test_render_sessions() {
        let page = Page {
            items: vec![session("s1", "scheduled"), session("s2", "cancelled")],
            limit: 2,
            offset: 0,
            has_more: true,
        };
        let out = render_sessions(&page);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("s1"));
        assert!(lines[0].contains("1h 30m"));
        assert!(lines[0].contains("25.00 EUR"));
        assert!(lines[1].ends_with("[cancelled]"));
        assert_eq!(lines[2], "More results from offset 2");
    }

    #[test]
    fn test_render_empty_pages() {
        let sessions: Page<Session> = Page {
            items: vec![],
            limit: 20,
            offset: 0,
            has_more: false,
        };
        assert_eq!(render_sessions(&sessions), "No sessions.");

        let users: Page<AdminUser> = Page {
            items: vec![],
            limit: 20,
            offset: 0,
            has_more: false,
        };
        assert_eq!(render_users(&users), "No users.");
    }

    #[test]
    fn test_render_session() {
        let out = render_session(&session("s1", "scheduled"));
        assert!(out.starts_with("Serve practice (s1)"));
        assert!(out.contains("Coach:    Dana"));
        assert!(out.contains("Capacity: 4"));
        assert!(out.ends_with("Status:   scheduled"));
    }

    #[test]
    fn test_render_users() {
        let users: Page<AdminUser> = serde_json::from_value(json!({
            "items": [
                {"id": "u1", "email": "a@example.com", "roles": ["admin"], "created_at": "2025-11-02T08:15:00Z"},
                {"id": "u2", "email": "b@example.com", "disabled_at": "2026-01-05T12:00:00Z",
                 "disabled_reason": "spam", "created_at": "2025-11-02T08:15:00Z"}
            ],
            "limit": 20, "offset": 0, "has_more": false
        }))
        .unwrap();
        let out = render_users(&users);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("admin"));
        assert!(lines[0].ends_with("active"));
        assert!(lines[1].ends_with("disabled (spam)"));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&Value::Null), "Done.");
        assert!(render_value(&json!({"ok": true})).contains("\"ok\": true"));
    }
}
