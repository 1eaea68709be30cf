//! Core data models for memora.
//!
//! These types mirror the records the backend returns and are shared by the
//! client and web crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// MEMO TYPES
// =============================================================================

/// A user-authored note. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload: only the content is supplied by the client.
#[derive(Debug, Clone, Serialize)]
pub struct NewMemo<'a> {
    pub content: &'a str,
}

/// Full-content replacement for an existing memo.
#[derive(Debug, Clone, Serialize)]
pub struct MemoContentUpdate<'a> {
    pub content: &'a str,
}

// =============================================================================
// AUTH TYPES
// =============================================================================

/// Email/password pair submitted to sign-up and sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authenticated user as reported by the auth service.
///
/// Only the fields the application reads are modeled; the rest of the
/// backend's user object is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Label shown in the page header.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Session returned by a password grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Result of an account creation request.
///
/// Sign-up never establishes a session for the controller; when the backend
/// holds the account for e-mail confirmation `confirmation_pending` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub confirmation_pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_deserializes_backend_row() {
        let row = serde_json::json!({
            "id": "3f1c5a5e-2b7d-4a55-9f3e-0d1f2a3b4c5d",
            "content": "buy milk",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "user_id": "ignored"
        });
        let memo: Memo = serde_json::from_value(row).unwrap();
        assert_eq!(memo.content, "buy milk");
        assert_eq!(memo.id, "3f1c5a5e-2b7d-4a55-9f3e-0d1f2a3b4c5d");
    }

    #[test]
    fn test_new_memo_serializes_content_only() {
        let body = serde_json::to_value([NewMemo { content: "hello" }]).unwrap();
        assert_eq!(body, serde_json::json!([{ "content": "hello" }]));
    }

    #[test]
    fn test_user_minimal_fields() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "aud": "authenticated",
            "role": "authenticated"
        }))
        .unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.email.is_none());
        assert_eq!(user.display_name(), "u1");
    }

    #[test]
    fn test_user_display_name_prefers_email() {
        let user = User {
            id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
            created_at: None,
            confirmed_at: None,
            last_sign_in_at: None,
        };
        assert_eq!(user.display_name(), "a@b.com");
    }

    #[test]
    fn test_session_defaults_token_type() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "user": { "id": "u1" }
        }))
        .unwrap();
        assert_eq!(session.token_type, "bearer");
        assert!(session.refresh_token.is_none());
    }
}
