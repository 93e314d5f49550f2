use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign-in request body for the password grant
#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Refresh request body for the refresh-token grant
#[derive(Debug, Clone, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// Response from the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A bearer session belonging to an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    /// Builds a session from a token response received at `now`
    pub fn from_token_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: now + Duration::seconds(response.expires_in),
            user: response.user,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Id of the owning user, as used in owner-scoped storage paths
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// What changed between two session values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    /// Same user, new tokens
    Refreshed,
    /// Different user without an intermediate sign-out
    UserSwitched,
    Unchanged,
}

impl SessionChange {
    pub fn between(previous: Option<&Session>, current: Option<&Session>) -> Self {
        match (previous, current) {
            (None, None) => SessionChange::Unchanged,
            (None, Some(_)) => SessionChange::SignedIn,
            (Some(_), None) => SessionChange::SignedOut,
            (Some(old), Some(new)) if old.user.id != new.user.id => SessionChange::UserSwitched,
            (Some(old), Some(new)) if old == new => SessionChange::Unchanged,
            (Some(_), Some(_)) => SessionChange::Refreshed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(user: Uuid, token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            user: User { id: user, email: None },
        }
    }

    #[test]
    fn test_from_token_response_sets_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = r#"{
            "access_token": "abc",
            "refresh_token": "def",
            "expires_in": 3600,
            "user": { "id": "7f1b7e0a-3c1d-4a7e-9a51-0c5d7c2b9f10", "email": "a@b.c" }
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let session = Session::from_token_response(response, now);

        assert_eq!(session.expires_at, now + Duration::hours(1));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(1)));
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_session_change_classification() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let a1 = session(alice, "one");
        let a2 = session(alice, "two");
        let b1 = session(bob, "one");

        assert_eq!(SessionChange::between(None, Some(&a1)), SessionChange::SignedIn);
        assert_eq!(SessionChange::between(Some(&a1), None), SessionChange::SignedOut);
        assert_eq!(SessionChange::between(Some(&a1), Some(&a2)), SessionChange::Refreshed);
        assert_eq!(SessionChange::between(Some(&a1), Some(&b1)), SessionChange::UserSwitched);
        assert_eq!(SessionChange::between(Some(&a1), Some(&a1)), SessionChange::Unchanged);
        assert_eq!(SessionChange::between(None, None), SessionChange::Unchanged);
    }
}
