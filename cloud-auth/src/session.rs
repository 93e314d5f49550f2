//! Holds the current session and notifies subscribers when it changes.

use crate::models::{Session, SessionChange};
use crate::service::{AuthError, AuthService};
use tokio::sync::watch;

/// Shared holder of the current session
///
/// Cloning the provider is cheap; all clones observe the same session.
#[derive(Clone)]
pub struct SessionProvider {
    sender: watch::Sender<Option<Session>>,
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionProvider {
    pub fn new(initial: Option<Session>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every session replacement
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }

    /// Replace the session and report what kind of transition happened
    pub fn set(&self, session: Option<Session>) -> SessionChange {
        let previous = self.sender.send_replace(session);
        let change = SessionChange::between(previous.as_ref(), self.sender.borrow().as_ref());
        log::debug!("Session change: {:?}", change);
        change
    }

    pub async fn sign_in(
        &self,
        auth: &AuthService,
        email: &str,
        password: &str,
    ) -> Result<SessionChange, AuthError> {
        let session = auth.sign_in_with_password(email, password).await?;
        Ok(self.set(Some(session)))
    }

    /// Refreshes the current session if it expired by `now`
    ///
    /// A failed refresh signs the user out locally.
    pub async fn refresh_if_expired(
        &self,
        auth: &AuthService,
        now: chrono::DateTime<chrono::Utc>,
    ) -> SessionChange {
        let Some(session) = self.current() else {
            return SessionChange::Unchanged;
        };
        if !session.is_expired(now) {
            return SessionChange::Unchanged;
        }

        match auth.refresh_session(&session.refresh_token).await {
            Ok(fresh) => self.set(Some(fresh)),
            Err(e) => {
                log::warn!("Could not refresh expired session: {}", e);
                self.set(None)
            }
        }
    }

    /// Signs out remotely (best effort) and clears the local session
    pub async fn sign_out(&self, auth: &AuthService) -> SessionChange {
        if let Some(session) = self.current() {
            if let Err(e) = auth.sign_out(&session).await {
                log::warn!("Remote sign-out failed, clearing local session anyway: {}", e);
            }
        }
        self.set(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            user: User {
                id: Uuid::new_v4(),
                email: None,
            },
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let provider = SessionProvider::default();
        let mut receiver = provider.subscribe();
        assert!(provider.current().is_none());

        let change = provider.set(Some(session()));
        assert_eq!(change, SessionChange::SignedIn);

        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_some());

        assert_eq!(provider.set(None), SessionChange::SignedOut);
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_refresh_if_expired() {
        let auth = AuthService::new("http://127.0.0.1:9".to_string(), "anon".to_string()).unwrap();
        let provider = SessionProvider::default();
        let before_expiry = Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap();
        let after_expiry = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(
            provider.refresh_if_expired(&auth, after_expiry).await,
            SessionChange::Unchanged
        );

        provider.set(Some(session()));
        assert_eq!(
            provider.refresh_if_expired(&auth, before_expiry).await,
            SessionChange::Unchanged
        );
        assert!(provider.current().is_some());

        // Auth server unreachable: the expired session is dropped
        assert_eq!(
            provider.refresh_if_expired(&auth, after_expiry).await,
            SessionChange::SignedOut
        );
        assert!(provider.current().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let provider = SessionProvider::default();
        let clone = provider.clone();
        provider.set(Some(session()));
        assert!(clone.current().is_some());
    }
}
