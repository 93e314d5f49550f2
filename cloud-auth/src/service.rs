use crate::models::{PasswordGrant, RefreshGrant, Session, TokenResponse};

/// Error type for authentication operations
#[derive(Debug)]
pub enum AuthError {
    NetworkError(String),
    JsonError(String),
    InvalidCredentials,
    ServerError(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AuthError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::ServerError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Authentication service for the gallery backend's token endpoint
pub struct AuthService {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(base_url: String, anon_key: String) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .user_agent("CloudAuth/0.1.0")
            .build()
            .map_err(|e| AuthError::NetworkError(format!("Client build failed: {}", e)))?;

        Ok(Self {
            base_url,
            anon_key,
            client,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn token_request<B: serde::Serialize>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, AuthError> {
        let url = self.auth_url(&format!("token?grant_type={}", grant_type));

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Request failed: {}", e)))?;

        match response.status().as_u16() {
            200 => {
                let token = response
                    .json::<TokenResponse>()
                    .await
                    .map_err(|e| AuthError::JsonError(format!("Failed to parse token: {}", e)))?;
                Ok(Session::from_token_response(token, chrono::Utc::now()))
            }
            400 | 401 => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::ServerError(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self
            .token_request("password", &PasswordGrant { email, password })
            .await?;
        log::info!("Signed in as {}", session.user.id);
        Ok(session)
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let session = self
            .token_request("refresh_token", &RefreshGrant { refresh_token })
            .await?;
        log::debug!("Refreshed session for {}", session.user.id);
        Ok(session)
    }

    /// Revoke the session on the server
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(format!("Logout request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::ServerError(format!(
                "Server returned status: {}",
                response.status()
            )));
        }

        log::info!("Signed out {}", session.user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_url_trims_trailing_slash() {
        let service =
            AuthService::new("https://api.example.com/".to_string(), "anon".to_string()).unwrap();
        assert_eq!(
            service.auth_url("logout"),
            "https://api.example.com/auth/v1/logout"
        );
    }
}
