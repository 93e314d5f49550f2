use cloud_auth::AuthError;
use photo_gallery::StoreError;
use std::fmt;

/// Central error type for the gallery app
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Error from a photo or album store
    Store(StoreError),
    /// Sign-in, refresh or sign-out failed
    Auth(AuthError),
    /// Config file could not be read or parsed
    Config(String),
    /// Media picker failed or was cancelled
    Picker(String),
    /// The cloud backend is not configured
    Offline,
    /// Validation error (e.g. invalid inputs)
    Validation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Store(e) => write!(f, "Store error: {}", e),
            AppError::Auth(e) => write!(f, "Authentication error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Picker(msg) => write!(f, "Picker error: {}", msg),
            AppError::Offline => write!(f, "No cloud backend configured"),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => AppError::Validation(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// User-friendly error messages for the UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::Store(StoreError::NoSession) => {
                "Please sign in to change your online photos.".to_string()
            }
            AppError::Store(StoreError::ReadOnly(_)) => {
                "Photos in this album cannot be changed.".to_string()
            }
            AppError::Store(StoreError::AlbumNotResolved(_)) => {
                "Could not resolve album.".to_string()
            }
            AppError::Store(_) => "Could not update photos. Please try again.".to_string(),
            AppError::Auth(AuthError::InvalidCredentials) => {
                "Wrong email or password.".to_string()
            }
            AppError::Auth(_) => "Could not reach the server. Please try again.".to_string(),
            AppError::Config(_) => "The configuration file is invalid.".to_string(),
            AppError::Picker(msg) => msg.clone(),
            AppError::Offline => "Online features are not configured.".to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_validation_becomes_app_validation() {
        let err: AppError = StoreError::Validation("Album name must not be empty".to_string()).into();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.user_message(), "Album name must not be empty");
    }

    #[test]
    fn test_user_messages_for_store_preconditions() {
        let no_session: AppError = StoreError::NoSession.into();
        assert_eq!(
            no_session.user_message(),
            "Please sign in to change your online photos."
        );

        let unresolved: AppError = StoreError::AlbumNotResolved("404".to_string()).into();
        assert_eq!(unresolved.user_message(), "Could not resolve album.");
        assert!(unresolved.to_string().contains("404"));
    }
}
