use crate::remote::RemoteError;

/// Error type for store operations
///
/// Backing-source failures are mostly logged and absorbed by the stores;
/// what reaches the caller is a precondition violation or an error from an
/// operation that has no sensible fallback.
#[derive(Debug)]
pub enum StoreError {
    DatabaseError(rusqlite::Error),
    IoError(std::io::Error),
    Remote(RemoteError),
    /// An online store was mutated while nobody is signed in
    NoSession,
    /// The store does not accept additions or deletions
    ReadOnly(&'static str),
    /// Files were given to an album store, or existing photos to a photo store
    WrongSource(&'static str),
    /// An access key did not resolve to an album
    AlbumNotResolved(String),
    Validation(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError(e) => write!(f, "Database error: {}", e),
            StoreError::IoError(e) => write!(f, "IO error: {}", e),
            StoreError::Remote(e) => write!(f, "Remote error: {}", e),
            StoreError::NoSession => write!(f, "Cannot modify online photos without a session"),
            StoreError::ReadOnly(store) => write!(f, "{} is read-only", store),
            StoreError::WrongSource(msg) => write!(f, "Wrong photo source: {}", msg),
            StoreError::AlbumNotResolved(msg) => write!(f, "Could not resolve album: {}", msg),
            StoreError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        StoreError::Remote(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
