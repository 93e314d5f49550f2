//! Cloud side of the store layer: relational tables plus an object bucket.
//!
//! The stores only talk to the [`RemoteBackend`] trait. The HTTP
//! implementation against a PostgREST-style API lives in [`rest`] behind the
//! `sync` feature.

#[cfg(feature = "sync")]
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloud_auth::Session;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result type for backend calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur while talking to the backend
#[derive(Debug)]
pub enum RemoteError {
    Http(String),
    Status { status: u16, message: String },
    Json(String),
    Other(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Http(e) => write!(f, "HTTP error: {}", e),
            RemoteError::Status { status, message } => {
                write!(f, "Server returned {}: {}", status, message)
            }
            RemoteError::Json(e) => write!(f, "JSON error: {}", e),
            RemoteError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

/// A row of the `photo` table; `uri` is the object path in the bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePhotoRow {
    pub id: i64,
    pub uri: String,
    pub date_taken: DateTime<Utc>,
}

/// A `photo` row to insert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRemotePhoto {
    pub user_id: Uuid,
    pub uri: String,
    pub date_taken: DateTime<Utc>,
}

/// An `album` row with its photo count aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAlbumRow {
    pub id: i64,
    pub name: String,
    pub is_public: bool,
    pub photo_quantity: i64,
    pub access_key: Option<String>,
}

/// Outcome of signing one path in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrl {
    pub path: String,
    pub result: Result<String, String>,
}

/// Operations the online stores need from the cloud backend
///
/// `session` is the bearer identity for the call; `None` means anonymous
/// access (only meaningful for the access-key procedures and signing).
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Photos visible to the session, optionally restricted to one album
    async fn list_photos(
        &self,
        session: &Session,
        album_id: Option<i64>,
    ) -> RemoteResult<Vec<RemotePhotoRow>>;

    /// Signs every path in one request, in input order
    async fn create_signed_urls(
        &self,
        session: Option<&Session>,
        paths: &[String],
        expires_in: chrono::Duration,
    ) -> RemoteResult<Vec<SignedUrl>>;

    /// Stores `bytes` at `path` in the photo bucket and returns the stored path
    async fn upload_object(
        &self,
        session: &Session,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RemoteResult<String>;

    async fn remove_objects(&self, session: &Session, paths: &[String]) -> RemoteResult<()>;

    /// Downloads a (signed) object URL
    async fn download(&self, url: &str) -> RemoteResult<Vec<u8>>;

    async fn insert_photos(&self, session: &Session, rows: &[NewRemotePhoto]) -> RemoteResult<()>;

    /// Deletes the photo rows and returns their object paths
    async fn delete_photos(&self, session: &Session, ids: &[i64]) -> RemoteResult<Vec<String>>;

    async fn insert_album_photos(
        &self,
        session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()>;

    async fn delete_album_photos(
        &self,
        session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()>;

    async fn list_albums(&self, session: &Session) -> RemoteResult<Vec<RemoteAlbumRow>>;

    async fn create_album(&self, session: &Session, name: &str, is_public: bool) -> RemoteResult<()>;

    async fn delete_album(&self, session: &Session, album_id: i64) -> RemoteResult<()>;

    /// Server procedure resolving an access key to the album's photos
    async fn photos_by_access_key(
        &self,
        session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<Vec<RemotePhotoRow>>;

    /// Server procedure resolving an access key to the album's name
    async fn album_name_by_access_key(
        &self,
        session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<String>;

    /// Stores the access key in the signed-in user's profile metadata
    async fn record_access_key(&self, session: &Session, access_key: &str) -> RemoteResult<()>;
}

/// Content type from a file extension, defaulting to JPEG
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}
