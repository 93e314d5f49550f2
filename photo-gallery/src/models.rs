use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A photo as shown in a grid or single-photo view
///
/// `uri` is a managed local file path for local scopes and a signed URL
/// (or a cached local copy of it) for online scopes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoItem {
    pub id: i64,
    pub uri: String,
    pub date_taken: DateTime<Utc>,
}

impl<'r> TryFrom<&Row<'r>> for PhotoItem {
    type Error = rusqlite::Error;

    /// Expects the columns `id, uri, date_taken`
    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        Ok(PhotoItem {
            id: row.get(0)?,
            uri: row.get(1)?,
            date_taken: row.get(2)?,
        })
    }
}

/// A source file waiting to be added to a store
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoToAdd {
    pub origin_uri: String,
    pub date_taken: DateTime<Utc>,
}

/// Position of a photo inside a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoItemResult {
    pub index: usize,
    pub photo_item: PhotoItem,
}

/// Visibility of a cloud-hosted album
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Public,
    Private,
}

impl OnlineStatus {
    pub fn from_is_public(is_public: bool) -> Self {
        if is_public {
            OnlineStatus::Public
        } else {
            OnlineStatus::Private
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, OnlineStatus::Public)
    }
}

/// A named grouping of photos, either on the device or in the cloud
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub photo_quantity: i64,
    /// `None` for device-local albums
    pub online_status: Option<OnlineStatus>,
    /// Only present for shareable public albums
    pub access_key: Option<String>,
}

impl Album {
    pub fn is_online(&self) -> bool {
        self.online_status.is_some()
    }

    /// Key that keeps local and online id spaces apart in one rendered list
    pub fn ui_key(&self) -> i64 {
        if self.is_online() {
            -self.id - 1
        } else {
            self.id
        }
    }
}

/// Configuration for the store layer
#[derive(Debug, Clone)]
pub struct PhotoGalleryConfig {
    /// Directory that holds copies of locally managed photos
    pub storage_path: String,
    /// Directory for cached copies of remote photos
    pub cache_path: String,
    /// Maximum age of an online listing (and lifetime of its signed URLs)
    pub cache_ttl: chrono::Duration,
    /// Record viewed public-album keys on the signed-in user's profile
    pub remember_public_albums: bool,
}

impl Default for PhotoGalleryConfig {
    fn default() -> Self {
        Self {
            storage_path: String::new(),
            cache_path: String::new(),
            cache_ttl: crate::cache::DEFAULT_TTL,
            remember_public_albums: false,
        }
    }
}
