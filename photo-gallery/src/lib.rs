//! # Photo Gallery
//!
//! Photo and album stores for a gallery that keeps photos on the device and
//! in the cloud.
//!
//! This crate provides:
//! - Snapshot stores for every scope (device, cloud, albums, shared albums)
//! - A local SQLite schema with additive migrations
//! - A cloud backend trait with a PostgREST-style HTTP implementation
//! - Signed-URL listings cached for a configurable TTL
//! - An on-device cache of downloaded cloud photos
//!
//! ## Snapshots
//!
//! Stores are values. `refresh`, `add_new_photos` and `delete_photos` return
//! a new store; a store held by a view keeps showing what it showed.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_gallery::{Database, LocalPhotoStore, PhotoSource, PhotoStore, TokioFileSystem};
//! use std::sync::Arc;
//!
//! let db = Database::open("/path/to/photos.db")?;
//! let store = PhotoStore::Local(LocalPhotoStore::new(
//!     db,
//!     Arc::new(TokioFileSystem),
//!     "/path/to/photos",
//! ))
//! .refresh()
//! .await;
//!
//! let store = store.add_new_photos(PhotoSource::Files(picked)).await?;
//! ```

pub mod albums;
pub mod cache;
pub mod database;
pub mod download;
pub mod error;
pub mod filesystem;
pub mod local;
pub mod models;
pub mod online;
pub mod remote;
pub mod schema;
pub mod snapshot;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use albums::AlbumStore;
pub use cache::{Cached, DEFAULT_TTL};
pub use database::Database;
pub use download::PhotoCache;
pub use error::{StoreError, StoreResult};
pub use filesystem::{FileSystem, TokioFileSystem};
pub use local::{LocalAlbumPhotoStore, LocalPhotoStore};
pub use models::{
    Album, OnlineStatus, PhotoGalleryConfig, PhotoItem, PhotoItemResult, PhotoToAdd,
};
pub use online::{open_public_album, OnlineAlbumPhotoStore, OnlinePhotoStore, PublicAlbumPhotoStore};
pub use remote::{RemoteBackend, RemoteError, RemoteResult};
pub use schema::init_photo_schema;
pub use snapshot::PhotoSnapshot;
pub use store::{PhotoSource, PhotoStore};

#[cfg(feature = "sync")]
pub use remote::rest::{RestBackend, RestConfig};
