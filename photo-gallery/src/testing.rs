//! In-memory backend and fixtures shared by the unit tests.

use crate::remote::{
    NewRemotePhoto, RemoteAlbumRow, RemoteBackend, RemoteError, RemotePhotoRow, RemoteResult,
    SignedUrl,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use cloud_auth::{Session, User};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub fn session() -> Session {
    Session {
        access_token: "token".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        user: User {
            id: Uuid::new_v4(),
            email: Some("viewer@example.com".to_string()),
        },
    }
}

#[derive(Debug, Clone)]
pub struct FakeAlbum {
    pub id: i64,
    pub name: String,
    pub is_public: bool,
    pub access_key: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    pub next_id: i64,
    pub photos: Vec<RemotePhotoRow>,
    pub albums: Vec<FakeAlbum>,
    pub album_photos: HashSet<(i64, i64)>,
    pub objects: BTreeMap<String, Vec<u8>>,
    /// Object paths whose signing fails individually
    pub unsignable: HashSet<String>,
    /// Object paths whose upload fails
    pub failing_uploads: HashSet<String>,
    pub fail_listing: bool,
    pub fail_signing: bool,
    pub fail_object_removal: bool,
    pub fail_record_access_key: bool,
    pub recorded_access_keys: Vec<(Uuid, String)>,
    pub sign_requests: usize,
    pub downloads: usize,
}

/// A [`RemoteBackend`] living in memory
#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_photo(&self, uri: &str, date_taken: DateTime<Utc>) -> i64 {
        self.with(|state| {
            state.next_id += 1;
            let id = state.next_id;
            state.photos.push(RemotePhotoRow {
                id,
                uri: uri.to_string(),
                date_taken,
            });
            state.objects.insert(uri.to_string(), uri.as_bytes().to_vec());
            id
        })
    }

    pub fn add_album(&self, name: &str, is_public: bool, access_key: Option<&str>) -> i64 {
        self.with(|state| {
            state.next_id += 1;
            let id = state.next_id;
            state.albums.push(FakeAlbum {
                id,
                name: name.to_string(),
                is_public,
                access_key: access_key.map(str::to_string),
            });
            id
        })
    }

    pub fn link(&self, album_id: i64, photo_id: i64) {
        self.with(|state| {
            state.album_photos.insert((photo_id, album_id));
        });
    }

    fn album_rows(state: &FakeState, album_id: i64) -> Vec<RemotePhotoRow> {
        state
            .photos
            .iter()
            .filter(|p| state.album_photos.contains(&(p.id, album_id)))
            .cloned()
            .collect()
    }
}

pub fn signed(path: &str) -> String {
    format!("https://signed.example.com/{}", path)
}

#[async_trait]
impl RemoteBackend for FakeBackend {
    async fn list_photos(
        &self,
        _session: &Session,
        album_id: Option<i64>,
    ) -> RemoteResult<Vec<RemotePhotoRow>> {
        self.with(|state| {
            if state.fail_listing {
                return Err(RemoteError::Status {
                    status: 500,
                    message: "listing failed".to_string(),
                });
            }
            Ok(match album_id {
                Some(album_id) => Self::album_rows(state, album_id),
                None => state.photos.clone(),
            })
        })
    }

    async fn create_signed_urls(
        &self,
        _session: Option<&Session>,
        paths: &[String],
        _expires_in: chrono::Duration,
    ) -> RemoteResult<Vec<SignedUrl>> {
        self.with(|state| -> RemoteResult<Vec<SignedUrl>> {
            state.sign_requests += 1;
            if state.fail_signing {
                return Err(RemoteError::Other("signing unavailable".to_string()));
            }
            Ok(paths
                .iter()
                .map(|path| SignedUrl {
                    path: path.clone(),
                    result: if state.unsignable.contains(path) {
                        Err("Object not found".to_string())
                    } else {
                        Ok(signed(path))
                    },
                })
                .collect())
        })
    }

    async fn upload_object(
        &self,
        _session: &Session,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> RemoteResult<String> {
        self.with(|state| {
            if state.failing_uploads.contains(path) {
                return Err(RemoteError::Status {
                    status: 400,
                    message: "upload rejected".to_string(),
                });
            }
            state.objects.insert(path.to_string(), bytes);
            Ok(path.to_string())
        })
    }

    async fn remove_objects(&self, _session: &Session, paths: &[String]) -> RemoteResult<()> {
        self.with(|state| {
            if state.fail_object_removal {
                return Err(RemoteError::Other("bucket unavailable".to_string()));
            }
            for path in paths {
                state.objects.remove(path);
            }
            Ok(())
        })
    }

    async fn download(&self, url: &str) -> RemoteResult<Vec<u8>> {
        self.with(|state| -> RemoteResult<Vec<u8>> {
            state.downloads += 1;
            let path = url
                .strip_prefix("https://signed.example.com/")
                .ok_or_else(|| RemoteError::Other(format!("unknown url {}", url)))?;
            state
                .objects
                .get(path)
                .cloned()
                .ok_or_else(|| RemoteError::Status {
                    status: 404,
                    message: "not found".to_string(),
                })
        })
    }

    async fn insert_photos(&self, _session: &Session, rows: &[NewRemotePhoto]) -> RemoteResult<()> {
        self.with(|state| {
            for row in rows {
                state.next_id += 1;
                let id = state.next_id;
                state.photos.push(RemotePhotoRow {
                    id,
                    uri: row.uri.clone(),
                    date_taken: row.date_taken,
                });
            }
            Ok(())
        })
    }

    async fn delete_photos(&self, _session: &Session, ids: &[i64]) -> RemoteResult<Vec<String>> {
        self.with(|state| -> RemoteResult<Vec<String>> {
            let (deleted, kept): (Vec<_>, Vec<_>) = state
                .photos
                .drain(..)
                .partition(|photo| ids.contains(&photo.id));
            state.photos = kept;
            state
                .album_photos
                .retain(|(photo_id, _)| !ids.contains(photo_id));
            Ok(deleted.into_iter().map(|photo| photo.uri).collect())
        })
    }

    async fn insert_album_photos(
        &self,
        _session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()> {
        self.with(|state| {
            for photo_id in photo_ids {
                state.album_photos.insert((*photo_id, album_id));
            }
            Ok(())
        })
    }

    async fn delete_album_photos(
        &self,
        _session: &Session,
        album_id: i64,
        photo_ids: &[i64],
    ) -> RemoteResult<()> {
        self.with(|state| {
            state
                .album_photos
                .retain(|(photo_id, a)| !(*a == album_id && photo_ids.contains(photo_id)));
            Ok(())
        })
    }

    async fn list_albums(&self, _session: &Session) -> RemoteResult<Vec<RemoteAlbumRow>> {
        self.with(|state| -> RemoteResult<Vec<RemoteAlbumRow>> {
            if state.fail_listing {
                return Err(RemoteError::Other("listing failed".to_string()));
            }
            Ok(state
                .albums
                .iter()
                .map(|album| RemoteAlbumRow {
                    id: album.id,
                    name: album.name.clone(),
                    is_public: album.is_public,
                    photo_quantity: state
                        .album_photos
                        .iter()
                        .filter(|(_, a)| *a == album.id)
                        .count() as i64,
                    access_key: album.access_key.clone(),
                })
                .collect())
        })
    }

    async fn create_album(&self, _session: &Session, name: &str, is_public: bool) -> RemoteResult<()> {
        let access_key = is_public.then(|| format!("key-{}", name));
        self.add_album(name, is_public, access_key.as_deref());
        Ok(())
    }

    async fn delete_album(&self, _session: &Session, album_id: i64) -> RemoteResult<()> {
        self.with(|state| {
            state.albums.retain(|album| album.id != album_id);
            state.album_photos.retain(|(_, a)| *a != album_id);
            Ok(())
        })
    }

    async fn photos_by_access_key(
        &self,
        _session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<Vec<RemotePhotoRow>> {
        self.with(|state| -> RemoteResult<Vec<RemotePhotoRow>> {
            if state.fail_listing {
                return Err(RemoteError::Other("listing failed".to_string()));
            }
            let album = state
                .albums
                .iter()
                .find(|album| album.is_public && album.access_key.as_deref() == Some(access_key))
                .ok_or_else(|| RemoteError::Other("unknown access key".to_string()))?;
            Ok(Self::album_rows(state, album.id))
        })
    }

    async fn album_name_by_access_key(
        &self,
        _session: Option<&Session>,
        access_key: &str,
    ) -> RemoteResult<String> {
        self.with(|state| {
            state
                .albums
                .iter()
                .find(|album| album.is_public && album.access_key.as_deref() == Some(access_key))
                .map(|album| album.name.clone())
                .ok_or_else(|| RemoteError::Other("No album for this access key".to_string()))
        })
    }

    async fn record_access_key(&self, session: &Session, access_key: &str) -> RemoteResult<()> {
        self.with(|state| {
            if state.fail_record_access_key {
                return Err(RemoteError::Other("profile update failed".to_string()));
            }
            state
                .recorded_access_keys
                .push((session.user_id(), access_key.to_string()));
            Ok(())
        })
    }
}
