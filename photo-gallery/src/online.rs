//! Stores backed by the cloud tables and photo bucket.
//!
//! Every listing is signed in one batch; rows whose URL cannot be signed are
//! left out of the snapshot. Listings are cached with their fetch time and
//! reused by [`OnlinePhotoStore::refresh_if_stale`] until the TTL runs out.

use crate::cache::Cached;
use crate::error::{StoreError, StoreResult};
use crate::filesystem::{uri_to_path, FileSystem};
use crate::models::{Album, PhotoItem, PhotoToAdd};
use crate::remote::{content_type_for, NewRemotePhoto, RemoteBackend, RemotePhotoRow, RemoteResult};
use crate::snapshot::PhotoSnapshot;
use chrono::{DateTime, Duration, Utc};
use cloud_auth::Session;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Bucket path for an upload: content addressed inside the owner's folder
pub fn object_path(user_id: Uuid, bytes: &[u8]) -> String {
    format!("{}/{:x}", user_id, Sha256::digest(bytes))
}

/// A listing that was never fetched; stale at any `now`
fn unfetched() -> Cached<PhotoSnapshot> {
    Cached::new(PhotoSnapshot::empty(), DateTime::<Utc>::MIN_UTC)
}

fn ids_of(items: &[PhotoItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

/// Attaches signed URLs to `rows`, dropping rows that could not be signed
pub(crate) async fn sign_rows(
    backend: &dyn RemoteBackend,
    session: Option<&Session>,
    rows: Vec<RemotePhotoRow>,
    ttl: Duration,
) -> RemoteResult<Vec<PhotoItem>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let paths: Vec<String> = rows.iter().map(|row| row.uri.clone()).collect();
    let signed: HashMap<String, Result<String, String>> = backend
        .create_signed_urls(session, &paths, ttl)
        .await?
        .into_iter()
        .map(|entry| (entry.path, entry.result))
        .collect();

    let items = rows
        .into_iter()
        .filter_map(|row| match signed.get(&row.uri) {
            Some(Ok(url)) => Some(PhotoItem {
                id: row.id,
                uri: url.clone(),
                date_taken: row.date_taken,
            }),
            Some(Err(e)) => {
                log::warn!("Leaving out photo {}: could not sign {}: {}", row.id, row.uri, e);
                None
            }
            None => {
                log::warn!("Leaving out photo {}: no signed URL returned for {}", row.id, row.uri);
                None
            }
        })
        .collect();

    Ok(items)
}

/// All photos of the signed-in user
#[derive(Clone)]
pub struct OnlinePhotoStore {
    backend: Arc<dyn RemoteBackend>,
    fs: Arc<dyn FileSystem>,
    session: Option<Session>,
    ttl: Duration,
    photos: Cached<PhotoSnapshot>,
}

impl OnlinePhotoStore {
    pub fn new(
        backend: Arc<dyn RemoteBackend>,
        fs: Arc<dyn FileSystem>,
        session: Option<Session>,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            fs,
            session,
            ttl,
            photos: unfetched(),
        }
    }

    pub fn photos(&self) -> &PhotoSnapshot {
        &self.photos.data
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.photos.fetched_at
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub async fn refresh(&self) -> Self {
        self.refresh_at(Utc::now()).await
    }

    /// Re-fetches the listing and stamps it with `now`
    ///
    /// Without a session, or when listing or batch signing fails, the prior
    /// snapshot is kept.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Self {
        let Some(session) = &self.session else {
            log::debug!("OnlinePhotoStore.refresh skipped: no session");
            return self.clone();
        };

        let rows = match self.backend.list_photos(session, None).await {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("OnlinePhotoStore.refresh could not list photos: {}", e);
                return self.clone();
            }
        };

        match sign_rows(self.backend.as_ref(), Some(session), rows, self.ttl).await {
            Ok(items) => Self {
                photos: Cached::new(PhotoSnapshot::from_items(items), now),
                ..self.clone()
            },
            Err(e) => {
                log::error!("OnlinePhotoStore.refresh could not sign URLs: {}", e);
                self.clone()
            }
        }
    }

    /// Reuses the listing while it is younger than the TTL
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> Self {
        if self.photos.is_fresh(now, self.ttl) {
            log::debug!("OnlinePhotoStore listing still fresh, reusing it");
            return self.clone();
        }
        self.refresh_at(now).await
    }

    /// Uploads each file, then records the uploaded ones in one insert
    pub async fn add_new_photos(&self, photos: &[PhotoToAdd]) -> StoreResult<Self> {
        let session = self.session.as_ref().ok_or(StoreError::NoSession)?;
        let user_id = session.user_id();

        let mut rows = Vec::with_capacity(photos.len());
        for photo in photos {
            let bytes = match self.fs.read(&uri_to_path(&photo.origin_uri)).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Could not read photo {}: {}", photo.origin_uri, e);
                    continue;
                }
            };

            let path = object_path(user_id, &bytes);
            let content_type = content_type_for(&photo.origin_uri);
            match self
                .backend
                .upload_object(session, &path, bytes, content_type)
                .await
            {
                Ok(stored) => rows.push(NewRemotePhoto {
                    user_id,
                    uri: stored,
                    date_taken: photo.date_taken,
                }),
                Err(e) => log::warn!("Could not upload photo {}: {}", photo.origin_uri, e),
            }
        }

        if rows.is_empty() {
            log::info!("No photos uploaded");
        } else if let Err(e) = self.backend.insert_photos(session, &rows).await {
            log::error!("Could not record {} uploaded photos: {}", rows.len(), e);
        } else {
            log::info!("Uploaded {} of {} photos", rows.len(), photos.len());
        }

        Ok(self.refresh().await)
    }

    /// Deletes the rows in one request, then their bucket objects
    pub async fn delete_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let session = self.session.as_ref().ok_or(StoreError::NoSession)?;
        let ids = ids_of(items);
        if ids.is_empty() {
            return Ok(self.clone());
        }

        match self.backend.delete_photos(session, &ids).await {
            Ok(paths) if paths.is_empty() => {}
            Ok(paths) => {
                if let Err(e) = self.backend.remove_objects(session, &paths).await {
                    log::warn!(
                        "Deleted {} photo rows but could not remove their objects: {}",
                        paths.len(),
                        e
                    );
                }
            }
            Err(e) => log::error!("Could not delete selected photos: {}", e),
        }

        Ok(self.refresh().await)
    }
}

/// Photos of one cloud album owned by the signed-in user
#[derive(Clone)]
pub struct OnlineAlbumPhotoStore {
    album: Album,
    backend: Arc<dyn RemoteBackend>,
    session: Option<Session>,
    ttl: Duration,
    photos: Cached<PhotoSnapshot>,
}

impl OnlineAlbumPhotoStore {
    pub fn new(
        album: Album,
        backend: Arc<dyn RemoteBackend>,
        session: Option<Session>,
        ttl: Duration,
    ) -> Self {
        Self {
            album,
            backend,
            session,
            ttl,
            photos: unfetched(),
        }
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn photos(&self) -> &PhotoSnapshot {
        &self.photos.data
    }

    pub async fn refresh(&self) -> Self {
        self.refresh_at(Utc::now()).await
    }

    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Self {
        let Some(session) = &self.session else {
            log::debug!("OnlineAlbumPhotoStore.refresh skipped: no session");
            return self.clone();
        };

        let listed = match self.backend.list_photos(session, Some(self.album.id)).await {
            Ok(rows) => sign_rows(self.backend.as_ref(), Some(session), rows, self.ttl).await,
            Err(e) => Err(e),
        };

        match listed {
            Ok(items) => Self {
                photos: Cached::new(PhotoSnapshot::from_items(items), now),
                ..self.clone()
            },
            Err(e) => {
                log::error!(
                    "OnlineAlbumPhotoStore.refresh failed for album {}: {}",
                    self.album.id,
                    e
                );
                self.clone()
            }
        }
    }

    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> Self {
        if self.photos.is_fresh(now, self.ttl) {
            return self.clone();
        }
        self.refresh_at(now).await
    }

    pub async fn add_existing_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let session = self.session.as_ref().ok_or(StoreError::NoSession)?;
        let ids = ids_of(items);
        if !ids.is_empty() {
            if let Err(e) = self
                .backend
                .insert_album_photos(session, self.album.id, &ids)
                .await
            {
                log::error!("Could not add photos to album {}: {}", self.album.id, e);
            }
        }
        Ok(self.refresh().await)
    }

    /// Removes the photos from this album only
    pub async fn remove_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let session = self.session.as_ref().ok_or(StoreError::NoSession)?;
        let ids = ids_of(items);
        if !ids.is_empty() {
            if let Err(e) = self
                .backend
                .delete_album_photos(session, self.album.id, &ids)
                .await
            {
                log::error!("Could not remove photos from album {}: {}", self.album.id, e);
            }
        }
        Ok(self.refresh().await)
    }
}

/// A shared album opened through its access key
///
/// Readable without a session. Visits are only written to the viewer's
/// profile when the store was opened with `remember_visits`.
#[derive(Clone)]
pub struct PublicAlbumPhotoStore {
    access_key: String,
    album_name: String,
    backend: Arc<dyn RemoteBackend>,
    session: Option<Session>,
    ttl: Duration,
    remember_visits: bool,
    photos: Cached<PhotoSnapshot>,
}

/// Resolves the album behind `access_key` and returns an unloaded store
pub async fn open_public_album(
    backend: Arc<dyn RemoteBackend>,
    session: Option<Session>,
    access_key: &str,
    ttl: Duration,
    remember_visits: bool,
) -> StoreResult<PublicAlbumPhotoStore> {
    let album_name = backend
        .album_name_by_access_key(session.as_ref(), access_key)
        .await
        .map_err(|e| {
            log::warn!("Could not resolve album for access key: {}", e);
            StoreError::AlbumNotResolved(e.to_string())
        })?;

    Ok(PublicAlbumPhotoStore {
        access_key: access_key.to_string(),
        album_name,
        backend,
        session,
        ttl,
        remember_visits,
        photos: unfetched(),
    })
}

impl PublicAlbumPhotoStore {
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    pub fn photos(&self) -> &PhotoSnapshot {
        &self.photos.data
    }

    /// Records this album's key on the viewer's profile
    pub async fn remember_access_key(&self, session: &Session) -> RemoteResult<()> {
        self.backend
            .record_access_key(session, &self.access_key)
            .await
    }

    pub async fn refresh(&self) -> Self {
        self.refresh_at(Utc::now()).await
    }

    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Self {
        let session = self.session.as_ref();
        let listed = match self
            .backend
            .photos_by_access_key(session, &self.access_key)
            .await
        {
            Ok(rows) => {
                if let (true, Some(session)) = (self.remember_visits, session) {
                    if let Err(e) = self.remember_access_key(session).await {
                        log::warn!("Could not remember public album visit: {}", e);
                    }
                }
                sign_rows(self.backend.as_ref(), session, rows, self.ttl).await
            }
            Err(e) => Err(e),
        };

        match listed {
            Ok(items) => Self {
                photos: Cached::new(PhotoSnapshot::from_items(items), now),
                ..self.clone()
            },
            Err(e) => {
                log::error!(
                    "PublicAlbumPhotoStore.refresh failed for {}: {}",
                    self.album_name,
                    e
                );
                self.clone()
            }
        }
    }

    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> Self {
        if self.photos.is_fresh(now, self.ttl) {
            return self.clone();
        }
        self.refresh_at(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::filesystem::TokioFileSystem;
    use crate::testing::{day, session, signed, FakeBackend};
    use std::path::Path;

    fn store(backend: &Arc<FakeBackend>, session: Option<Session>) -> OnlinePhotoStore {
        OnlinePhotoStore::new(
            backend.clone(),
            Arc::new(TokioFileSystem),
            session,
            DEFAULT_TTL,
        )
    }

    fn source_file(dir: &Path, name: &str, date_taken: DateTime<Utc>) -> PhotoToAdd {
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        PhotoToAdd {
            origin_uri: path.display().to_string(),
            date_taken,
        }
    }

    fn album(id: i64) -> Album {
        Album {
            id,
            name: "Trip".to_string(),
            photo_quantity: 0,
            online_status: Some(crate::models::OnlineStatus::Private),
            access_key: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_signs_in_one_batch() {
        let backend = Arc::new(FakeBackend::new());
        let first = backend.add_photo("u/a", day(1));
        let second = backend.add_photo("u/b", day(3));
        let third = backend.add_photo("u/c", day(2));

        let refreshed = store(&backend, Some(session())).refresh().await;

        assert_eq!(refreshed.photos().ids(), vec![second, third, first]);
        assert_eq!(refreshed.photos().get_by_index(0).unwrap().uri, signed("u/b"));
        assert_eq!(backend.with(|s| s.sign_requests), 1);
    }

    #[tokio::test]
    async fn test_unsignable_item_is_left_out() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let broken = backend.add_photo("u/b", day(2));
        backend.add_photo("u/c", day(3));
        backend.with(|s| s.unsignable.insert("u/b".to_string()));

        let refreshed = store(&backend, Some(session())).refresh().await;

        assert_eq!(refreshed.photos().len(), 2);
        assert!(refreshed.photos().get_by_id(broken).is_none());
        assert!(refreshed.photos().items().iter().all(|p| !p.uri.is_empty()));
    }

    #[tokio::test]
    async fn test_failed_signing_keeps_prior_snapshot() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let loaded = store(&backend, Some(session())).refresh().await;
        assert_eq!(loaded.photos().len(), 1);

        backend.add_photo("u/b", day(2));
        backend.with(|s| s.fail_signing = true);
        let refreshed = loaded.refresh().await;

        assert_eq!(refreshed.photos().ids(), loaded.photos().ids());
        assert_eq!(refreshed.fetched_at(), loaded.fetched_at());
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_prior_snapshot() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let loaded = store(&backend, Some(session())).refresh().await;

        backend.with(|s| s.fail_listing = true);
        assert_eq!(loaded.refresh().await.photos().len(), 1);
    }

    #[tokio::test]
    async fn test_without_session() {
        let sources = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));

        let anonymous = store(&backend, None).refresh().await;
        assert!(anonymous.photos().is_empty());
        assert_eq!(backend.with(|s| s.sign_requests), 0);

        let result = anonymous
            .add_new_photos(&[source_file(sources.path(), "x.jpg", day(2))])
            .await;
        assert!(matches!(result, Err(StoreError::NoSession)));
        assert!(anonymous.photos().is_empty());
        assert_eq!(backend.with(|s| s.photos.len()), 1);

        let result = anonymous.delete_photos(&[]).await;
        assert!(matches!(result, Err(StoreError::NoSession)));
    }

    #[tokio::test]
    async fn test_add_skips_failed_uploads() {
        let sources = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let viewer = session();

        let files = vec![
            source_file(sources.path(), "a.jpg", day(1)),
            source_file(sources.path(), "b.png", day(2)),
            source_file(sources.path(), "c.jpg", day(3)),
        ];
        let rejected = object_path(viewer.user_id(), b"b.png");
        backend.with(|s| s.failing_uploads.insert(rejected.clone()));

        let updated = store(&backend, Some(viewer.clone()))
            .add_new_photos(&files)
            .await
            .unwrap();

        assert_eq!(updated.photos().len(), 2);
        let stored: Vec<String> = backend.with(|s| s.photos.iter().map(|p| p.uri.clone()).collect());
        assert!(stored.contains(&object_path(viewer.user_id(), b"a.jpg")));
        assert!(!stored.contains(&rejected));
        assert!(stored
            .iter()
            .all(|uri| uri.starts_with(&viewer.user_id().to_string())));
    }

    #[tokio::test]
    async fn test_add_skips_unreadable_files() {
        let sources = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let missing = PhotoToAdd {
            origin_uri: sources.path().join("gone.jpg").display().to_string(),
            date_taken: day(1),
        };
        let present = source_file(sources.path(), "here.jpg", day(2));

        let updated = store(&backend, Some(session()))
            .add_new_photos(&[missing, present])
            .await
            .unwrap();
        assert_eq!(updated.photos().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_rows_and_objects() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let doomed = backend.add_photo("u/b", day(2));
        let loaded = store(&backend, Some(session())).refresh().await;

        let item = loaded.photos().get_by_id(doomed).unwrap().photo_item;
        let updated = loaded.delete_photos(&[item]).await.unwrap();

        assert_eq!(updated.photos().len(), 1);
        assert!(!backend.with(|s| s.objects.contains_key("u/b")));
        assert!(backend.with(|s| s.objects.contains_key("u/a")));
    }

    #[tokio::test]
    async fn test_delete_survives_object_removal_failure() {
        let backend = Arc::new(FakeBackend::new());
        let doomed = backend.add_photo("u/a", day(1));
        backend.with(|s| s.fail_object_removal = true);
        let loaded = store(&backend, Some(session())).refresh().await;

        let item = loaded.photos().get_by_id(doomed).unwrap().photo_item;
        let updated = loaded.delete_photos(&[item]).await.unwrap();

        assert!(updated.photos().is_empty());
        assert!(backend.with(|s| s.objects.contains_key("u/a")));
    }

    #[tokio::test]
    async fn test_refresh_if_stale_honours_ttl() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let loaded = store(&backend, Some(session())).refresh_at(day(1)).await;
        assert_eq!(backend.with(|s| s.sign_requests), 1);

        backend.add_photo("u/b", day(2));
        let reused = loaded.refresh_if_stale(day(5)).await;
        assert_eq!(reused.photos().len(), 1);
        assert_eq!(backend.with(|s| s.sign_requests), 1);

        let refetched = loaded.refresh_if_stale(day(8)).await;
        assert_eq!(refetched.photos().len(), 2);
        assert_eq!(refetched.fetched_at(), day(8));
        assert_eq!(backend.with(|s| s.sign_requests), 2);
    }

    #[tokio::test]
    async fn test_unfetched_store_is_always_stale() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let refreshed = store(&backend, Some(session())).refresh_if_stale(day(1)).await;
        assert_eq!(refreshed.photos().len(), 1);
    }

    #[tokio::test]
    async fn test_album_removal_is_scoped_to_album() {
        let backend = Arc::new(FakeBackend::new());
        let shared = backend.add_photo("u/a", day(1));
        let other = backend.add_photo("u/b", day(2));
        let trip = backend.add_album("Trip", false, None);
        let family = backend.add_album("Family", false, None);
        backend.link(family, shared);

        let trip_store =
            OnlineAlbumPhotoStore::new(album(trip), backend.clone(), Some(session()), DEFAULT_TTL);
        let all = store(&backend, Some(session())).refresh().await;

        let trip_store = trip_store
            .add_existing_photos(all.photos().items())
            .await
            .unwrap();
        assert_eq!(trip_store.photos().ids(), vec![other, shared]);

        let to_remove = vec![trip_store.photos().get_by_id(shared).unwrap().photo_item];
        let trip_store = trip_store.remove_photos(&to_remove).await.unwrap();
        assert_eq!(trip_store.photos().ids(), vec![other]);

        let family_store =
            OnlineAlbumPhotoStore::new(album(family), backend.clone(), Some(session()), DEFAULT_TTL)
                .refresh()
                .await;
        assert_eq!(family_store.photos().ids(), vec![shared]);
    }

    #[tokio::test]
    async fn test_album_store_requires_session() {
        let backend = Arc::new(FakeBackend::new());
        let trip = OnlineAlbumPhotoStore::new(album(1), backend, None, DEFAULT_TTL);
        assert!(matches!(
            trip.add_existing_photos(&[]).await,
            Err(StoreError::NoSession)
        ));
        assert!(matches!(
            trip.remove_photos(&[]).await,
            Err(StoreError::NoSession)
        ));
    }

    #[tokio::test]
    async fn test_open_public_album_anonymously() {
        let backend = Arc::new(FakeBackend::new());
        let photo = backend.add_photo("owner/a", day(1));
        let shared = backend.add_album("Wedding", true, Some("k3y"));
        backend.link(shared, photo);

        let public = open_public_album(backend.clone(), None, "k3y", DEFAULT_TTL, false)
            .await
            .unwrap()
            .refresh()
            .await;

        assert_eq!(public.album_name(), "Wedding");
        assert_eq!(public.photos().ids(), vec![photo]);
        assert!(backend.with(|s| s.recorded_access_keys.is_empty()));
    }

    #[tokio::test]
    async fn test_open_public_album_unknown_key() {
        let backend = Arc::new(FakeBackend::new());
        let result = open_public_album(backend, None, "nope", DEFAULT_TTL, false).await;
        assert!(matches!(result, Err(StoreError::AlbumNotResolved(_))));
    }

    #[tokio::test]
    async fn test_public_visits_recorded_only_when_opted_in() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_album("Wedding", true, Some("k3y"));
        let viewer = session();

        open_public_album(backend.clone(), Some(viewer.clone()), "k3y", DEFAULT_TTL, false)
            .await
            .unwrap()
            .refresh()
            .await;
        assert!(backend.with(|s| s.recorded_access_keys.is_empty()));

        open_public_album(backend.clone(), Some(viewer.clone()), "k3y", DEFAULT_TTL, true)
            .await
            .unwrap()
            .refresh()
            .await;
        assert_eq!(
            backend.with(|s| s.recorded_access_keys.clone()),
            vec![(viewer.user_id(), "k3y".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_visit_recording_keeps_photos() {
        let backend = Arc::new(FakeBackend::new());
        let photo = backend.add_photo("owner/a", day(1));
        let shared = backend.add_album("Wedding", true, Some("k3y"));
        backend.link(shared, photo);
        backend.with(|s| s.fail_record_access_key = true);

        let public = open_public_album(backend, Some(session()), "k3y", DEFAULT_TTL, true)
            .await
            .unwrap()
            .refresh()
            .await;
        assert_eq!(public.photos().ids(), vec![photo]);
    }

    #[tokio::test]
    async fn test_failed_public_listing_records_no_visit() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_album("Wedding", true, Some("k3y"));
        let public = open_public_album(backend.clone(), Some(session()), "k3y", DEFAULT_TTL, true)
            .await
            .unwrap();

        backend.with(|s| s.fail_listing = true);
        let public = public.refresh().await;
        assert!(public.photos().is_empty());
        assert!(backend.with(|s| s.recorded_access_keys.is_empty()));

        backend.with(|s| s.fail_listing = false);
        public.refresh().await;
        assert_eq!(backend.with(|s| s.recorded_access_keys.len()), 1);
    }

    #[test]
    fn test_object_path_is_content_addressed() {
        let user = Uuid::nil();
        let path = object_path(user, b"abc");
        assert_eq!(
            path,
            "00000000-0000-0000-0000-000000000000/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(object_path(user, b"abc"), path);
        assert_ne!(object_path(user, b"abd"), path);
    }
}
