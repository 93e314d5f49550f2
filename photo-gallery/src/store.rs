use crate::error::{StoreError, StoreResult};
use crate::local::{LocalAlbumPhotoStore, LocalPhotoStore};
use crate::models::{PhotoItem, PhotoItemResult, PhotoToAdd};
use crate::online::{OnlineAlbumPhotoStore, OnlinePhotoStore, PublicAlbumPhotoStore};
use crate::snapshot::PhotoSnapshot;
use chrono::{DateTime, Utc};

/// What to add to a store
///
/// Photo scopes take new files; album scopes take photos that are already
/// stored.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoSource {
    Files(Vec<PhotoToAdd>),
    Existing(Vec<PhotoItem>),
}

/// The photo list currently in view, one variant per scope
///
/// Every operation returns a new value; a store that has been handed out
/// is never modified.
#[derive(Clone, Default)]
pub enum PhotoStore {
    #[default]
    Empty,
    Local(LocalPhotoStore),
    Online(OnlinePhotoStore),
    LocalAlbum(LocalAlbumPhotoStore),
    OnlineAlbum(OnlineAlbumPhotoStore),
    Public(PublicAlbumPhotoStore),
}

impl PhotoStore {
    /// Short name used in logs and read-only errors
    pub fn kind(&self) -> &'static str {
        match self {
            PhotoStore::Empty => "Empty store",
            PhotoStore::Local(_) => "Local store",
            PhotoStore::Online(_) => "Online store",
            PhotoStore::LocalAlbum(_) => "Local album store",
            PhotoStore::OnlineAlbum(_) => "Online album store",
            PhotoStore::Public(_) => "Public album store",
        }
    }

    pub fn snapshot(&self) -> Option<&PhotoSnapshot> {
        match self {
            PhotoStore::Empty => None,
            PhotoStore::Local(store) => Some(store.photos()),
            PhotoStore::Online(store) => Some(store.photos()),
            PhotoStore::LocalAlbum(store) => Some(store.photos()),
            PhotoStore::OnlineAlbum(store) => Some(store.photos()),
            PhotoStore::Public(store) => Some(store.photos()),
        }
    }

    pub fn photo_items(&self) -> &[PhotoItem] {
        self.snapshot().map(PhotoSnapshot::items).unwrap_or(&[])
    }

    pub fn get_by_id(&self, id: i64) -> Option<PhotoItemResult> {
        self.snapshot()?.get_by_id(id)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&PhotoItem> {
        self.snapshot()?.get_by_index(index)
    }

    pub fn previous(&self, index: usize) -> Option<PhotoItemResult> {
        self.snapshot()?.previous(index)
    }

    pub fn next(&self, index: usize) -> Option<PhotoItemResult> {
        self.snapshot()?.next(index)
    }

    pub async fn refresh(&self) -> PhotoStore {
        match self {
            PhotoStore::Empty => PhotoStore::Empty,
            PhotoStore::Local(store) => PhotoStore::Local(store.refresh().await),
            PhotoStore::Online(store) => PhotoStore::Online(store.refresh().await),
            PhotoStore::LocalAlbum(store) => PhotoStore::LocalAlbum(store.refresh().await),
            PhotoStore::OnlineAlbum(store) => PhotoStore::OnlineAlbum(store.refresh().await),
            PhotoStore::Public(store) => PhotoStore::Public(store.refresh().await),
        }
    }

    /// Like [`PhotoStore::refresh`], but cloud scopes reuse a fresh listing
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> PhotoStore {
        match self {
            PhotoStore::Online(store) => PhotoStore::Online(store.refresh_if_stale(now).await),
            PhotoStore::OnlineAlbum(store) => {
                PhotoStore::OnlineAlbum(store.refresh_if_stale(now).await)
            }
            PhotoStore::Public(store) => PhotoStore::Public(store.refresh_if_stale(now).await),
            _ => self.refresh().await,
        }
    }

    pub async fn add_new_photos(&self, source: PhotoSource) -> StoreResult<PhotoStore> {
        match (self, source) {
            (PhotoStore::Empty, _) | (PhotoStore::Public(_), _) => {
                Err(StoreError::ReadOnly(self.kind()))
            }
            (PhotoStore::Local(store), PhotoSource::Files(files)) => {
                Ok(PhotoStore::Local(store.add_new_photos(&files).await?))
            }
            (PhotoStore::Online(store), PhotoSource::Files(files)) => {
                Ok(PhotoStore::Online(store.add_new_photos(&files).await?))
            }
            (PhotoStore::LocalAlbum(store), PhotoSource::Existing(items)) => Ok(
                PhotoStore::LocalAlbum(store.add_existing_photos(&items).await?),
            ),
            (PhotoStore::OnlineAlbum(store), PhotoSource::Existing(items)) => Ok(
                PhotoStore::OnlineAlbum(store.add_existing_photos(&items).await?),
            ),
            (PhotoStore::Local(_), _) | (PhotoStore::Online(_), _) => Err(
                StoreError::WrongSource("photo stores only accept new files"),
            ),
            (PhotoStore::LocalAlbum(_), _) | (PhotoStore::OnlineAlbum(_), _) => Err(
                StoreError::WrongSource("album stores only accept stored photos"),
            ),
        }
    }

    /// Deletes photos from a photo scope, or removes them from an album scope
    pub async fn delete_photos(&self, items: &[PhotoItem]) -> StoreResult<PhotoStore> {
        match self {
            PhotoStore::Empty | PhotoStore::Public(_) => Err(StoreError::ReadOnly(self.kind())),
            PhotoStore::Local(store) => Ok(PhotoStore::Local(store.delete_photos(items).await?)),
            PhotoStore::Online(store) => Ok(PhotoStore::Online(store.delete_photos(items).await?)),
            PhotoStore::LocalAlbum(store) => {
                Ok(PhotoStore::LocalAlbum(store.remove_photos(items).await?))
            }
            PhotoStore::OnlineAlbum(store) => {
                Ok(PhotoStore::OnlineAlbum(store.remove_photos(items).await?))
            }
        }
    }
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("kind", &self.kind())
            .field("photos", &self.photo_items().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::database::Database;
    use crate::filesystem::TokioFileSystem;
    use crate::models::Album;
    use crate::online::open_public_album;
    use crate::testing::{day, session, FakeBackend};
    use std::sync::Arc;

    fn album(id: i64) -> Album {
        Album {
            id,
            name: "Local".to_string(),
            photo_quantity: 0,
            online_status: None,
            access_key: None,
        }
    }

    async fn local_store(db: &Database) -> PhotoStore {
        {
            let conn = db.lock().await;
            for (id, date_taken) in [(3, day(2)), (1, day(2)), (2, day(1))] {
                conn.execute(
                    "INSERT INTO Photo (id, uri, date_taken) VALUES (?1, ?2, ?3)",
                    rusqlite::params![id, format!("/p/{}", id), date_taken],
                )
                .unwrap();
            }
        }
        PhotoStore::Local(LocalPhotoStore::new(
            db.clone(),
            Arc::new(TokioFileSystem),
            "/unused",
        ))
        .refresh()
        .await
    }

    #[tokio::test]
    async fn test_lookups_and_navigation() {
        let db = Database::open_in_memory().unwrap();
        let store = local_store(&db).await;

        assert_eq!(store.kind(), "Local store");
        assert_eq!(
            store.photo_items().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
        assert_eq!(store.get_by_id(1).unwrap().index, 1);
        assert_eq!(store.get_by_index(2).unwrap().id, 2);
        assert!(store.get_by_index(3).is_none());
        assert_eq!(store.next(0).unwrap().photo_item.id, 1);
        assert!(store.previous(0).is_none());
        assert!(store.next(2).is_none());
    }

    #[tokio::test]
    async fn test_held_store_is_not_affected_by_refresh() {
        let db = Database::open_in_memory().unwrap();
        let store = local_store(&db).await;
        {
            let conn = db.lock().await;
            conn.execute("DELETE FROM Photo WHERE id = 1", []).unwrap();
        }

        let refreshed = store.refresh().await;
        assert_eq!(refreshed.photo_items().len(), 2);
        assert_eq!(store.photo_items().len(), 3);
        assert_eq!(store.get_by_id(1).unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = PhotoStore::default();
        assert!(store.photo_items().is_empty());
        assert!(store.get_by_id(1).is_none());
        assert!(matches!(store.refresh().await, PhotoStore::Empty));
        assert!(matches!(
            store.delete_photos(&[]).await,
            Err(StoreError::ReadOnly(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_source_kind() {
        let db = Database::open_in_memory().unwrap();
        let store = local_store(&db).await;
        let existing = store.photo_items().to_vec();

        let result = store.add_new_photos(PhotoSource::Existing(existing)).await;
        assert!(matches!(result, Err(StoreError::WrongSource(_))));

        let album_store = PhotoStore::LocalAlbum(LocalAlbumPhotoStore::new(album(1), db));
        let result = album_store.add_new_photos(PhotoSource::Files(vec![])).await;
        assert!(matches!(result, Err(StoreError::WrongSource(_))));
    }

    #[tokio::test]
    async fn test_local_album_through_dispatch() {
        let db = Database::open_in_memory().unwrap();
        let store = local_store(&db).await;
        {
            let conn = db.lock().await;
            conn.execute("INSERT INTO Album (id, name) VALUES (1, 'Local')", [])
                .unwrap();
        }

        let album_store = PhotoStore::LocalAlbum(LocalAlbumPhotoStore::new(album(1), db.clone()))
            .add_new_photos(PhotoSource::Existing(store.photo_items()[..2].to_vec()))
            .await
            .unwrap();
        assert_eq!(album_store.photo_items().len(), 2);

        let first = album_store.photo_items()[..1].to_vec();
        let album_store = album_store.delete_photos(&first).await.unwrap();
        assert_eq!(album_store.photo_items().len(), 1);
        assert_eq!(store.refresh().await.photo_items().len(), 3);
    }

    #[tokio::test]
    async fn test_public_store_is_read_only() {
        let backend = Arc::new(FakeBackend::new());
        let photo = backend.add_photo("owner/a", day(1));
        let shared = backend.add_album("Wedding", true, Some("k3y"));
        backend.link(shared, photo);

        let public = open_public_album(backend.clone(), Some(session()), "k3y", DEFAULT_TTL, false)
            .await
            .unwrap();
        let store = PhotoStore::Public(public).refresh().await;
        assert_eq!(store.photo_items().len(), 1);

        let items = store.photo_items().to_vec();
        assert!(matches!(
            store.add_new_photos(PhotoSource::Existing(items.clone())).await,
            Err(StoreError::ReadOnly(_))
        ));
        assert!(matches!(
            store.delete_photos(&items).await,
            Err(StoreError::ReadOnly(_))
        ));
        assert_eq!(backend.with(|s| s.photos.len()), 1);
    }

    #[tokio::test]
    async fn test_online_refresh_if_stale_through_dispatch() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_photo("u/a", day(1));
        let store = PhotoStore::Online(OnlinePhotoStore::new(
            backend.clone(),
            Arc::new(TokioFileSystem),
            Some(session()),
            DEFAULT_TTL,
        ));

        let loaded = store.refresh_if_stale(day(1)).await;
        let reused = loaded.refresh_if_stale(day(2)).await;
        assert_eq!(reused.photo_items().len(), 1);
        assert_eq!(backend.with(|s| s.sign_requests), 1);
    }
}
