use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{Album, OnlineStatus};
use crate::remote::{RemoteAlbumRow, RemoteBackend};
use cloud_auth::Session;
use rusqlite::params;
use std::sync::Arc;

/// Device-local and cloud albums, each sorted by name
///
/// The two lists are refreshed independently; a failure on one side leaves
/// the other (and its own prior list) untouched.
#[derive(Debug, Clone)]
pub struct AlbumStore {
    local_albums: Arc<[Album]>,
    online_albums: Arc<[Album]>,
}

impl Default for AlbumStore {
    fn default() -> Self {
        Self {
            local_albums: Arc::from(Vec::new()),
            online_albums: Arc::from(Vec::new()),
        }
    }
}

fn valid_name(name: &str) -> StoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation(
            "Album name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

fn sorted_by_name(mut albums: Vec<Album>) -> Arc<[Album]> {
    albums.sort_by(|a, b| a.name.cmp(&b.name));
    albums.into()
}

impl From<RemoteAlbumRow> for Album {
    fn from(row: RemoteAlbumRow) -> Self {
        Album {
            id: row.id,
            name: row.name,
            photo_quantity: row.photo_quantity,
            online_status: Some(OnlineStatus::from_is_public(row.is_public)),
            access_key: row.access_key,
        }
    }
}

async fn load_local_albums(db: &Database) -> rusqlite::Result<Vec<Album>> {
    let conn = db.lock().await;
    let mut stmt = conn.prepare(
        "SELECT Album.id, Album.name, COUNT(AlbumPhoto.photo_id)
         FROM Album
         LEFT JOIN AlbumPhoto ON Album.id = AlbumPhoto.album_id
         GROUP BY Album.id
         ORDER BY Album.name ASC",
    )?;
    let albums = stmt
        .query_map([], |row| {
            Ok(Album {
                id: row.get(0)?,
                name: row.get(1)?,
                photo_quantity: row.get(2)?,
                online_status: None,
                access_key: None,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(albums)
}

impl AlbumStore {
    pub fn local_albums(&self) -> &[Album] {
        &self.local_albums
    }

    pub fn online_albums(&self) -> &[Album] {
        &self.online_albums
    }

    /// Looks an album up by [`Album::ui_key`] across both lists
    pub fn find_by_ui_key(&self, ui_key: i64) -> Option<&Album> {
        self.local_albums
            .iter()
            .chain(self.online_albums.iter())
            .find(|album| album.ui_key() == ui_key)
    }

    pub async fn refresh_local(&self, db: &Database) -> Self {
        match load_local_albums(db).await {
            Ok(albums) => Self {
                local_albums: sorted_by_name(albums),
                online_albums: self.online_albums.clone(),
            },
            Err(e) => {
                log::error!("AlbumStore.refresh_local failed: {}", e);
                self.clone()
            }
        }
    }

    pub async fn refresh_online(&self, backend: &dyn RemoteBackend, session: &Session) -> Self {
        match backend.list_albums(session).await {
            Ok(rows) => Self {
                local_albums: self.local_albums.clone(),
                online_albums: sorted_by_name(rows.into_iter().map(Album::from).collect()),
            },
            Err(e) => {
                log::error!("AlbumStore.refresh_online failed: {}", e);
                self.clone()
            }
        }
    }

    /// Forgets the cloud albums, e.g. after signing out
    pub fn clear_online(&self) -> Self {
        Self {
            local_albums: self.local_albums.clone(),
            online_albums: Arc::from(Vec::new()),
        }
    }

    pub async fn create_local_album(&self, db: &Database, name: &str) -> StoreResult<Self> {
        let name = valid_name(name)?;
        let result = {
            let conn = db.lock().await;
            conn.execute("INSERT INTO Album (name) VALUES (?1)", params![name])
        };
        if let Err(e) = result {
            log::error!("Could not create local album {}: {}", name, e);
        }
        Ok(self.refresh_local(db).await)
    }

    pub async fn create_online_album(
        &self,
        backend: &dyn RemoteBackend,
        session: &Session,
        name: &str,
        status: OnlineStatus,
    ) -> StoreResult<Self> {
        let name = valid_name(name)?;
        if let Err(e) = backend
            .create_album(session, name, status.is_public())
            .await
        {
            log::error!("Could not create online album {}: {}", name, e);
        }
        Ok(self.refresh_online(backend, session).await)
    }

    /// Deletes the album; its photos stay, memberships cascade
    pub async fn delete_local_album(&self, db: &Database, album: &Album) -> StoreResult<Self> {
        let result = {
            let conn = db.lock().await;
            conn.execute("DELETE FROM Album WHERE id = ?1", params![album.id])
        };
        if let Err(e) = result {
            log::error!("Could not delete local album {}: {}", album.id, e);
        }
        Ok(self.refresh_local(db).await)
    }

    pub async fn delete_online_album(
        &self,
        backend: &dyn RemoteBackend,
        session: &Session,
        album: &Album,
    ) -> StoreResult<Self> {
        if let Err(e) = backend.delete_album(session, album.id).await {
            log::error!("Could not delete online album {}: {}", album.id, e);
        }
        Ok(self.refresh_online(backend, session).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, session, FakeBackend};

    #[tokio::test]
    async fn test_local_albums_sorted_with_counts() {
        let db = Database::open_in_memory().unwrap();
        let albums = AlbumStore::default();

        let albums = albums.create_local_album(&db, "  Zoo ").await.unwrap();
        let albums = albums.create_local_album(&db, "Alps").await.unwrap();
        {
            let conn = db.lock().await;
            conn.execute(
                "INSERT INTO Photo (id, uri, date_taken) VALUES (1, '/p/1', ?1)",
                params![day(1)],
            )
            .unwrap();
            let zoo: i64 = conn
                .query_row("SELECT id FROM Album WHERE name = 'Zoo'", [], |row| row.get(0))
                .unwrap();
            conn.execute(
                "INSERT INTO AlbumPhoto (photo_id, album_id) VALUES (1, ?1)",
                params![zoo],
            )
            .unwrap();
        }
        let albums = albums.refresh_local(&db).await;

        let names: Vec<&str> = albums.local_albums().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alps", "Zoo"]);
        assert_eq!(albums.local_albums()[0].photo_quantity, 0);
        assert_eq!(albums.local_albums()[1].photo_quantity, 1);
        assert!(albums.local_albums().iter().all(|a| !a.is_online()));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = AlbumStore::default().create_local_album(&db, "   ").await;
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let backend = FakeBackend::new();
        let result = AlbumStore::default()
            .create_online_album(&backend, &session(), "", OnlineStatus::Private)
            .await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(backend.with(|s| s.albums.is_empty()));
    }

    #[tokio::test]
    async fn test_delete_local_album_keeps_photos() {
        let db = Database::open_in_memory().unwrap();
        let albums = AlbumStore::default()
            .create_local_album(&db, "Trip")
            .await
            .unwrap();
        let trip = albums.local_albums()[0].clone();
        {
            let conn = db.lock().await;
            conn.execute(
                "INSERT INTO Photo (id, uri, date_taken) VALUES (1, '/p/1', ?1)",
                params![day(1)],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO AlbumPhoto (photo_id, album_id) VALUES (1, ?1)",
                params![trip.id],
            )
            .unwrap();
        }

        let albums = albums.delete_local_album(&db, &trip).await.unwrap();
        assert!(albums.local_albums().is_empty());

        let conn = db.lock().await;
        let photos: i64 = conn
            .query_row("SELECT COUNT(*) FROM Photo", [], |row| row.get(0))
            .unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM AlbumPhoto", [], |row| row.get(0))
            .unwrap();
        assert_eq!(photos, 1);
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn test_online_albums_lifecycle() {
        let backend = FakeBackend::new();
        let viewer = session();
        let photo = backend.add_photo("u/a", day(1));

        let albums = AlbumStore::default()
            .create_online_album(&backend, &viewer, "Shared", OnlineStatus::Public)
            .await
            .unwrap()
            .create_online_album(&backend, &viewer, " Private ", OnlineStatus::Private)
            .await
            .unwrap();

        let names: Vec<&str> = albums.online_albums().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Private", "Shared"]);
        let shared = albums.online_albums()[1].clone();
        assert_eq!(shared.online_status, Some(OnlineStatus::Public));
        assert!(shared.access_key.is_some());
        assert_eq!(albums.online_albums()[0].access_key, None);

        backend.link(shared.id, photo);
        let albums = albums.refresh_online(&backend, &viewer).await;
        assert_eq!(albums.online_albums()[1].photo_quantity, 1);
        assert_eq!(albums.find_by_ui_key(shared.ui_key()), Some(&albums.online_albums()[1]));

        let albums = albums
            .delete_online_album(&backend, &viewer, &shared)
            .await
            .unwrap();
        assert_eq!(albums.online_albums().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_online_refresh_keeps_both_lists() {
        let db = Database::open_in_memory().unwrap();
        let backend = FakeBackend::new();
        let viewer = session();
        backend.add_album("Shared", false, None);

        let albums = AlbumStore::default()
            .create_local_album(&db, "Local")
            .await
            .unwrap()
            .refresh_online(&backend, &viewer)
            .await;
        assert_eq!(albums.online_albums().len(), 1);

        backend.with(|s| s.fail_listing = true);
        let refreshed = albums.refresh_online(&backend, &viewer).await;
        assert_eq!(refreshed.online_albums().len(), 1);
        assert_eq!(refreshed.local_albums().len(), 1);

        let signed_out = refreshed.clear_online();
        assert!(signed_out.online_albums().is_empty());
        assert_eq!(signed_out.local_albums().len(), 1);
    }
}
