//! Stores backed by the on-device SQLite database.

use crate::database::Database;
use crate::error::StoreResult;
use crate::filesystem::{random_filename, remove_quietly, unused_path, uri_to_path, FileSystem};
use crate::models::{Album, PhotoItem, PhotoToAdd};
use crate::snapshot::PhotoSnapshot;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};
use std::path::PathBuf;
use std::sync::Arc;

const SELECT_ALL_PHOTOS: &str = "SELECT Photo.id, Photo.uri, Photo.date_taken
     FROM Photo
     ORDER BY Photo.date_taken DESC, Photo.id DESC";

const SELECT_ALBUM_PHOTOS: &str = "SELECT Photo.id, Photo.uri, Photo.date_taken
     FROM Photo
     INNER JOIN AlbumPhoto ON Photo.id = AlbumPhoto.photo_id
     WHERE AlbumPhoto.album_id = ?1
     ORDER BY Photo.date_taken DESC, Photo.id DESC";

/// `?, ?, …` with `n` placeholders, for `IN (…)` lists
pub(crate) fn sql_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn ids_of(items: &[PhotoItem]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

async fn load_photos(
    db: &Database,
    sql: &str,
    album_id: Option<i64>,
) -> rusqlite::Result<Vec<PhotoItem>> {
    let conn = db.lock().await;
    let mut stmt = conn.prepare(sql)?;
    let items = match album_id {
        Some(album_id) => stmt
            .query_map(params![album_id], |row| PhotoItem::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], |row| PhotoItem::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(items)
}

/// All photos managed on this device
#[derive(Clone)]
pub struct LocalPhotoStore {
    db: Database,
    fs: Arc<dyn FileSystem>,
    storage_dir: PathBuf,
    next_filename: fn() -> String,
    photos: PhotoSnapshot,
}

impl LocalPhotoStore {
    /// An unloaded store; call [`LocalPhotoStore::refresh`] to read photos
    pub fn new(db: Database, fs: Arc<dyn FileSystem>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            fs,
            storage_dir: storage_dir.into(),
            next_filename: random_filename,
            photos: PhotoSnapshot::empty(),
        }
    }

    /// Replaces the generator used for managed filenames
    pub fn with_filename_generator(self, next_filename: fn() -> String) -> Self {
        Self {
            next_filename,
            ..self
        }
    }

    pub fn photos(&self) -> &PhotoSnapshot {
        &self.photos
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn refresh(&self) -> Self {
        let photos = match load_photos(&self.db, SELECT_ALL_PHOTOS, None).await {
            Ok(items) => PhotoSnapshot::from_items(items),
            Err(e) => {
                log::error!("LocalPhotoStore.refresh failed: {}", e);
                PhotoSnapshot::empty()
            }
        };

        Self {
            photos,
            ..self.clone()
        }
    }

    /// Copies each source into managed storage and records it
    ///
    /// Sources that cannot be copied are skipped. All rows for the copied
    /// files are inserted in one exclusive transaction.
    pub async fn add_new_photos(&self, photos: &[PhotoToAdd]) -> StoreResult<Self> {
        let mut copied: Vec<(PathBuf, DateTime<Utc>)> = Vec::with_capacity(photos.len());

        for photo in photos {
            let source = uri_to_path(&photo.origin_uri);
            let target = match unused_path(self.fs.as_ref(), &self.storage_dir, self.next_filename).await
            {
                Ok(target) => target,
                Err(e) => {
                    log::warn!("Could not check managed storage for {}: {}", photo.origin_uri, e);
                    continue;
                }
            };

            if let Err(e) = self.fs.copy(&source, &target).await {
                log::warn!(
                    "Could not copy photo {} to {}: {}",
                    photo.origin_uri,
                    target.display(),
                    e
                );
                continue;
            }

            log::debug!("Copied {} -> {}", photo.origin_uri, target.display());
            copied.push((target, photo.date_taken));
        }

        if copied.is_empty() {
            log::info!("No photos to insert");
            return Ok(self.refresh().await);
        }

        let inserted = self
            .db
            .with_exclusive_transaction(|tx| {
                let mut stmt = tx.prepare("INSERT INTO Photo (uri, date_taken) VALUES (?1, ?2)")?;
                for (path, date_taken) in &copied {
                    stmt.execute(params![path.to_string_lossy(), date_taken])?;
                }
                Ok(copied.len())
            })
            .await;

        match inserted {
            Ok(count) => log::info!("Added {} of {} photos", count, photos.len()),
            Err(e) => {
                log::error!("Could not store copied photos in database: {}", e);
                for (path, _) in &copied {
                    remove_quietly(self.fs.as_ref(), path).await;
                }
            }
        }

        Ok(self.refresh().await)
    }

    /// Removes the rows, then the files
    ///
    /// A file that cannot be deleted is logged; its row stays deleted.
    pub async fn delete_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let ids = ids_of(items);
        if ids.is_empty() {
            return Ok(self.clone());
        }

        let placeholders = sql_placeholders(ids.len());
        let deleted = self
            .db
            .with_exclusive_transaction(|tx| {
                let mut stmt = tx.prepare(&format!(
                    "SELECT id, uri FROM Photo WHERE id IN ({})",
                    placeholders
                ))?;
                let files = stmt
                    .query_map(params_from_iter(ids.iter()), |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                tx.execute(
                    &format!("DELETE FROM Photo WHERE id IN ({})", placeholders),
                    params_from_iter(ids.iter()),
                )?;
                Ok(files)
            })
            .await;

        match deleted {
            Ok(files) => {
                for (id, uri) in files {
                    if !remove_quietly(self.fs.as_ref(), &uri_to_path(&uri)).await {
                        log::warn!(
                            "Removed photo {} from database but could not delete its file ({})",
                            id,
                            uri
                        );
                    }
                }
            }
            Err(e) => log::error!("Could not delete selected photos from database: {}", e),
        }

        Ok(self.refresh().await)
    }
}

/// Photos of one device-local album
#[derive(Clone)]
pub struct LocalAlbumPhotoStore {
    album: Album,
    db: Database,
    photos: PhotoSnapshot,
}

impl LocalAlbumPhotoStore {
    pub fn new(album: Album, db: Database) -> Self {
        Self {
            album,
            db,
            photos: PhotoSnapshot::empty(),
        }
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn photos(&self) -> &PhotoSnapshot {
        &self.photos
    }

    pub async fn refresh(&self) -> Self {
        let photos = match load_photos(&self.db, SELECT_ALBUM_PHOTOS, Some(self.album.id)).await {
            Ok(items) => PhotoSnapshot::from_items(items),
            Err(e) => {
                log::error!(
                    "LocalAlbumPhotoStore.refresh failed for album {}: {}",
                    self.album.id,
                    e
                );
                PhotoSnapshot::empty()
            }
        };

        Self {
            photos,
            ..self.clone()
        }
    }

    /// Adds already stored photos to the album; files are not touched
    pub async fn add_existing_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let album_id = self.album.id;
        let result = self
            .db
            .with_exclusive_transaction(|tx| {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO AlbumPhoto (photo_id, album_id) VALUES (?1, ?2)",
                )?;
                let mut added = 0;
                for item in items {
                    added += stmt.execute(params![item.id, album_id])?;
                }
                Ok(added)
            })
            .await;

        match result {
            Ok(added) => log::info!("Added {} photos to album {}", added, album_id),
            Err(e) => log::error!("Could not add photos to album {}: {}", album_id, e),
        }

        Ok(self.refresh().await)
    }

    /// Removes album membership only; the photos themselves stay
    pub async fn remove_photos(&self, items: &[PhotoItem]) -> StoreResult<Self> {
        let mut bind = ids_of(items);
        if bind.is_empty() {
            return Ok(self.clone());
        }

        let sql = format!(
            "DELETE FROM AlbumPhoto WHERE photo_id IN ({}) AND album_id = ?",
            sql_placeholders(bind.len())
        );
        bind.push(self.album.id);

        let result = self
            .db
            .with_exclusive_transaction(|tx| tx.execute(&sql, params_from_iter(bind.iter())))
            .await;

        if let Err(e) = result {
            log::error!(
                "Could not remove selected photos from album {}: {}",
                self.album.id,
                e
            );
        }

        Ok(self.refresh().await)
    }
}
