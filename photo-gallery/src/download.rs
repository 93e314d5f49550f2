//! On-device copies of cloud photos
//!
//! Signed URLs expire, so views that want to keep showing a photo (or show
//! it offline) can swap the URL for a cached file named after the photo id.

use crate::filesystem::{remove_quietly, FileSystem};
use crate::models::PhotoItem;
use crate::remote::RemoteBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache of downloaded photo files, one file per photo id
#[derive(Clone)]
pub struct PhotoCache {
    dir: PathBuf,
    backend: Arc<dyn RemoteBackend>,
    fs: Arc<dyn FileSystem>,
}

impl PhotoCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        backend: Arc<dyn RemoteBackend>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            dir: dir.into(),
            backend,
            fs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: i64) -> PathBuf {
        self.dir.join(id.to_string())
    }

    /// Points each item at its cached file, downloading missing ones
    ///
    /// Items whose download or write fails keep their remote URI.
    pub async fn localize(&self, items: &[PhotoItem]) -> Vec<PhotoItem> {
        let mut localized = Vec::with_capacity(items.len());
        let mut downloaded = 0;

        for item in items {
            let path = self.path_for(item.id);
            let local = PhotoItem {
                uri: path.to_string_lossy().into_owned(),
                ..item.clone()
            };

            match self.fs.exists(&path).await {
                Ok(true) => {
                    localized.push(local);
                    continue;
                }
                Ok(false) => {}
                Err(e) => log::warn!("Could not check cache for photo {}: {}", item.id, e),
            }

            let bytes = match self.backend.download(&item.uri).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Could not download photo {}: {}", item.id, e);
                    localized.push(item.clone());
                    continue;
                }
            };

            match self.fs.write(&path, &bytes).await {
                Ok(()) => {
                    downloaded += 1;
                    localized.push(local);
                }
                Err(e) => {
                    log::warn!("Could not cache photo {} at {}: {}", item.id, path.display(), e);
                    localized.push(item.clone());
                }
            }
        }

        if downloaded > 0 {
            log::info!("Downloaded {} photos into {}", downloaded, self.dir.display());
        }
        localized
    }

    /// Drops cached files, e.g. after the photos were deleted
    pub async fn evict(&self, ids: &[i64]) {
        for id in ids {
            let path = self.path_for(*id);
            if matches!(self.fs.exists(&path).await, Ok(true)) {
                remove_quietly(self.fs.as_ref(), &path).await;
            }
        }
    }

    pub async fn clear(&self) -> std::io::Result<()> {
        match self.fs.exists(&self.dir).await {
            Ok(true) => self.fs.remove_dir_all(&self.dir).await,
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
