//! Wiring between configuration, the stores and the signed-in session.

use crate::config::GalleryConfig;
use crate::error::AppError;
use crate::picker::{MediaPicker, PickerError};
use crate::state::{GalleryState, SessionUpdate};
use cloud_auth::{AuthService, SessionChange, SessionProvider};
use photo_gallery::{
    open_public_album, Album, AlbumStore, Database, FileSystem, LocalAlbumPhotoStore,
    LocalPhotoStore, OnlineAlbumPhotoStore, OnlinePhotoStore, OnlineStatus, PhotoCache,
    PhotoGalleryConfig, PhotoItem, PhotoSource, PhotoStore, RemoteBackend, RestBackend,
    RestConfig, StoreError, TokioFileSystem,
};
use std::future::Future;
use std::sync::Arc;

pub struct Gallery {
    config: GalleryConfig,
    settings: PhotoGalleryConfig,
    db: Database,
    fs: Arc<dyn FileSystem>,
    backend: Option<Arc<dyn RemoteBackend>>,
    auth: Option<AuthService>,
    sessions: SessionProvider,
    cache: Option<PhotoCache>,
}

impl Gallery {
    /// Opens the database and, when configured, the cloud backend
    pub fn open(config: GalleryConfig) -> Result<Self, AppError> {
        let db = Database::open(&config.database_path)?;
        let fs: Arc<dyn FileSystem> = Arc::new(TokioFileSystem);

        let (backend, auth) = match &config.remote {
            Some(remote) => {
                let backend = RestBackend::new(RestConfig {
                    base_url: remote.base_url.clone(),
                    anon_key: remote.anon_key.clone(),
                    bucket: remote.bucket.clone(),
                })
                .map_err(|e| AppError::Store(StoreError::from(e)))?;
                let auth = AuthService::new(remote.base_url.clone(), remote.anon_key.clone())?;
                log::info!("Cloud backend: {}", remote.base_url);
                let backend: Arc<dyn RemoteBackend> = Arc::new(backend);
                (Some(backend), Some(auth))
            }
            None => {
                log::info!("No cloud backend configured, running offline");
                (None, None)
            }
        };

        Ok(Self::from_parts(
            config,
            db,
            fs,
            backend,
            auth,
            SessionProvider::default(),
        ))
    }

    pub fn from_parts(
        config: GalleryConfig,
        db: Database,
        fs: Arc<dyn FileSystem>,
        backend: Option<Arc<dyn RemoteBackend>>,
        auth: Option<AuthService>,
        sessions: SessionProvider,
    ) -> Self {
        let settings = config.photo_gallery_config();
        let cache = backend
            .as_ref()
            .map(|backend| PhotoCache::new(&settings.cache_path, backend.clone(), fs.clone()));
        Self {
            config,
            settings,
            db,
            fs,
            backend,
            auth,
            sessions,
            cache,
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    pub fn is_online_capable(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn RemoteBackend>, AppError> {
        self.backend.as_ref().ok_or(AppError::Offline)
    }

    fn auth(&self) -> Result<&AuthService, AppError> {
        self.auth.as_ref().ok_or(AppError::Offline)
    }

    pub fn local_store(&self) -> PhotoStore {
        PhotoStore::Local(LocalPhotoStore::new(
            self.db.clone(),
            self.fs.clone(),
            &self.settings.storage_path,
        ))
    }

    /// The signed-in user's cloud photos; `Empty` when offline
    pub fn online_store(&self) -> PhotoStore {
        match &self.backend {
            Some(backend) => PhotoStore::Online(OnlinePhotoStore::new(
                backend.clone(),
                self.fs.clone(),
                self.sessions.current(),
                self.settings.cache_ttl,
            )),
            None => PhotoStore::Empty,
        }
    }

    pub fn album_store(&self, album: &Album) -> PhotoStore {
        if !album.is_online() {
            return PhotoStore::LocalAlbum(LocalAlbumPhotoStore::new(
                album.clone(),
                self.db.clone(),
            ));
        }
        match &self.backend {
            Some(backend) => PhotoStore::OnlineAlbum(OnlineAlbumPhotoStore::new(
                album.clone(),
                backend.clone(),
                self.sessions.current(),
                self.settings.cache_ttl,
            )),
            None => PhotoStore::Empty,
        }
    }

    /// Opens a shared album by access key
    pub async fn public_album_store(&self, access_key: &str) -> Result<PhotoStore, AppError> {
        let store = open_public_album(
            self.backend()?.clone(),
            self.sessions.current(),
            access_key.trim(),
            self.settings.cache_ttl,
            self.settings.remember_public_albums,
        )
        .await?;
        Ok(PhotoStore::Public(store))
    }

    /// Refreshes local albums, and cloud albums when signed in
    pub async fn refresh_albums(&self, albums: &AlbumStore) -> AlbumStore {
        let albums = albums.refresh_local(&self.db).await;
        match (&self.backend, self.sessions.current()) {
            (Some(backend), Some(session)) => {
                albums.refresh_online(backend.as_ref(), &session).await
            }
            _ => albums.clear_online(),
        }
    }

    /// Creates a device album, or a cloud album when `online` is given
    pub async fn create_album(
        &self,
        albums: &AlbumStore,
        name: &str,
        online: Option<OnlineStatus>,
    ) -> Result<AlbumStore, AppError> {
        match online {
            None => Ok(albums.create_local_album(&self.db, name).await?),
            Some(status) => {
                let session = self.sessions.current().ok_or(StoreError::NoSession)?;
                Ok(albums
                    .create_online_album(self.backend()?.as_ref(), &session, name, status)
                    .await?)
            }
        }
    }

    pub async fn delete_album(&self, albums: &AlbumStore, album: &Album) -> Result<AlbumStore, AppError> {
        if !album.is_online() {
            return Ok(albums.delete_local_album(&self.db, album).await?);
        }
        let session = self.sessions.current().ok_or(StoreError::NoSession)?;
        Ok(albums
            .delete_online_album(self.backend()?.as_ref(), &session, album)
            .await?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionChange, AppError> {
        Ok(self.sessions.sign_in(self.auth()?, email, password).await?)
    }

    pub async fn sign_out(&self) -> Result<SessionChange, AppError> {
        Ok(self.sessions.sign_out(self.auth()?).await)
    }

    /// Refreshes an expired session; a failed refresh signs the user out
    ///
    /// Feed the result to [`Gallery::on_session_change`].
    pub async fn refresh_session(&self) -> Result<SessionChange, AppError> {
        Ok(self
            .sessions
            .refresh_if_expired(self.auth()?, chrono::Utc::now())
            .await)
    }

    /// Brings the stores on screen in line with a new session
    ///
    /// Cloud photo scopes are rebuilt with the new session and refreshed.
    /// Cloud albums are reloaded, or dropped on sign-out. Cached downloads
    /// are cleared whenever the user goes away.
    ///
    /// Tickets are taken before the returned future first yields, so a
    /// screen change made while it runs wins over its result. Apply the
    /// outcome with [`GalleryState::apply_session`] on the state current at
    /// that time.
    pub fn on_session_change(
        &self,
        state: &GalleryState,
        change: SessionChange,
    ) -> impl Future<Output = SessionUpdate> + '_ {
        let changed = change != SessionChange::Unchanged;
        let on_cloud = matches!(
            state.photos(),
            PhotoStore::Online(_) | PhotoStore::OnlineAlbum(_) | PhotoStore::Public(_)
        );
        let photos = (changed && on_cloud).then(|| (state.begin(), state.photos().clone()));
        let albums = changed.then(|| (state.begin_albums(), state.albums().clone()));

        async move {
            if !changed {
                return SessionUpdate::default();
            }
            log::info!("Session change: {:?}", change);

            if matches!(change, SessionChange::SignedOut | SessionChange::UserSwitched) {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.clear().await {
                        log::warn!("Could not clear photo cache: {}", e);
                    }
                }
            }

            let mut update = SessionUpdate::default();
            if let Some((ticket, current)) = photos {
                if let Some(store) = self.rebuild_cloud_store(&current).await {
                    update.photos = Some((ticket, store.refresh().await));
                }
            }
            if let Some((ticket, current)) = albums {
                let albums = match change {
                    SessionChange::SignedOut => current.clear_online(),
                    _ => self.refresh_albums(&current).await,
                };
                update.albums = Some((ticket, albums));
            }
            update
        }
    }

    async fn rebuild_cloud_store(&self, current: &PhotoStore) -> Option<PhotoStore> {
        match current {
            PhotoStore::Online(_) => Some(self.online_store()),
            PhotoStore::OnlineAlbum(store) => Some(self.album_store(store.album())),
            PhotoStore::Public(store) => match self.public_album_store(store.access_key()).await {
                Ok(store) => Some(store),
                Err(e) => {
                    log::warn!("Could not reopen public album: {}", e);
                    None
                }
            },
            _ => None,
        }
    }

    /// Deletes `items` from `store`, dropping cached copies of deleted
    /// cloud photos
    pub async fn delete_photos(
        &self,
        store: &PhotoStore,
        items: &[PhotoItem],
    ) -> Result<PhotoStore, AppError> {
        let updated = store.delete_photos(items).await?;
        if let (PhotoStore::Online(_), Some(cache)) = (store, &self.cache) {
            let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
            cache.evict(&ids).await;
        }
        Ok(updated)
    }

    /// Adds what the user picks to `store`
    ///
    /// A cancelled pick leaves the store as it is.
    pub async fn import_from_picker(
        &self,
        picker: &dyn MediaPicker,
        store: &PhotoStore,
    ) -> Result<PhotoStore, AppError> {
        let picked = match picker.pick_images().await {
            Ok(picked) => picked,
            Err(PickerError::Cancelled) => {
                log::debug!("Picker cancelled");
                return Ok(store.clone());
            }
            Err(e) => return Err(AppError::Picker(e.to_string())),
        };

        if picked.is_empty() {
            return Ok(store.clone());
        }
        log::info!("Importing {} photos into {}", picked.len(), store.kind());
        Ok(store.add_new_photos(PhotoSource::Files(picked)).await?)
    }

    /// Items of `store` with cloud photos pointing at cached files
    pub async fn localized_items(&self, store: &PhotoStore) -> Vec<PhotoItem> {
        match (store, &self.cache) {
            (PhotoStore::Online(_) | PhotoStore::OnlineAlbum(_) | PhotoStore::Public(_), Some(cache)) => {
                cache.localize(store.photo_items()).await
            }
            _ => store.photo_items().to_vec(),
        }
    }
}
