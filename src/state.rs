//! The stores currently on screen, passed around as values.
//!
//! A refresh is slow and results may arrive out of order. Every operation
//! takes a [`Ticket`] when it starts; its result is installed only if no
//! newer operation on the same store started in the meantime. The counters
//! behind the tickets are shared by every clone of a state, so a ticket
//! taken from an older value is still judged against the latest operation.

use photo_gallery::{AlbumStore, PhotoStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Marks one state-changing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Generations {
    photos: AtomicU64,
    albums: AtomicU64,
}

impl Generations {
    fn next(counter: &AtomicU64) -> Ticket {
        Ticket(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_latest(counter: &AtomicU64, ticket: Ticket) -> bool {
        counter.load(Ordering::SeqCst) == ticket.0
    }
}

/// Results of a session change, applied to whatever state is current when
/// they arrive
#[derive(Debug, Default)]
pub struct SessionUpdate {
    pub(crate) photos: Option<(Ticket, PhotoStore)>,
    pub(crate) albums: Option<(Ticket, AlbumStore)>,
}

#[derive(Debug, Clone, Default)]
pub struct GalleryState {
    generations: Arc<Generations>,
    photos: PhotoStore,
    albums: AlbumStore,
}

impl GalleryState {
    pub fn new(photos: PhotoStore, albums: AlbumStore) -> Self {
        Self {
            photos,
            albums,
            ..Self::default()
        }
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    pub fn albums(&self) -> &AlbumStore {
        &self.albums
    }

    /// Starts a photo-store operation, superseding every earlier one
    pub fn begin(&self) -> Ticket {
        Generations::next(&self.generations.photos)
    }

    /// Installs `photos` unless a newer photo operation has started
    pub fn apply(&self, ticket: Ticket, photos: PhotoStore) -> Self {
        if !self.is_current(ticket) {
            log::debug!(
                "Dropping stale {} result (ticket {}, current {})",
                photos.kind(),
                ticket.0,
                self.generations.photos.load(Ordering::SeqCst)
            );
            return self.clone();
        }
        Self {
            photos,
            ..self.clone()
        }
    }

    /// Switches to another store right away, invalidating pending results
    pub fn show(&self, photos: PhotoStore) -> Self {
        let ticket = self.begin();
        self.apply(ticket, photos)
    }

    pub fn begin_albums(&self) -> Ticket {
        Generations::next(&self.generations.albums)
    }

    pub fn apply_albums(&self, ticket: Ticket, albums: AlbumStore) -> Self {
        if !Generations::is_latest(&self.generations.albums, ticket) {
            log::debug!("Dropping stale album list (ticket {})", ticket.0);
            return self.clone();
        }
        Self {
            albums,
            ..self.clone()
        }
    }

    /// Installs whatever part of `update` is still current
    pub fn apply_session(&self, update: SessionUpdate) -> Self {
        let state = match update.photos {
            Some((ticket, photos)) => self.apply(ticket, photos),
            None => self.clone(),
        };
        match update.albums {
            Some((ticket, albums)) => state.apply_albums(ticket, albums),
            None => state,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        Generations::is_latest(&self.generations.photos, ticket)
    }
}
