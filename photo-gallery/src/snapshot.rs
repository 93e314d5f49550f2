use crate::models::{PhotoItem, PhotoItemResult};
use std::cmp::Ordering;
use std::sync::Arc;

/// Newest first, ties broken by higher id first
pub fn display_order(a: &PhotoItem, b: &PhotoItem) -> Ordering {
    b.date_taken.cmp(&a.date_taken).then(b.id.cmp(&a.id))
}

/// An immutable, ordered list of photos
///
/// Clones share the underlying list. A store that refreshes builds a new
/// snapshot; lookups against an old one never observe the change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoSnapshot {
    items: Arc<[PhotoItem]>,
}

impl PhotoSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot, enforcing display order regardless of input order
    pub fn from_items(mut items: Vec<PhotoItem>) -> Self {
        items.sort_by(display_order);
        Self {
            items: items.into(),
        }
    }

    pub fn items(&self) -> &[PhotoItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_by_id(&self, id: i64) -> Option<PhotoItemResult> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .map(|index| PhotoItemResult {
                index,
                photo_item: self.items[index].clone(),
            })
    }

    pub fn get_by_index(&self, index: usize) -> Option<&PhotoItem> {
        self.items.get(index)
    }

    /// The photo before `index` (towards newer photos)
    pub fn previous(&self, index: usize) -> Option<PhotoItemResult> {
        let prev = index.checked_sub(1)?;
        self.get_by_index(prev).map(|item| PhotoItemResult {
            index: prev,
            photo_item: item.clone(),
        })
    }

    /// The photo after `index` (towards older photos)
    pub fn next(&self, index: usize) -> Option<PhotoItemResult> {
        let next = index.checked_add(1)?;
        self.get_by_index(next).map(|item| PhotoItemResult {
            index: next,
            photo_item: item.clone(),
        })
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.id).collect()
    }
}
