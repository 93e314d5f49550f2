// Media picking seam
//
// The platform picker (Android activity, desktop file dialog) lives in the
// UI shell; the gallery only sees the photos it yields.

use async_trait::async_trait;
use photo_gallery::PhotoToAdd;

#[derive(Debug, Clone, PartialEq)]
pub enum PickerError {
    PermissionDenied(String),
    Cancelled,
    PlatformNotSupported(String),
    Other(String),
}

impl std::fmt::Display for PickerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            PickerError::Cancelled => write!(f, "Cancelled"),
            PickerError::PlatformNotSupported(msg) => write!(f, "Platform not supported: {}", msg),
            PickerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PickerError {}

/// Lets the user choose photos to import
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// The chosen photos; an empty list when nothing was picked
    async fn pick_images(&self) -> Result<Vec<PhotoToAdd>, PickerError>;
}

/// Picker that yields a fixed list, e.g. paths given on the command line
#[derive(Debug, Clone, Default)]
pub struct StaticPicker {
    photos: Vec<PhotoToAdd>,
}

impl StaticPicker {
    pub fn new(photos: Vec<PhotoToAdd>) -> Self {
        Self { photos }
    }
}

#[async_trait]
impl MediaPicker for StaticPicker {
    async fn pick_images(&self) -> Result<Vec<PhotoToAdd>, PickerError> {
        Ok(self.photos.clone())
    }
}
