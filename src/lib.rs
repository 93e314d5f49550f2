//! # Gallery
//!
//! Application layer of the photo gallery: configuration, logging, the
//! session-aware [`Gallery`] that builds the photo and album stores, and the
//! [`GalleryState`] the UI renders from.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod picker;
pub mod state;

pub use app::Gallery;
pub use config::{GalleryConfig, RemoteSettings};
pub use error::AppError;
pub use logging::init_logging;
pub use picker::{MediaPicker, PickerError, StaticPicker};
pub use state::{GalleryState, SessionUpdate, Ticket};
