use crate::error::AppError;
use photo_gallery::PhotoGalleryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Connection settings for the cloud backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub anon_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "photos".to_string()
}

/// App configuration, stored as TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    pub storage_dir: String,
    pub database_path: String,
    pub cache_dir: String,
    /// Lifetime of online listings and signed URLs
    pub cache_ttl_secs: i64,
    pub remember_public_albums: bool,
    /// Cloud features are off without this table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteSettings>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        let store_defaults = PhotoGalleryConfig::default();
        Self {
            storage_dir: format!("{}/photos", DEFAULT_DATA_DIR),
            database_path: format!("{}/gallery.db", DEFAULT_DATA_DIR),
            cache_dir: format!("{}/cache", DEFAULT_DATA_DIR),
            cache_ttl_secs: store_defaults.cache_ttl.num_seconds(),
            remember_public_albums: store_defaults.remember_public_albums,
            remote: None,
        }
    }
}

impl GalleryConfig {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        let config: GalleryConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the config file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(AppError::Config(format!(
                "Could not read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.cache_ttl_secs <= 0 {
            return Err(AppError::Config(
                "cache_ttl_secs must be positive".to_string(),
            ));
        }
        if let Some(remote) = &self.remote {
            if remote.base_url.trim().is_empty() {
                return Err(AppError::Config("remote.base_url is empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs)
    }

    /// Settings handed to the store layer
    pub fn photo_gallery_config(&self) -> PhotoGalleryConfig {
        PhotoGalleryConfig {
            storage_path: self.storage_dir.clone(),
            cache_path: self.cache_dir.clone(),
            cache_ttl: self.cache_ttl(),
            remember_public_albums: self.remember_public_albums,
        }
    }
}
