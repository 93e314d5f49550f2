//! Device file-system access used by the stores.

use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::io::Result;
use std::path::{Path, PathBuf};

/// Length of generated managed filenames
pub const FILENAME_LENGTH: usize = 32;

/// File operations the stores need from the device
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn copy(&self, from: &Path, to: &Path) -> Result<()>;
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    async fn exists(&self, path: &Path) -> Result<bool>;
    async fn remove(&self, path: &Path) -> Result<()>;
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// [`FileSystem`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(from, to).await.map(|_| ())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}

/// Random alphanumeric filename
pub fn random_filename() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(FILENAME_LENGTH)
        .map(char::from)
        .collect()
}

/// Picks a path in `dir` that does not exist yet
///
/// Names come from `next_name`; an existing file causes a new name to be
/// drawn before anything is written.
pub async fn unused_path(
    fs: &dyn FileSystem,
    dir: &Path,
    mut next_name: impl FnMut() -> String,
) -> Result<PathBuf> {
    loop {
        let candidate = dir.join(next_name());
        if !fs.exists(&candidate).await? {
            return Ok(candidate);
        }
        log::debug!("Generated filename {} already exists, retrying", candidate.display());
    }
}

/// Strips a `file://` scheme so URIs from pickers can be used as paths
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// Best-effort removal; failures are logged and reported as `false`
pub async fn remove_quietly(fs: &dyn FileSystem, path: &Path) -> bool {
    match fs.remove(path).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not delete file {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_filename_shape() {
        let name = random_filename();
        assert_eq!(name.len(), FILENAME_LENGTH);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(name, random_filename());
    }

    #[test]
    fn test_uri_to_path() {
        assert_eq!(uri_to_path("file:///tmp/a.jpg"), PathBuf::from("/tmp/a.jpg"));
        assert_eq!(uri_to_path("/tmp/b.jpg"), PathBuf::from("/tmp/b.jpg"));
    }

    #[tokio::test]
    async fn test_unused_path_retries_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("taken"), b"existing").unwrap();

        let mut names = vec!["taken".to_string(), "free".to_string()].into_iter();
        let mut draws = 0;
        let path = unused_path(&TokioFileSystem, dir.path(), || {
            draws += 1;
            names.next().unwrap()
        })
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("free"));
        assert_eq!(draws, 2);
        assert_eq!(std::fs::read(dir.path().join("taken")).unwrap(), b"existing");
    }

    #[tokio::test]
    async fn test_copy_creates_parent_and_remove_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.jpg");
        std::fs::write(&source, b"jpeg").unwrap();
        let target = dir.path().join("managed").join("copy.jpg");

        TokioFileSystem.copy(&source, &target).await.unwrap();
        assert_eq!(TokioFileSystem.read(&target).await.unwrap(), b"jpeg");

        assert!(remove_quietly(&TokioFileSystem, &target).await);
        assert!(!remove_quietly(&TokioFileSystem, &target).await);
    }
}
