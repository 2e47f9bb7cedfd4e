//! Storage for uploaded product images.
//!
//! Uploads are written under a freshly generated name: a random v4 UUID followed by the
//! extension of the client-supplied filename. The client's base name never reaches the
//! filesystem, so two uploads can't collide and a crafted name can't escape the upload
//! directory.
//!
//! Stored files are addressed by a URL-style path, `/uploads/<generated name>`, which the
//! router maps straight onto the upload directory.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use uuid::Uuid;

/// URL prefix under which stored uploads are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Error, Debug)]
pub enum StorageError {
    /// The sanitized filename still contains a traversal sequence
    #[error("Filename contains invalid path sequence: {name}")]
    InvalidPath { name: String },

    /// I/O failure while creating the upload directory or writing a file
    #[error("Could not store file {name}")]
    StorageFailure {
        name: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for image storage backends
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store content under a generated name and return the URL it is served from
    async fn store_file(&self, original_name: &str, content: &[u8]) -> Result<String>;

    /// Remove a previously stored file given the URL returned by [`FileStorage::store_file`].
    /// Removing a file that no longer exists is not an error.
    async fn remove_file(&self, url: &str) -> Result<()>;
}

/// Local filesystem storage backend - stores files in a single flat directory
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    /// Create the storage, making sure the upload directory (and its parents) exists.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|source| StorageError::StorageFailure {
            name: base_path.display().to_string(),
            source,
        })?;
        Ok(Self { base_path })
    }

    /// Directory the files are written to
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, content), fields(size = content.len()), err)]
    async fn store_file(&self, original_name: &str, content: &[u8]) -> Result<String> {
        let cleaned = clean_path(original_name);

        if cleaned.contains("..") {
            return Err(StorageError::InvalidPath { name: cleaned });
        }

        let stored_name = format!("{}{}", Uuid::new_v4(), file_extension(&cleaned));
        let full_path = self.base_path.join(&stored_name);

        let write = async {
            let mut file = fs::File::create(&full_path).await?;
            file.write_all(content).await?;
            file.sync_all().await
        };
        write.await.map_err(|source| StorageError::StorageFailure {
            name: cleaned.clone(),
            source,
        })?;

        debug!(original = %cleaned, stored = %stored_name, "Stored upload");
        Ok(format!("{UPLOADS_URL_PREFIX}/{stored_name}"))
    }

    #[instrument(skip(self), err)]
    async fn remove_file(&self, url: &str) -> Result<()> {
        let name = url
            .strip_prefix(UPLOADS_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.contains(".."))
            .ok_or_else(|| StorageError::InvalidPath { name: url.to_string() })?;

        match fs::remove_file(self.base_path.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::StorageFailure {
                name: name.to_string(),
                source,
            }),
        }
    }
}

/// Normalize a client-supplied filename before any filesystem use.
///
/// Backslashes become forward slashes, surrounding whitespace is dropped, and empty or `.`
/// segments are collapsed. `..` segments are kept as-is so the caller can reject them.
pub fn clean_path(name: &str) -> String {
    name.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Extension of the final path segment, including the dot, or an empty string.
///
/// A leading dot marks a hidden file rather than an extension.
pub fn file_extension(name: &str) -> &str {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[idx..],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn stored_name(url: &str) -> &str {
        url.strip_prefix("/uploads/").expect("url should live under /uploads/")
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("photo.png"), "photo.png");
        assert_eq!(clean_path("  photo.png "), "photo.png");
        assert_eq!(clean_path("dir\\sub\\photo.png"), "dir/sub/photo.png");
        assert_eq!(clean_path("./a//b/./c.jpg"), "a/b/c.jpg");
        assert_eq!(clean_path("../etc/passwd"), "../etc/passwd");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.PNG"), ".PNG");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(file_extension(""), "");
        // Only the last segment counts
        assert_eq!(file_extension("v1.2/photo"), "");
        assert_eq!(file_extension("v1.2/photo.jpeg"), ".jpeg");
    }

    #[test]
    fn test_new_creates_missing_directories() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let nested = temp_dir.path().join("a").join("b").join("uploads");

        let storage = LocalFileStorage::new(&nested).expect("Failed to create storage");

        assert!(nested.is_dir());
        assert_eq!(storage.base_path(), nested.as_path());
    }

    #[test]
    fn test_new_fails_when_path_is_a_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("not-a-dir");
        std::fs::write(&file_path, "content").expect("Failed to create file");

        let result = LocalFileStorage::new(&file_path);
        assert!(matches!(result, Err(StorageError::StorageFailure { .. })));
    }

    #[tokio::test]
    async fn test_store_file_generates_name_and_keeps_extension() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let url = storage.store_file("photo.PNG", b"png bytes").await.unwrap();

        let name = stored_name(&url);
        let (stem, ext) = name.split_at(name.len() - ".PNG".len());
        assert_eq!(ext, ".PNG");
        assert!(Uuid::parse_str(stem).is_ok(), "expected a uuid, got {stem}");
        assert!(!name.contains("photo"));

        let on_disk = std::fs::read(temp_dir.path().join(name)).unwrap();
        assert_eq!(on_disk, b"png bytes");
    }

    #[tokio::test]
    async fn test_store_file_without_extension() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let url = storage.store_file("blob", b"data").await.unwrap();

        let name = stored_name(&url);
        assert!(Uuid::parse_str(name).is_ok());
        assert!(temp_dir.path().join(name).is_file());
    }

    #[tokio::test]
    async fn test_store_file_discards_directories() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let url = storage.store_file("nested\\dir/pic.jpg", b"jpg").await.unwrap();

        let name = stored_name(&url);
        assert!(name.ends_with(".jpg"));
        assert!(!name.contains('/'));
        assert!(temp_dir.path().join(name).is_file());
    }

    #[tokio::test]
    async fn test_store_file_rejects_traversal() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        for name in ["../evil.png", "a/../../evil.png", "..\\evil.png", "photo..png", ".."] {
            let result = storage.store_file(name, b"nope").await;
            assert!(
                matches!(result, Err(StorageError::InvalidPath { .. })),
                "expected InvalidPath for {name:?}, got {result:?}"
            );
        }

        let written = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(written, 0, "rejected uploads must not write anything");
    }

    #[tokio::test]
    async fn test_concurrent_stores_with_same_name_do_not_collide() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let (a, b) = tokio::join!(
            storage.store_file("same.png", b"first"),
            storage.store_file("same.png", b"second"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a, b);
        assert_eq!(std::fs::read(temp_dir.path().join(stored_name(&a))).unwrap(), b"first");
        assert_eq!(std::fs::read(temp_dir.path().join(stored_name(&b))).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_many_stores_produce_distinct_names() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let mut urls = HashSet::new();
        for _ in 0..50 {
            urls.insert(storage.store_file("dup.gif", b"gif").await.unwrap());
        }
        assert_eq!(urls.len(), 50);
    }

    #[tokio::test]
    async fn test_store_file_reports_io_failure() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path().join("uploads")).unwrap();
        std::fs::remove_dir(storage.base_path()).unwrap();

        let result = storage.store_file("photo.png", b"data").await;
        assert!(matches!(result, Err(StorageError::StorageFailure { .. })));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        let url = storage.store_file("photo.png", b"data").await.unwrap();
        let path = temp_dir.path().join(stored_name(&url));
        assert!(path.exists());

        storage.remove_file(&url).await.unwrap();
        assert!(!path.exists());

        // Already gone
        storage.remove_file(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_file_rejects_foreign_urls() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = LocalFileStorage::new(temp_dir.path()).unwrap();

        for url in ["/etc/passwd", "/uploads/", "/uploads/../secret", "/uploads/a/b.png", "uploads/x.png"] {
            let result = storage.remove_file(url).await;
            assert!(
                matches!(result, Err(StorageError::InvalidPath { .. })),
                "expected InvalidPath for {url:?}, got {result:?}"
            );
        }
    }
}
