use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{ObjectStore, ObjectStoreError};

/// Local filesystem store rooted at a base directory.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Resolve a key to a path under the base directory.
    /// Empty segments are dropped; anything that could escape the root is refused.
    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let mut path = self.base_path.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') || segment.contains(':')
            {
                return Err(ObjectStoreError::InvalidKey(key.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let path = self.object_path(key)?;
        if path == self.base_path {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(path)
    }
}

fn io_error(key: &str, e: std::io::Error) -> ObjectStoreError {
    match e.kind() {
        ErrorKind::NotFound => ObjectStoreError::NotFound(key.to_string()),
        _ => ObjectStoreError::Io(e),
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn put_new(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ObjectStoreError::AlreadyExists(key.to_string()),
                _ => ObjectStoreError::Io(e),
            })?;
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.file_path(key)?;
        let data = tokio::fs::read(&path).await.map_err(|e| io_error(key, e))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.file_path(key)?;
        tokio::fs::remove_file(&path).await.map_err(|e| io_error(key, e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.file_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, ObjectStoreError> {
        let path = self.object_path(dir)?;
        let mut entries = tokio::fs::read_dir(&path).await.map_err(|e| io_error(dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }
}
