//! Dev filesystem bridge helpers.
//!
//! The intake session saves accepted files through these so the bytes land
//! somewhere on disk during local development. Nothing here is a storage
//! contract: names are timestamped, there is no index, and the directory is
//! read back by listing it.

use bytes::Bytes;
use chrono::Utc;

use crate::object_store::{ObjectStore, ObjectStoreError};

pub const DEFAULT_UPLOAD_DIR: &str = "uploaded-files";

/// Join path parts with `/`, trimming slashes at each part's ends and
/// dropping parts that end up empty.
pub fn join_paths<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| part.as_ref().trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Attempts at a free `{millis}-{name}` key before giving up.
const MAX_SAVE_ATTEMPTS: i64 = 1000;

/// Write `data` under `upload_dir` and return the stored path.
///
/// Never overwrites: when the timestamped key is taken, the next millisecond
/// is tried.
pub async fn save_file(
    store: &dyn ObjectStore,
    upload_dir: &str,
    name: &str,
    data: Bytes,
) -> Result<String, ObjectStoreError> {
    let sanitized = sanitize_file_name(name);
    let started = Utc::now().timestamp_millis();

    let mut attempt = 0;
    loop {
        let file_name = format!("{}-{sanitized}", started + attempt);
        let path = join_paths(&[upload_dir, file_name.as_str()]);

        match store.put_new(&path, data.clone()).await {
            Ok(()) => {
                tracing::debug!(path = %path, "Saved file through dev bridge");
                return Ok(path);
            }
            Err(ObjectStoreError::AlreadyExists(_)) if attempt + 1 < MAX_SAVE_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn delete_file(store: &dyn ObjectStore, path: &str) -> Result<(), ObjectStoreError> {
    store.delete(path).await?;
    tracing::debug!(path = %path, "Deleted file through dev bridge");
    Ok(())
}

/// Paths of everything previously saved under `upload_dir`, skipping dotfiles.
/// Errors are logged and yield an empty list.
pub async fn load_stored_files(store: &dyn ObjectStore, upload_dir: &str) -> Vec<String> {
    match store.list(upload_dir).await {
        Ok(names) => names
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .map(|name| join_paths(&[upload_dir, name.as_str()]))
            .collect(),
        Err(e) => {
            tracing::warn!(dir = %upload_dir, error = %e, "Failed to load stored files");
            Vec::new()
        }
    }
}
