use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::state_machine::FileStatus;
use crate::validation::{is_image, FileInfo};

/// A file offered to the intake session, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl IncomingFile {
    /// Build an incoming file, guessing the MIME type from the name when the
    /// client sent none (or only the generic octet-stream type).
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, data: Bytes) -> Self {
        let name = name.into();
        let mime_type = mime_type
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map(|ct| ct.to_string())
            .or_else(|| mime_guess::from_path(&name).first().map(|m| m.to_string()))
            .unwrap_or_default();

        Self {
            name,
            mime_type,
            data,
        }
    }
}

impl FileInfo for IncomingFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// A file held by the intake session.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub data: Bytes,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub status: FileStatus,
    /// Only set for images
    pub preview_url: Option<String>,
    pub error_message: Option<String>,
    /// Path returned by the dev bridge once the bytes were saved
    pub stored_path: Option<String>,
    pub added_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
}

impl UploadedFile {
    pub(crate) fn accept(file: IncomingFile) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let preview_url = is_image(&file.mime_type).then(|| content_url(&id));

        Self {
            size: file.data.len() as u64,
            id,
            data: file.data,
            name: file.name,
            mime_type: file.mime_type,
            status: FileStatus::Pending,
            preview_url,
            error_message: None,
            stored_path: None,
            added_at: Utc::now(),
            processing_started_at: None,
        }
    }
}

impl FileInfo for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// URL the HTTP API serves a file's bytes from.
pub fn content_url(id: &str) -> String {
    format!("/files/{id}/content")
}

/// Result of offering a batch of files.
#[derive(Debug, Default)]
pub struct AddOutcome {
    pub added: Vec<UploadedFile>,
    /// One message per rejected file, in input order
    pub errors: Vec<String>,
}

/// Point-in-time view of the session and its usage against the limits.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub files: Vec<UploadedFile>,
    pub total_size: u64,
    pub remaining_space: u64,
    pub is_at_capacity: bool,
}
