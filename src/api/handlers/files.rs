use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::intake::{progress, IncomingFile, UploadedFile};
use crate::preview::can_preview;
use crate::state_machine::FileStatus;
use crate::validation::{file_kind, format_file_size, FileKind, FileLimits};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub added_at: String,
    pub can_preview: bool,
    pub error_message: Option<String>,
    pub id: String,
    pub kind: FileKind,
    pub mime_type: String,
    pub name: String,
    pub preview_url: Option<String>,
    pub progress: Option<f64>,
    pub size: u64,
    pub size_label: String,
    pub status: FileStatus,
    pub status_label: &'static str,
    pub stored_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub files: Vec<FileResponse>,
    pub is_at_capacity: bool,
    pub limits: FileLimits,
    pub remaining_space: u64,
    pub total_size: u64,
    pub total_size_label: String,
}

#[derive(Debug, Serialize)]
pub struct AddFilesResponse {
    pub added: Vec<FileResponse>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub files_cleared: usize,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<JSend<SessionResponse>> {
    let snapshot = state.intake.snapshot().await;

    JSend::success(SessionResponse {
        files: snapshot.files.iter().map(file_to_response).collect(),
        is_at_capacity: snapshot.is_at_capacity,
        limits: *state.intake.limits(),
        remaining_space: snapshot.remaining_space,
        total_size: snapshot.total_size,
        total_size_label: format_file_size(snapshot.total_size),
    })
}

/// Accept one or more `file` fields from a multipart body.
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<AddFilesResponse>>, ApiError> {
    let mut incoming = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

        incoming.push(IncomingFile::new(name, content_type.as_deref(), data));
    }

    if incoming.is_empty() {
        return Err(ApiError::bad_request("file field is required"));
    }

    let outcome = state.intake.add_files(incoming).await?;

    if outcome.added.is_empty() {
        return Err(ApiError::unprocessable(outcome.errors.join("\n")));
    }

    Ok(JSend::success(AddFilesResponse {
        added: outcome.added.iter().map(file_to_response).collect(),
        errors: outcome.errors,
    }))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    let file = state
        .intake
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    Ok(JSend::success(file_to_response(&file)))
}

pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state.intake.remove_file(&id).await?;
    Ok(JSend::success(()))
}

pub async fn clear_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<ClearResponse>>, ApiError> {
    let files_cleared = state.intake.clear_files().await?;
    Ok(JSend::success(ClearResponse { files_cleared }))
}

/// Paths previously saved by the dev bridge.
pub async fn stored_files(State(state): State<Arc<AppState>>) -> Json<JSend<Vec<String>>> {
    JSend::success(state.intake.stored_files().await)
}

// ============================================================================
// Helpers
// ============================================================================

fn file_to_response(file: &UploadedFile) -> FileResponse {
    FileResponse {
        added_at: file.added_at.to_rfc3339(),
        can_preview: can_preview(file),
        error_message: file.error_message.clone(),
        id: file.id.clone(),
        kind: file_kind(&file.mime_type),
        mime_type: file.mime_type.clone(),
        name: file.name.clone(),
        preview_url: file.preview_url.clone(),
        progress: progress(file, Utc::now()),
        size: file.size,
        size_label: format_file_size(file.size),
        status: file.status,
        status_label: file.status.label(),
        stored_path: file.stored_path.clone(),
    }
}
