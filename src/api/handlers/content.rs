use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, JSend};
use crate::bridge::sanitize_file_name;
use crate::intake::content_url;
use crate::preview::{office_viewer_url, text_content, type_label, PreviewKind};
use crate::state_machine::FileStatus;
use crate::validation::format_file_size;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ContentParams {
    #[serde(default)]
    pub download: bool,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub id: String,
    pub kind: PreviewKind,
    pub name: String,
    pub size_label: String,
    /// Inline text, for text files
    pub text: Option<String>,
    pub type_label: String,
    /// Where the bytes are served from, for embeddable kinds
    pub url: Option<String>,
    /// Office web viewer embed, for documents
    pub viewer_url: Option<String>,
}

/// Serve a file's bytes.
/// Route: GET /files/:id/content[?download=true]
pub async fn file_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<ContentParams>,
) -> Result<Response, ApiError> {
    let file = state
        .intake
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let mut response = (StatusCode::OK, file.data.clone()).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.mime_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size));

    let disposition = if params.download { "attachment" } else { "inline" };
    let filename = file.name.replace(['"', '\\'], "_");
    let value = format!("{disposition}; filename=\"{filename}\"")
        .parse::<HeaderValue>()
        .or_else(|_| {
            format!(
                "{disposition}; filename=\"{}\"",
                sanitize_file_name(&file.name)
            )
            .parse::<HeaderValue>()
        });
    if let Ok(value) = value {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Session files can be removed at any time
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(response)
}

/// Describe how to preview a processed file.
/// Route: GET /files/:id/preview
pub async fn file_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JSend<PreviewResponse>>, ApiError> {
    let file = state
        .intake
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if file.status != FileStatus::Completed {
        return Err(ApiError::conflict("File is not ready for preview"));
    }

    let kind = PreviewKind::from_mime(&file.mime_type);
    let url = content_url(&file.id);

    let mut response = PreviewResponse {
        id: file.id.clone(),
        kind,
        name: file.name.clone(),
        size_label: format_file_size(file.size),
        text: None,
        type_label: type_label(&file.mime_type),
        url: None,
        viewer_url: None,
    };

    match kind {
        PreviewKind::Image => response.url = file.preview_url.clone(),
        PreviewKind::Pdf => response.url = Some(url),
        PreviewKind::Text => response.text = Some(text_content(&file)),
        PreviewKind::Document => {
            // The viewer fetches the document itself, so it needs an absolute URL.
            let absolute = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
                Some(host) => format!("http://{host}{url}"),
                None => url.clone(),
            };
            response.viewer_url = Some(office_viewer_url(&absolute));
            response.url = Some(url);
        }
        PreviewKind::Unavailable => {}
    }

    Ok(JSend::success(response))
}
