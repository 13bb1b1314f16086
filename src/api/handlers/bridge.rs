//! `/_fs` routes of the dev filesystem bridge. Only mounted when
//! `DEV_BRIDGE` is enabled.

use axum::extract::{Path, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BridgeResponse {
    pub message: &'static str,
    pub path: String,
}

pub async fn fs_write(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Json<JSend<BridgeResponse>>, ApiError> {
    let bytes = body.len();
    state.object_store.put(&path, body).await?;

    tracing::debug!(path = %path, bytes, "Bridge write");
    Ok(JSend::success(BridgeResponse {
        message: "File written successfully",
        path,
    }))
}

pub async fn fs_delete(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<JSend<BridgeResponse>>, ApiError> {
    state.object_store.delete(&path).await?;

    tracing::debug!(path = %path, "Bridge delete");
    Ok(JSend::success(BridgeResponse {
        message: "File deleted successfully",
        path,
    }))
}

pub async fn fs_list(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<JSend<Vec<String>>>, ApiError> {
    let entries = state.object_store.list(&path).await?;
    Ok(JSend::success(entries))
}
