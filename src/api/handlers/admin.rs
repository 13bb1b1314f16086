use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::JSend;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub files: usize,
    pub status: String,
    pub version: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<JSend<HealthResponse>> {
    let status = if state.intake.is_closed() {
        "closing"
    } else {
        "ok"
    };

    JSend::success(HealthResponse {
        files: state.intake.files().await.len(),
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
