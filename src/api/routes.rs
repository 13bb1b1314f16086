use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.upload_body_limit();

    let mut router = Router::new()
        // Intake session
        .route(
            "/files",
            get(handlers::list_files)
                .post(handlers::add_files)
                .delete(handlers::clear_files)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/:id",
            get(handlers::get_file).delete(handlers::remove_file),
        )
        .route("/files/:id/content", get(handlers::file_content))
        .route("/files/:id/preview", get(handlers::file_preview))
        .route("/stored", get(handlers::stored_files))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Local development only
    if state.config.dev_bridge {
        tracing::warn!("Dev bridge enabled. /_fs routes are available.");
        router = router
            .route(
                "/_fs/write/*path",
                post(handlers::fs_write).layer(DefaultBodyLimit::max(upload_limit)),
            )
            .route("/_fs/delete/*path", delete(handlers::fs_delete))
            .route("/_fs/list/*path", get(handlers::fs_list));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
