//! doc-intake - A document intake service
//!
//! This crate provides a single-session document upload flow with:
//! - Validation of type, per-file size, aggregate size, count, and duplicates
//! - A simulated processing lifecycle per accepted file
//! - Preview and download of accepted files over a REST API
//! - A local-only dev filesystem bridge that saves uploaded bytes to disk

pub mod api;
pub mod bridge;
pub mod config;
pub mod intake;
pub mod object_store;
pub mod preview;
pub mod state_machine;
#[cfg(test)]
pub mod testutil;
pub mod validation;

use std::sync::Arc;

use config::Config;
use intake::Intake;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub intake: Intake,
    pub object_store: Arc<dyn object_store::ObjectStore>,
}

impl AppState {
    /// Wire an intake session to `object_store` using the limits and
    /// processing settings from `config`.
    pub fn new(config: Config, object_store: Arc<dyn object_store::ObjectStore>) -> Self {
        let intake = Intake::new(
            Arc::clone(&object_store),
            config.limits,
            config.processing.clone(),
            config.storage.upload_dir.clone(),
        );

        Self {
            config,
            intake,
            object_store,
        }
    }
}
