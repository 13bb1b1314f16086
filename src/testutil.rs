//! Shared test helpers for doc-intake unit tests.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ProcessingConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::AppState;

/// Create a test AppState backed by a temporary directory, with the dev
/// bridge enabled and no processing delay.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let root = temp_dir.path().join("root");

    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        processing: ProcessingConfig {
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        },
        storage: StorageConfig {
            root: root.to_string_lossy().to_string(),
            ..StorageConfig::default()
        },
        dev_bridge: true,
        ..Config::default()
    };

    let object_store = LocalStore::new(&root).expect("Failed to create test object store");

    Arc::new(AppState::new(config, Arc::new(object_store)))
}
