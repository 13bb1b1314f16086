use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{content_url, Intake, UploadedFile, PROCESSING_FAILED};
use crate::bridge;
use crate::state_machine::FileStatus;
use crate::validation::is_image;

/// The progress bar fills over this window in fixed ticks.
const PROGRESS_WINDOW: Duration = Duration::from_millis(2000);
const PROGRESS_TICK: Duration = Duration::from_millis(50);

/// Drive one accepted file from `Pending` to a terminal status.
pub(super) async fn process(intake: Intake, id: String) {
    let started = intake
        .transition(&id, FileStatus::Processing, |file| {
            file.processing_started_at = Some(Utc::now());
        })
        .await;
    if !started {
        return;
    }

    // Removed between the two steps: nothing left to process.
    let Some(file) = intake.get(&id).await else {
        return;
    };

    let saved = bridge::save_file(
        intake.store.as_ref(),
        &intake.upload_dir,
        &file.name,
        file.data.clone(),
    )
    .await;

    let stored_path = match saved {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(file_id = %id, error = %e, "Error processing file");
            let failed = intake
                .transition(&id, FileStatus::Error, |file| {
                    file.error_message = Some(PROCESSING_FAILED.to_string());
                })
                .await;
            if failed {
                tracing::warn!(file_id = %id, "Failed to process {}", file.name);
            }
            return;
        }
    };

    tokio::select! {
        _ = intake.shutdown.cancelled() => return,
        _ = tokio::time::sleep(intake.processing_delay()) => {}
    }

    let completed = intake
        .transition(&id, FileStatus::Completed, |record| {
            record.stored_path = Some(stored_path.clone());
            if is_image(&record.mime_type) {
                record.preview_url = Some(content_url(&record.id));
            }
        })
        .await;

    if completed {
        tracing::info!(file_id = %id, "{} processed successfully", file.name);
    } else if !intake.is_closed() {
        // The file left the session while processing; its saved copy is orphaned.
        if let Err(e) = bridge::delete_file(intake.store.as_ref(), &stored_path).await {
            tracing::warn!(path = %stored_path, error = %e, "Failed to delete orphaned file");
        }
    }
}

/// Simulated progress percentage for a file being processed.
///
/// Advances one tick every 50ms across a 2s window and stops at the last
/// tick below 100, so a file never shows full progress before it completes.
pub fn progress(file: &UploadedFile, now: DateTime<Utc>) -> Option<f64> {
    if file.status != FileStatus::Processing {
        return None;
    }
    let started = file.processing_started_at?;

    let ticks_total = (PROGRESS_WINDOW.as_millis() / PROGRESS_TICK.as_millis()) as u64;
    let increment = 100.0 / ticks_total as f64;

    let elapsed = (now - started).num_milliseconds().max(0) as u64;
    let ticks = (elapsed / PROGRESS_TICK.as_millis() as u64).min(ticks_total - 1);

    Some(ticks as f64 * increment)
}
