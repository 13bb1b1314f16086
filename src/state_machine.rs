//! Lifecycle state machine for files in the intake session.

use serde::{Deserialize, Serialize};

/// Processing status of an uploaded file.
///
/// A file moves `Pending -> Processing -> Completed | Error`. Both
/// `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Processing)
                | (FileStatus::Processing, FileStatus::Completed)
                | (FileStatus::Processing, FileStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error)
    }

    /// Status text shown next to a file.
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Pending => "Pending",
            FileStatus::Processing => "Processing...",
            FileStatus::Completed => "Completed",
            FileStatus::Error => "Error",
        }
    }
}
