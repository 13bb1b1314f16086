//! How a file can be shown to the user before download.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::intake::UploadedFile;
use crate::state_machine::FileStatus;
use crate::validation::{is_image, DOCX_MIME};

const OFFICE_VIEWER: &str = "https://view.officeapps.live.com/op/embed.aspx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    /// Rendered directly from the preview URL
    Image,
    /// Shown as plain text
    Text,
    /// Embedded in a frame
    Pdf,
    /// Embedded through the Office web viewer
    Document,
    Unavailable,
}

impl PreviewKind {
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            m if is_image(m) => PreviewKind::Image,
            "text/plain" => PreviewKind::Text,
            "application/pdf" => PreviewKind::Pdf,
            DOCX_MIME | "application/msword" => PreviewKind::Document,
            _ => PreviewKind::Unavailable,
        }
    }
}

/// A file can be previewed once processing completed and its type is one
/// the preview knows how to render.
pub fn can_preview(file: &UploadedFile) -> bool {
    file.status == FileStatus::Completed
        && (is_image(&file.mime_type)
            || matches!(file.mime_type.as_str(), "text/plain" | "application/pdf" | DOCX_MIME))
}

/// Embed URL of the Office web viewer for a document served at `src`.
pub fn office_viewer_url(src: &str) -> String {
    format!(
        "{OFFICE_VIEWER}?src={}",
        utf8_percent_encode(src, NON_ALPHANUMERIC)
    )
}

/// Short type label, the uppercased MIME subtype (`application/pdf` -> `PDF`).
pub fn type_label(mime_type: &str) -> String {
    mime_type
        .split_once('/')
        .map(|(_, sub)| sub)
        .unwrap_or(mime_type)
        .to_uppercase()
}

pub fn text_content(file: &UploadedFile) -> String {
    String::from_utf8_lossy(&file.data).into_owned()
}
