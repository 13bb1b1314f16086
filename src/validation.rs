use serde::Serialize;
use thiserror::Error;

/// Accepted MIME types and the file extensions that also identify them.
pub const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &[".pdf"]),
    (DOCX_MIME, &[".docx"]),
    ("text/plain", &[".txt"]),
    ("image/png", &[".png"]),
    ("image/jpeg", &[".jpg", ".jpeg"]),
];

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DEFAULT_MAX_FILES: usize = 5;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 50 * 1024 * 1024; // 50MB

/// Intake capacity: how many files and how many bytes a session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileLimits {
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_total_size: u64,
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
        }
    }
}

/// The attributes validation looks at.
pub trait FileInfo {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn mime_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid file type. Supported types: PDF, DOCX, TXT, PNG, JPG")]
    InvalidType,
    #[error("File size exceeds {} limit", size_label(.max))]
    FileTooLarge { max: u64 },
    #[error("Maximum {max} files allowed")]
    TooManyFiles { max: usize },
    #[error("Total size exceeds {} limit", size_label(.max))]
    TotalTooLarge { max: u64 },
    #[error("A file with the same name and size already exists")]
    Duplicate,
}

fn size_label(bytes: &u64) -> String {
    format_file_size(*bytes)
}

pub fn validate_file_type(mime_type: &str) -> bool {
    ALLOWED_TYPES.iter().any(|(mime, _)| *mime == mime_type)
}

pub fn validate_file_size(size: u64, limits: &FileLimits) -> bool {
    size <= limits.max_file_size
}

pub fn validate_total_size<I>(sizes: I, limits: &FileLimits) -> bool
where
    I: IntoIterator<Item = u64>,
{
    sizes.into_iter().sum::<u64>() <= limits.max_total_size
}

/// Type check used at intake: either the MIME type is allowed, or the
/// name carries an allowed extension (browsers often send an empty type).
fn is_allowed_type(file: &impl FileInfo) -> bool {
    let name = file.name().to_lowercase();
    ALLOWED_TYPES.iter().any(|(mime, extensions)| {
        file.mime_type() == *mime || extensions.iter().any(|ext| name.ends_with(ext))
    })
}

/// Return the first rule `candidate` breaks against the files already held.
pub fn validation_error<F, E>(
    candidate: &F,
    existing: &[E],
    limits: &FileLimits,
) -> Option<ValidationError>
where
    F: FileInfo,
    E: FileInfo,
{
    if !is_allowed_type(candidate) {
        return Some(ValidationError::InvalidType);
    }

    if !validate_file_size(candidate.size(), limits) {
        return Some(ValidationError::FileTooLarge {
            max: limits.max_file_size,
        });
    }

    if existing.len() >= limits.max_files {
        return Some(ValidationError::TooManyFiles {
            max: limits.max_files,
        });
    }

    let sizes = existing
        .iter()
        .map(|f| f.size())
        .chain(std::iter::once(candidate.size()));
    if !validate_total_size(sizes, limits) {
        return Some(ValidationError::TotalTooLarge {
            max: limits.max_total_size,
        });
    }

    if existing
        .iter()
        .any(|f| f.name() == candidate.name() && f.size() == candidate.size())
    {
        return Some(ValidationError::Duplicate);
    }

    None
}

/// Icon classification of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Docx,
    Txt,
    File,
}

pub fn file_kind(mime_type: &str) -> FileKind {
    match mime_type {
        m if is_image(m) => FileKind::Image,
        "application/pdf" => FileKind::Pdf,
        DOCX_MIME => FileKind::Docx,
        "text/plain" => FileKind::Txt,
        _ => FileKind::File,
    }
}

pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Lowercase extension without the dot. A name with no dot is returned whole.
pub fn file_extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// Human-readable byte size in base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Meta(&'static str, u64, &'static str);

    impl FileInfo for Meta {
        fn name(&self) -> &str {
            self.0
        }
        fn size(&self) -> u64 {
            self.1
        }
        fn mime_type(&self) -> &str {
            self.2
        }
    }

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_accepts_allowed_mime() {
        let limits = FileLimits::default();
        let none: [Meta; 0] = [];
        assert_eq!(
            validation_error(&Meta("a.pdf", 10, "application/pdf"), &none, &limits),
            None
        );
    }

    #[test]
    fn test_extension_rescues_missing_mime() {
        let limits = FileLimits::default();
        let none: [Meta; 0] = [];
        assert_eq!(
            validation_error(&Meta("Photo.JPEG", 10, ""), &none, &limits),
            None
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let limits = FileLimits::default();
        let none: [Meta; 0] = [];
        let err = validation_error(&Meta("run.exe", 10, "application/x-msdownload"), &none, &limits);
        assert_eq!(err, Some(ValidationError::InvalidType));
    }

    #[test]
    fn test_file_size_boundary() {
        let limits = FileLimits::default();
        let none: [Meta; 0] = [];
        assert_eq!(
            validation_error(&Meta("a.txt", 10 * MB, "text/plain"), &none, &limits),
            None
        );
        let err = validation_error(&Meta("a.txt", 10 * MB + 1, "text/plain"), &none, &limits);
        assert_eq!(err, Some(ValidationError::FileTooLarge { max: 10 * MB }));
        assert_eq!(err.unwrap().to_string(), "File size exceeds 10 MB limit");
    }

    #[test]
    fn test_count_limit() {
        let limits = FileLimits::default();
        let existing = [
            Meta("1.txt", 1, "text/plain"),
            Meta("2.txt", 1, "text/plain"),
            Meta("3.txt", 1, "text/plain"),
            Meta("4.txt", 1, "text/plain"),
            Meta("5.txt", 1, "text/plain"),
        ];
        let err = validation_error(&Meta("6.txt", 1, "text/plain"), &existing, &limits);
        assert_eq!(err, Some(ValidationError::TooManyFiles { max: 5 }));
        assert_eq!(err.unwrap().to_string(), "Maximum 5 files allowed");
    }

    #[test]
    fn test_total_size_limit() {
        let limits = FileLimits::default();
        let existing = [
            Meta("1.pdf", 10 * MB, "application/pdf"),
            Meta("2.pdf", 10 * MB, "application/pdf"),
            Meta("3.pdf", 10 * MB, "application/pdf"),
            Meta("4.pdf", 10 * MB, "application/pdf"),
        ];
        assert_eq!(
            validation_error(&Meta("5.pdf", 10 * MB, "application/pdf"), &existing, &limits),
            None
        );

        let limits = FileLimits {
            max_total_size: 35 * MB,
            ..FileLimits::default()
        };
        let err = validation_error(&Meta("5.pdf", 10 * MB, "application/pdf"), &existing, &limits);
        assert_eq!(err, Some(ValidationError::TotalTooLarge { max: 35 * MB }));
        assert_eq!(err.unwrap().to_string(), "Total size exceeds 35 MB limit");
    }

    #[test]
    fn test_duplicate_requires_name_and_size() {
        let limits = FileLimits::default();
        let existing = [Meta("report.pdf", 100, "application/pdf")];
        assert_eq!(
            validation_error(&Meta("report.pdf", 100, "application/pdf"), &existing, &limits),
            Some(ValidationError::Duplicate)
        );
        assert_eq!(
            validation_error(&Meta("report.pdf", 101, "application/pdf"), &existing, &limits),
            None
        );
        assert_eq!(
            validation_error(&Meta("other.pdf", 100, "application/pdf"), &existing, &limits),
            None
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let limits = FileLimits::default();
        let none: [Meta; 0] = [];
        let err = validation_error(&Meta("big.zip", 100 * MB, "application/zip"), &none, &limits);
        assert_eq!(err, Some(ValidationError::InvalidType));
    }

    #[test]
    fn test_standalone_predicates() {
        let limits = FileLimits::default();
        assert!(validate_file_type("image/png"));
        assert!(!validate_file_type("image/gif"));
        assert!(validate_file_size(10 * MB, &limits));
        assert!(!validate_file_size(10 * MB + 1, &limits));
        assert!(validate_total_size([25 * MB, 25 * MB], &limits));
        assert!(!validate_total_size([25 * MB, 25 * MB, 1], &limits));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1000), "1000 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * MB), "10 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(file_kind("image/jpeg"), FileKind::Image);
        assert_eq!(file_kind("application/pdf"), FileKind::Pdf);
        assert_eq!(file_kind(DOCX_MIME), FileKind::Docx);
        assert_eq!(file_kind("text/plain"), FileKind::Txt);
        assert_eq!(file_kind("application/zip"), FileKind::File);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Report.Final.PDF"), "pdf");
        assert_eq!(file_extension("README"), "readme");
        assert_eq!(file_extension(""), "");
    }
}
