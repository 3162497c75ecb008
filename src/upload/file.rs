//! Selected-file description and type/size validation

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// Types accepted by the upload screen.
pub const ALLOWED_TYPES: &[&str] = &[MIME_PDF, MIME_DOCX];

/// Extensions offered by the file picker.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// 50 MiB per file.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub const REASON_TYPE: &str = "Only PDF and DOCX files are supported";

/// A file as handed over by the picker: name, declared type and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub name: String,
    #[serde(rename = "type", alias = "mime")]
    pub mime: String,
    pub size: u64,
}

impl FileSpec {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }

    /// Describe a file on disk. The type is inferred from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            mime: mime_for_path(path).to_string(),
            name,
            size: metadata.len(),
        })
    }

    /// Size in MiB with two decimals, as listed next to each upload.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "pdf" => MIME_PDF,
        "docx" => MIME_DOCX,
        _ => MIME_UNKNOWN,
    }
}

pub fn has_accepted_extension(path: &Path) -> bool {
    mime_for_path(path) != MIME_UNKNOWN
}

/// Check type, then size, against the default 50 MiB limit.
pub fn validate(file: &FileSpec) -> Option<String> {
    validate_with_limit(file, MAX_FILE_SIZE)
}

pub fn validate_with_limit(file: &FileSpec, max_size: u64) -> Option<String> {
    if !ALLOWED_TYPES.contains(&file.mime.as_str()) {
        return Some(REASON_TYPE.to_string());
    }
    if file.size > max_size {
        return Some(format!(
            "File size must be less than {}MB",
            max_size / (1024 * 1024)
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_pdf_within_limit_passes() {
        let f = FileSpec::new("paper.pdf", MIME_PDF, 1024);
        assert_eq!(validate(&f), None);
    }

    #[test]
    fn test_docx_at_exact_limit_passes() {
        let f = FileSpec::new("report.docx", MIME_DOCX, MAX_FILE_SIZE);
        assert_eq!(validate(&f), None);
    }

    #[test]
    fn test_oversized_rejected() {
        let f = FileSpec::new("big.pdf", MIME_PDF, MAX_FILE_SIZE + 1);
        assert_eq!(
            validate(&f).as_deref(),
            Some("File size must be less than 50MB")
        );
    }

    #[test]
    fn test_wrong_type_rejected_before_size() {
        // Both checks fail; the type message wins
        let f = FileSpec::new("huge.png", "image/png", MAX_FILE_SIZE * 2);
        assert_eq!(validate(&f).as_deref(), Some(REASON_TYPE));
    }

    #[test]
    fn test_custom_limit_message() {
        let f = FileSpec::new("a.pdf", MIME_PDF, 11 * 1024 * 1024);
        assert_eq!(
            validate_with_limit(&f, 10 * 1024 * 1024).as_deref(),
            Some("File size must be less than 10MB")
        );
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("x/Thesis.PDF")), MIME_PDF);
        assert_eq!(mime_for_path(Path::new("notes.docx")), MIME_DOCX);
        assert_eq!(mime_for_path(Path::new("notes.doc")), MIME_UNKNOWN);
        assert_eq!(mime_for_path(Path::new("README")), MIME_UNKNOWN);
    }

    #[test]
    fn test_from_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let spec = FileSpec::from_path(&path).unwrap();
        assert_eq!(spec.name, "draft.pdf");
        assert_eq!(spec.mime, MIME_PDF);
        assert_eq!(spec.size, 2048);
    }

    #[test]
    fn test_size_label() {
        let f = FileSpec::new("a.pdf", MIME_PDF, 3 * 1024 * 1024 / 2);
        assert_eq!(f.size_label(), "1.50 MB");
    }

    #[test]
    fn test_deserialize_browser_shape() {
        let f: FileSpec =
            serde_json::from_str(r#"{"name":"a.pdf","type":"application/pdf","size":10}"#).unwrap();
        assert_eq!(f.mime, MIME_PDF);
    }
}
