//! Type classifier.
//!
//! Maps a filename extension to its canonical content type and checks that
//! the bytes actually look like that type. Everything here is a pure function
//! of its inputs.

use std::path::Path;

/// MIME type of an OOXML word-processing document.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Detected type for content with no recognizable signature that is not text.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One entry of the upload allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedType {
    /// Extension including the leading dot, lowercase.
    pub extension: String,
    /// Canonical content type stored for documents with this extension.
    pub content_type: String,
    /// Sniffed types accepted for this extension.
    pub detected: Vec<String>,
}

impl AllowedType {
    fn new(extension: &str, content_type: &str, detected: &[&str]) -> Self {
        Self {
            extension: extension.to_string(),
            content_type: content_type.to_string(),
            detected: detected.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether a sniffed type is acceptable for this extension.
    pub fn accepts(&self, detected: &str) -> bool {
        self.detected.iter().any(|d| d == detected)
    }
}

/// The fixed allow-list: PDF, plain text, and DOCX.
///
/// DOCX files are ZIP containers and often sniff as a bare archive or as
/// generic binary, so those are accepted as well.
pub fn default_allowed_types() -> Vec<AllowedType> {
    vec![
        AllowedType::new(".pdf", "application/pdf", &["application/pdf"]),
        AllowedType::new(".txt", "text/plain", &["text/plain"]),
        AllowedType::new(".docx", DOCX_MIME, &[DOCX_MIME, "application/zip", OCTET_STREAM]),
    ]
}

/// Extract the lowercase extension (with leading dot) of a filename.
///
/// Returns an empty string when the name has no extension.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Look up an extension in the allow-list.
pub fn lookup<'a>(types: &'a [AllowedType], extension: &str) -> Option<&'a AllowedType> {
    types.iter().find(|t| t.extension == extension)
}

/// Signatures still trusted when the whole buffer reads as text.
///
/// Most `infer` signatures are two or three printable bytes (`BM`, `MZ`,
/// `ID3`) and match ordinary prose.
const TEXT_SAFE_SIGNATURES: &[&str] = &["application/pdf", "application/zip", DOCX_MIME];

/// Detect the MIME type of a byte buffer from its leading structure.
///
/// Binary content takes whatever signature `infer` finds. Valid UTF-8
/// without NUL bytes is `text/plain` unless it starts with a PDF or ZIP
/// signature. Anything else is `application/octet-stream`.
pub fn sniff(content: &[u8]) -> String {
    let is_text = matches!(std::str::from_utf8(content), Ok(text) if !text.contains('\0'));

    match infer::get(content).map(|kind| kind.mime_type()) {
        Some(mime) if !is_text || TEXT_SAFE_SIGNATURES.contains(&mime) => mime.to_string(),
        _ if is_text => "text/plain".to_string(),
        _ => OCTET_STREAM.to_string(),
    }
}
