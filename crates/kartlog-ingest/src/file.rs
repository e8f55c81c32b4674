//! Upload classification and reading.

use kartlog_core::{Error, Result};
use std::path::Path;

/// Kinds of result files accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Saved email (`.eml`), possibly MIME encoded.
    Eml,
    /// Plain text or HTML copied out of a mail client.
    Text,
    Pdf,
    Unsupported,
}

impl SourceKind {
    /// Detect the kind from a file extension. No extension counts as text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "eml" | "msg" => Self::Eml,
            "" | "txt" | "text" | "html" | "htm" => Self::Text,
            "pdf" => Self::Pdf,
            _ => Self::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn from_filename(name: &str) -> Self {
        Self::from_path(Path::new(name))
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Eml | Self::Text)
    }
}

/// Read an upload's raw bytes after checking that its kind is supported.
pub fn read_upload(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    match SourceKind::from_path(path) {
        SourceKind::Eml | SourceKind::Text => {
            let bytes = std::fs::read(path)?;
            tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        SourceKind::Pdf => Err(Error::UnsupportedFile(format!(
            "{}: PDF result sheets are not supported, upload the .eml instead",
            path.display()
        ))),
        SourceKind::Unsupported => Err(Error::UnsupportedFile(format!(
            "{}: expected an .eml or .txt file",
            path.display()
        ))),
    }
}
