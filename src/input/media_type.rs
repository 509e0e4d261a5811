//! Declared media type of a submitted document

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Docx,
    /// Anything else, keeping what the caller declared for error reporting
    Unsupported(String),
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => MediaType::Pdf,
            "docx" => MediaType::Docx,
            other => MediaType::Unsupported(other.to_string()),
        }
    }

    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            PDF_MIME => MediaType::Pdf,
            DOCX_MIME => MediaType::Docx,
            _ => MediaType::Unsupported(essence),
        }
    }

    /// Accepts either a MIME type or a bare extension
    pub fn parse(declared: &str) -> Self {
        if declared.contains('/') {
            Self::from_mime(declared)
        } else {
            Self::from_extension(declared.trim_start_matches('.'))
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => MediaType::Unsupported(String::new()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaType::Unsupported(_))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Pdf => write!(f, "pdf"),
            MediaType::Docx => write!(f, "docx"),
            MediaType::Unsupported(declared) if declared.is_empty() => write!(f, "unknown"),
            MediaType::Unsupported(declared) => write!(f, "{}", declared),
        }
    }
}
