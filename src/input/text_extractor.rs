//! Text extraction from submitted document bytes

use crate::error::{Result, ResumeRankerError};
use crate::input::media_type::MediaType;
use log::{debug, warn};
use regex::Regex;
use std::io::{Cursor, Read};

/// Turns document bytes into plain text.
///
/// Extraction failures are data, not errors: implementations return an empty
/// string when the document cannot be read, and the caller decides how to
/// report it.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], media_type: &MediaType) -> String;
}

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs
        let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ResumeRankerError::PdfExtraction(e.to_string())),
            Err(_) => Err(ResumeRankerError::PdfExtraction("parser panicked on malformed input".to_string())),
        }
    }
}

pub struct DocxExtractor {
    tag_regex: Regex,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxExtractor {
    const DOCUMENT_PART: &'static str = "word/document.xml";

    pub fn new() -> Self {
        Self {
            tag_regex: Regex::new(r"<[^>]*>").expect("Invalid tag regex"),
        }
    }

    pub fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ResumeRankerError::DocxExtraction(format!("Not a DOCX archive: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name(Self::DOCUMENT_PART)
            .map_err(|e| ResumeRankerError::DocxExtraction(format!("Missing {}: {}", Self::DOCUMENT_PART, e)))?
            .read_to_string(&mut xml)?;

        Ok(self.xml_to_text(&xml))
    }

    fn xml_to_text(&self, xml: &str) -> String {
        let text = xml
            .replace("</w:p>", "\n")
            .replace("<w:br/>", "\n")
            .replace("<w:tab/>", "\t");

        let stripped = self.tag_regex.replace_all(&text, "");

        let unescaped = stripped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&");

        unescaped
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// PDF and DOCX extraction; every other media type yields no text
pub struct DefaultTextExtractor {
    pdf: PdfExtractor,
    docx: DocxExtractor,
}

impl Default for DefaultTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultTextExtractor {
    pub fn new() -> Self {
        Self {
            pdf: PdfExtractor,
            docx: DocxExtractor::new(),
        }
    }
}

impl TextExtractor for DefaultTextExtractor {
    fn extract(&self, bytes: &[u8], media_type: &MediaType) -> String {
        let extracted = match media_type {
            MediaType::Pdf => self.pdf.extract_text(bytes),
            MediaType::Docx => self.docx.extract_text(bytes),
            MediaType::Unsupported(declared) => {
                debug!("No extractor for media type '{}'", declared);
                return String::new();
            }
        };

        match extracted {
            Ok(text) => text,
            Err(e) => {
                warn!("{} extraction failed: {}", media_type, e);
                String::new()
            }
        }
    }
}
