//! Candidate documents submitted for scoring

use crate::input::media_type::MediaType;
use std::fmt;

/// A candidate document as submitted by the caller: raw bytes plus the
/// declared media type. Lives only for the duration of one scoring request.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl Document {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            bytes,
            media_type,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Byte payloads are large; keep Debug output to the metadata
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}
