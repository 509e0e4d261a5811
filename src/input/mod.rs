//! Input processing module
//! Handles media type detection, text extraction, and loading documents from disk

pub mod media_type;
pub mod text_extractor;
pub mod manager;
