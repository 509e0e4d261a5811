//! Error handling for the resume ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeRankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("DOCX extraction error: {0}")]
    DocxExtraction(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Batch limit exceeded: {0}")]
    BatchLimit(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeRankerError>;

/// The model2vec loader reports failures through anyhow
impl From<anyhow::Error> for ResumeRankerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeRankerError::ModelLoading(err.to_string())
    }
}
