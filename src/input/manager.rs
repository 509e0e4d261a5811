//! Input manager for loading candidate documents and job descriptions from disk

use crate::config::BatchConfig;
use crate::error::{Result, ResumeRankerError};
use crate::input::media_type::MediaType;
use crate::input::text_extractor::{DefaultTextExtractor, TextExtractor};
use crate::processing::document::Document;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct InputManager {
    max_documents: usize,
    max_total_bytes: u64,
}

impl InputManager {
    pub fn new(max_documents: usize, max_total_bytes: u64) -> Self {
        Self {
            max_documents,
            max_total_bytes,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.max_documents, config.max_total_bytes)
    }

    /// Expand files and directories (one level deep) into a sorted file list
    pub async fn collect_paths(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            let metadata = fs::metadata(input).await.map_err(|_| {
                ResumeRankerError::InvalidInput(format!("Path does not exist: {}", input.display()))
            })?;

            if metadata.is_dir() {
                let mut dir_files = Vec::new();
                let mut entries = fs::read_dir(input).await?;
                while let Some(entry) = entries.next_entry().await? {
                    if entry.file_type().await?.is_file() {
                        dir_files.push(entry.path());
                    }
                }
                dir_files.sort();
                debug!("Found {} files in {}", dir_files.len(), input.display());
                files.extend(dir_files);
            } else {
                files.push(input.clone());
            }
        }

        Ok(files)
    }

    /// Load every input as a document, enforcing the batch limits up front.
    /// Unsupported file types are loaded too so they surface as per-document failures.
    pub async fn load_documents(&self, inputs: &[PathBuf]) -> Result<Vec<Document>> {
        let paths = self.collect_paths(inputs).await?;

        if paths.is_empty() {
            return Err(ResumeRankerError::InvalidInput("No resume files found".to_string()));
        }

        if paths.len() > self.max_documents {
            return Err(ResumeRankerError::BatchLimit(format!(
                "{} documents submitted, maximum is {}",
                paths.len(),
                self.max_documents
            )));
        }

        let mut total_bytes = 0u64;
        for path in &paths {
            total_bytes += fs::metadata(path).await?.len();
        }
        if total_bytes > self.max_total_bytes {
            return Err(ResumeRankerError::BatchLimit(format!(
                "total size {} bytes exceeds limit of {} bytes",
                total_bytes, self.max_total_bytes
            )));
        }

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            documents.push(self.load_document(path).await?);
        }

        info!("Loaded {} documents ({} bytes)", documents.len(), total_bytes);
        Ok(documents)
    }

    pub async fn load_document(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).await?;
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Document::new(id, bytes, MediaType::from_path(path)))
    }

    /// Job descriptions are usually plain text; PDF and DOCX files go through the extractor
    pub async fn read_job_description(&self, path: &Path) -> Result<String> {
        let media_type = MediaType::from_path(path);

        let text = if media_type.is_supported() {
            let bytes = fs::read(path).await?;
            DefaultTextExtractor::new().extract(&bytes, &media_type)
        } else {
            fs::read_to_string(path).await?
        };

        if text.trim().is_empty() {
            return Err(ResumeRankerError::InvalidInput(format!(
                "Job description is empty or unreadable: {}",
                path.display()
            )));
        }

        Ok(text)
    }
}
