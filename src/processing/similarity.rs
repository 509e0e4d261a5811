//! Embedding-based semantic similarity

use crate::config::{Config, EmbeddingBackend};
use crate::error::{Result, ResumeRankerError};
use log::info;
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Text to fixed-length vector. Must be deterministic for identical input.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

/// Model2Vec static embeddings, loaded from a local folder or the Hugging Face Hub
pub struct Model2VecEmbedder {
    model: StaticModel,
    model_name: String,
}

impl Model2VecEmbedder {
    pub fn load(model_path: &Path) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e| ResumeRankerError::ModelLoading(format!("Failed to load model: {}", e)))?;

        info!("Model loaded successfully in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_path.display().to_string(),
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.encode_single(text);
        if embedding.is_empty() {
            return Err(ResumeRankerError::Embedding("model returned an empty vector".to_string()));
        }
        Ok(embedding)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Hashed bag-of-words vectors. No model download; useful offline and in tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 512 }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dim];

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut h: u64 = 1469598103934665603;
            for b in token.as_bytes() {
                h ^= *b as u64;
                h = h.wrapping_mul(1099511628211);
            }
            v[(h as usize) % self.dim] += 1.0;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }

        Ok(v)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Build the embedder selected by configuration
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.models.embedding_backend {
        EmbeddingBackend::Hash => Ok(Arc::new(HashEmbedder::new(config.models.hash_dimensions))),
        EmbeddingBackend::Model2Vec => {
            let location = config.embedding_model_location();
            Ok(Arc::new(Model2VecEmbedder::load(&location)?))
        }
    }
}

/// Cosine similarity between two embeddings. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ResumeRankerError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Semantic similarity in [0, 1] between normalized texts.
///
/// Blank input short-circuits to 0.0 without touching the embedder. Negative
/// cosine values are clamped to 0.0.
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// `None` for blank text, which never reaches the embedder
    pub fn embed(&self, normalized_text: &str) -> Result<Option<Vec<f32>>> {
        if normalized_text.trim().is_empty() {
            return Ok(None);
        }
        self.embedder.embed(normalized_text).map(Some)
    }

    pub fn similarity(&self, text_a: &str, text_b: &str) -> Result<f32> {
        if text_a.trim().is_empty() || text_b.trim().is_empty() {
            return Ok(0.0);
        }
        let a = self.embedder.embed(text_a)?;
        let b = self.embedder.embed(text_b)?;
        Self::bounded(&a, &b)
    }

    /// Similarity against a precomputed embedding, e.g. the job description's
    pub fn similarity_to(&self, reference: &[f32], text: &str) -> Result<f32> {
        match self.embed(text)? {
            Some(embedding) => Self::bounded(reference, &embedding),
            None => Ok(0.0),
        }
    }

    /// Non-finite cosine values come from a broken embedding and are rejected
    pub fn bounded(a: &[f32], b: &[f32]) -> Result<f32> {
        let cosine = cosine_similarity(a, b)?;
        if !cosine.is_finite() {
            return Err(ResumeRankerError::Embedding(format!(
                "Embedding produced a non-finite similarity: {}",
                cosine
            )));
        }
        Ok(cosine.clamp(0.0, 1.0))
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }
}
