//! Matching engine: scores one document against a prepared job description

use crate::config::Config;
use crate::error::Result;
use crate::input::media_type::MediaType;
use crate::input::text_extractor::{DefaultTextExtractor, TextExtractor};
use crate::processing::aggregator::{ScoreAggregator, ScoreResult};
use crate::processing::batch::{DocumentOutcome, FailureKind, ScoredDocument};
use crate::processing::contact::ContactExtractor;
use crate::processing::document::Document;
use crate::processing::keywords::{KeywordExtractor, KeywordSet};
use crate::processing::normalizer::TextNormalizer;
use crate::processing::similarity::{embedder_from_config, Embedder, SimilarityScorer};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Job-description embedding computed once per batch
#[derive(Debug, Clone, PartialEq)]
pub enum JobEmbedding {
    /// The normalized job description is blank; semantic relevance is 0
    Empty,
    Ready(Vec<f32>),
    /// Embedding failed after every retry; each document reports it
    Unavailable { attempts: u32, reason: String },
}

/// Read-only artifacts shared by every document in a batch
#[derive(Debug, Clone)]
pub struct JobProfile {
    pub raw_text: String,
    pub normalized_text: String,
    pub keywords: KeywordSet,
    pub embedding: JobEmbedding,
}

pub struct MatchingEngine {
    extractor: Arc<dyn TextExtractor>,
    normalizer: TextNormalizer,
    keyword_extractor: KeywordExtractor,
    similarity: SimilarityScorer,
    aggregator: ScoreAggregator,
    contacts: Option<ContactExtractor>,
    embedding_retries: u32,
    retry_backoff: Duration,
}

impl MatchingEngine {
    /// Build with the default PDF/DOCX extractor and the configured embedder
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = embedder_from_config(config)?;
        Self::with_components(config, Arc::new(DefaultTextExtractor::new()), embedder)
    }

    pub fn with_components(
        config: &Config,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let keyword_extractor = KeywordExtractor::new(&config.keywords)?;
        let similarity = SimilarityScorer::new(embedder);

        info!(
            "Matching engine ready: embedder={}, vocabulary={} terms, top_n={}",
            similarity.embedder_name(),
            keyword_extractor.vocabulary_size(),
            keyword_extractor.top_n()
        );

        Ok(Self {
            extractor,
            normalizer: TextNormalizer::new(),
            keyword_extractor,
            similarity,
            aggregator: ScoreAggregator::from_config(&config.scoring),
            contacts: config.output.include_contacts.then(ContactExtractor::new),
            embedding_retries: config.batch.embedding_retries,
            retry_backoff: Duration::from_millis(config.batch.retry_backoff_ms),
        })
    }

    /// Disable or enable contact extraction for scored documents
    pub fn with_contacts(mut self, enabled: bool) -> Self {
        self.contacts = enabled.then(ContactExtractor::new);
        self
    }

    pub fn prepare_job(&self, job_description: &str) -> JobProfile {
        let start_time = Instant::now();
        let normalized_text = self.normalizer.normalize(job_description);

        let embedding = if normalized_text.is_empty() {
            JobEmbedding::Empty
        } else {
            match self.embed_with_retry(&normalized_text) {
                Ok(vector) => JobEmbedding::Ready(vector),
                Err(FailureKind::EmbeddingFailed { attempts, reason }) => {
                    warn!("Job description embedding unavailable: {}", reason);
                    JobEmbedding::Unavailable { attempts, reason }
                }
                Err(other) => JobEmbedding::Unavailable {
                    attempts: 1,
                    reason: other.to_string(),
                },
            }
        };

        let job = self.job_without_embedding(job_description, embedding);
        info!(
            "Prepared job description: {} keywords in {:.2?}",
            job.keywords.len(),
            start_time.elapsed()
        );
        debug!("Job keywords: {:?}", job.keywords.terms());
        job
    }

    /// Keywords and normalized text for a job description, paired with an
    /// embedding computed elsewhere (or given up on)
    pub fn job_without_embedding(&self, job_description: &str, embedding: JobEmbedding) -> JobProfile {
        JobProfile {
            raw_text: job_description.to_string(),
            normalized_text: self.normalizer.normalize(job_description),
            keywords: self.keyword_extractor.extract(job_description),
            embedding,
        }
    }

    pub fn keywords(&self, job_description: &str) -> KeywordSet {
        self.keyword_extractor.extract(job_description)
    }

    /// Single-document entry point; prepares the job description on every call
    pub fn score_one(
        &self,
        bytes: &[u8],
        media_type: &MediaType,
        job_description: &str,
    ) -> std::result::Result<ScoreResult, FailureKind> {
        let job = self.prepare_job(job_description);
        let text = self.extract_text(bytes, media_type)?;
        self.score_text(&job, &text)
    }

    pub fn score_document(&self, job: &JobProfile, document: &Document) -> DocumentOutcome {
        let scored = self
            .extract_text(&document.bytes, &document.media_type)
            .and_then(|text| {
                let result = self.score_text(job, &text)?;
                Ok((result, text))
            });

        match scored {
            Ok((result, text)) => {
                debug!(
                    "Scored {}: {:.1} ({})",
                    document.id, result.overall_score, result.summary_label
                );
                DocumentOutcome::Scored(ScoredDocument {
                    document_id: document.id.clone(),
                    result,
                    contact: self.contacts.as_ref().map(|c| c.extract(&text)),
                })
            }
            Err(kind) => {
                warn!("Failed to score {}: {}", document.id, kind);
                DocumentOutcome::failed(document.id.clone(), kind)
            }
        }
    }

    /// Unsupported types and blank extraction results are failures, never zero scores
    pub fn extract_text(&self, bytes: &[u8], media_type: &MediaType) -> std::result::Result<String, FailureKind> {
        if !media_type.is_supported() {
            return Err(FailureKind::UnsupportedFormat {
                media_type: media_type.to_string(),
            });
        }

        let text = self.extractor.extract(bytes, media_type);
        if text.trim().is_empty() {
            return Err(FailureKind::NoTextExtracted);
        }
        Ok(text)
    }

    /// Score already-extracted resume text. Keyword matching uses the raw
    /// text; semantic comparison uses the normalized text.
    pub fn score_text(&self, job: &JobProfile, text: &str) -> std::result::Result<ScoreResult, FailureKind> {
        if text.trim().is_empty() {
            return Err(FailureKind::NoTextExtracted);
        }

        let normalized = self.normalizer.normalize(text);

        let similarity = match &job.embedding {
            JobEmbedding::Unavailable { attempts, reason } => {
                return Err(FailureKind::EmbeddingFailed {
                    attempts: *attempts,
                    reason: format!("job description: {}", reason),
                });
            }
            JobEmbedding::Empty => 0.0,
            JobEmbedding::Ready(_) if normalized.is_empty() => 0.0,
            JobEmbedding::Ready(job_vector) => {
                let resume_vector = self.embed_with_retry(&normalized)?;
                SimilarityScorer::bounded(job_vector, &resume_vector)
                    .map_err(|e| FailureKind::Scoring { reason: e.to_string() })?
            }
        };

        let matched = job.keywords.matched_in(text);
        Ok(self.aggregator.aggregate(matched, job.keywords.len(), similarity))
    }

    /// Embedding failures are treated as transient and retried with linear backoff
    fn embed_with_retry(&self, normalized_text: &str) -> std::result::Result<Vec<f32>, FailureKind> {
        let attempts = self.embedding_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.similarity.embed(normalized_text) {
                Ok(Some(vector)) => return Ok(vector),
                Ok(None) => {
                    return Err(FailureKind::Scoring {
                        reason: "cannot embed blank text".to_string(),
                    })
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < attempts {
                        warn!("Embedding attempt {}/{} failed: {}", attempt, attempts, last_error);
                        thread::sleep(self.retry_backoff * attempt);
                    }
                }
            }
        }

        Err(FailureKind::EmbeddingFailed {
            attempts,
            reason: last_error,
        })
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::error::ResumeRankerError;
    use crate::processing::similarity::HashEmbedder;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct PlainText;

    impl TextExtractor for PlainText {
        fn extract(&self, bytes: &[u8], _media_type: &MediaType) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }
    }

    /// Fails the first `failures` calls, then behaves like the hash embedder
    struct FlakyEmbedder {
        failures: u32,
        calls: AtomicU32,
        inner: HashEmbedder,
    }

    impl Embedder for FlakyEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ResumeRankerError::Embedding("backend unavailable".to_string()));
            }
            self.inner.embed(text)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    /// Produces vectors poisoned with NaN
    struct NanEmbedder;

    impl Embedder for NanEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![f32::NAN, 1.0, 0.0])
        }

        fn name(&self) -> &str {
            "nan"
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.models.embedding_backend = EmbeddingBackend::Hash;
        config.batch.retry_backoff_ms = 1;
        config
    }

    fn engine_with(embedder: Arc<dyn Embedder>) -> MatchingEngine {
        MatchingEngine::with_components(&test_config(), Arc::new(PlainText), embedder).unwrap()
    }

    const JOB: &str = "Looking for a Python developer with AWS and Docker experience, 3+ years";

    #[test]
    fn test_scenario_full_coverage() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        let result = engine
            .score_one(
                b"Experienced Python engineer, used Docker and AWS extensively",
                &MediaType::Pdf,
                JOB,
            )
            .unwrap();

        assert_eq!(result.matched_keywords, vec!["Python", "Docker", "AWS"]);
        assert_eq!(result.keyword_coverage, 100.0);
        assert!(result.overall_score >= 40.0);
    }

    #[test]
    fn test_empty_resume_is_a_failure() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        assert_eq!(
            engine.score_one(b"   ", &MediaType::Pdf, JOB),
            Err(FailureKind::NoTextExtracted)
        );
    }

    #[test]
    fn test_unsupported_format_is_distinct() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        let result = engine.score_one(b"Python", &MediaType::parse("image/png"), JOB);
        assert!(matches!(result, Err(FailureKind::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_punctuation_only_resume_scores_zero_similarity() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        let result = engine.score_one(b"!!! ???", &MediaType::Docx, JOB).unwrap();
        assert_eq!(result.semantic_relevance, 0.0);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_empty_job_description_uses_default_coverage() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        let job = engine.prepare_job("");
        assert_eq!(job.embedding, JobEmbedding::Empty);

        for _ in 0..3 {
            let result = engine.score_text(&job, "Python developer").unwrap();
            assert_eq!(result.keyword_coverage, 0.0);
            assert_eq!(result.overall_score, 0.0);
        }
    }

    #[test]
    fn test_transient_embedding_failures_are_retried() {
        let embedder = Arc::new(FlakyEmbedder {
            failures: 2,
            calls: AtomicU32::new(0),
            inner: HashEmbedder::default(),
        });
        let engine = engine_with(embedder.clone());

        let job = engine.prepare_job(JOB);
        assert!(matches!(job.embedding, JobEmbedding::Ready(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exhausted_retries_become_document_failures() {
        let embedder = Arc::new(FlakyEmbedder {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            inner: HashEmbedder::default(),
        });
        let engine = engine_with(embedder);

        let job = engine.prepare_job(JOB);
        assert!(matches!(job.embedding, JobEmbedding::Unavailable { attempts: 3, .. }));

        let outcome = engine.score_document(&job, &Document::new("a.pdf", b"Python".to_vec(), MediaType::Pdf));
        match outcome {
            DocumentOutcome::Failed(failure) => {
                assert_eq!(failure.document_id, "a.pdf");
                assert!(matches!(failure.kind, FailureKind::EmbeddingFailed { attempts: 3, .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_embeddings_fail_the_document() {
        let engine = engine_with(Arc::new(NanEmbedder));
        let job = engine.prepare_job(JOB);

        match engine.score_document(&job, &Document::new("nan.pdf", b"Python".to_vec(), MediaType::Pdf)) {
            DocumentOutcome::Failed(failure) => {
                assert!(matches!(failure.kind, FailureKind::Scoring { .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_contacts_follow_scored_documents() {
        let engine = engine_with(Arc::new(HashEmbedder::default()));
        let job = engine.prepare_job(JOB);
        let document = Document::new("jane.pdf", b"Jane Doe\njane@example.com\nPython".to_vec(), MediaType::Pdf);

        match engine.score_document(&job, &document) {
            DocumentOutcome::Scored(scored) => {
                let contact = scored.contact.unwrap();
                assert_eq!(contact.name.as_deref(), Some("Jane Doe"));
                assert_eq!(contact.emails, vec!["jane@example.com"]);
            }
            other => panic!("expected score, got {:?}", other),
        }

        let engine = engine_with(Arc::new(HashEmbedder::default())).with_contacts(false);
        match engine.score_document(&job, &document) {
            DocumentOutcome::Scored(scored) => assert!(scored.contact.is_none()),
            other => panic!("expected score, got {:?}", other),
        }
    }
}
