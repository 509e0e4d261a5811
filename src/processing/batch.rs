//! Batch scoring over a candidate pool with per-document failure isolation

use crate::config::BatchConfig;
use crate::error::{Result, ResumeRankerError};
use crate::processing::aggregator::ScoreResult;
use crate::processing::contact::ContactDetails;
use crate::processing::document::Document;
use crate::processing::engine::{JobEmbedding, JobProfile, MatchingEngine};
use crate::processing::keywords::KeywordSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Why a document produced no score
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    #[error("Unsupported file type: {media_type}")]
    UnsupportedFormat { media_type: String },

    #[error("No text extracted")]
    NoTextExtracted,

    #[error("Embedding failed after {attempts} attempt(s): {reason}")]
    EmbeddingFailed { attempts: u32, reason: String },

    #[error("Scoring failed: {reason}")]
    Scoring { reason: String },

    #[error("Timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl FailureKind {
    /// Stable machine-readable name, matching the serialized tag
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedFormat { .. } => "unsupported_format",
            FailureKind::NoTextExtracted => "no_text_extracted",
            FailureKind::EmbeddingFailed { .. } => "embedding_failed",
            FailureKind::Scoring { .. } => "scoring",
            FailureKind::Timeout { .. } => "timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document_id: String,
    #[serde(flatten)]
    pub kind: FailureKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_id: String,
    pub result: ScoreResult,
    pub contact: Option<ContactDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentOutcome {
    Scored(ScoredDocument),
    Failed(DocumentFailure),
}

impl DocumentOutcome {
    pub fn failed(document_id: impl Into<String>, kind: FailureKind) -> Self {
        DocumentOutcome::Failed(DocumentFailure {
            document_id: document_id.into(),
            kind,
        })
    }

    pub fn document_id(&self) -> &str {
        match self {
            DocumentOutcome::Scored(scored) => &scored.document_id,
            DocumentOutcome::Failed(failure) => &failure.document_id,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, DocumentOutcome::Scored(_))
    }
}

/// One row of the ranking. Rank is positional and 1-based.
#[derive(Debug, Clone, Copy)]
pub struct RankedEntry<'a> {
    pub rank: usize,
    pub document_id: &'a str,
    pub result: &'a ScoreResult,
    pub contact: Option<&'a ContactDetails>,
}

impl RankedEntry<'_> {
    pub fn ordinal(&self) -> String {
        ordinal(self.rank)
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Outcomes in submission order. Ranking is derived on demand so it always
/// reflects the current outcome set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    keywords: KeywordSet,
    outcomes: Vec<DocumentOutcome>,
}

impl BatchResult {
    pub fn new(keywords: KeywordSet, outcomes: Vec<DocumentOutcome>) -> Self {
        Self { keywords, outcomes }
    }

    pub fn from_outcomes(outcomes: Vec<DocumentOutcome>) -> Self {
        Self::new(KeywordSet::default(), outcomes)
    }

    pub fn push(&mut self, outcome: DocumentOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn outcomes(&self) -> &[DocumentOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Scored documents by overall score, descending. The sort is stable so
    /// equal scores keep submission order.
    pub fn ranked(&self) -> Vec<RankedEntry<'_>> {
        let mut scored: Vec<&ScoredDocument> = self
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                DocumentOutcome::Scored(scored) => Some(scored),
                DocumentOutcome::Failed(_) => None,
            })
            .collect();

        scored.sort_by(|a, b| b.result.overall_score.total_cmp(&a.result.overall_score));

        scored
            .into_iter()
            .enumerate()
            .map(|(index, scored)| RankedEntry {
                rank: index + 1,
                document_id: &scored.document_id,
                result: &scored.result,
                contact: scored.contact.as_ref(),
            })
            .collect()
    }

    pub fn top(&self, n: usize) -> Vec<RankedEntry<'_>> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    pub fn failures(&self) -> Vec<&DocumentFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                DocumentOutcome::Failed(failure) => Some(failure),
                DocumentOutcome::Scored(_) => None,
            })
            .collect()
    }

    pub fn scored_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_scored()).count()
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub max_workers: usize,
    pub document_timeout: Duration,
}

impl BatchOptions {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            document_timeout: Duration::from_secs(config.document_timeout_secs),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().batch)
    }
}

pub struct BatchRunner {
    engine: Arc<MatchingEngine>,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(engine: Arc<MatchingEngine>, options: BatchOptions) -> Self {
        Self { engine, options }
    }

    pub async fn run(&self, documents: Vec<Document>, job_description: &str) -> Result<BatchResult> {
        self.run_with_progress(documents, job_description, |_| {}).await
    }

    /// `on_complete` fires in completion order; the result is still in
    /// submission order.
    pub async fn run_with_progress<F>(
        &self,
        documents: Vec<Document>,
        job_description: &str,
        on_complete: F,
    ) -> Result<BatchResult>
    where
        F: Fn(&DocumentOutcome),
    {
        let start_time = Instant::now();
        let total = documents.len();
        info!(
            "Scoring {} documents with up to {} workers",
            total, self.options.max_workers
        );

        let job = Arc::new(self.prepare_job(job_description).await?);
        if let JobEmbedding::Unavailable { reason, .. } = &job.embedding {
            warn!("Every document will fail: job description embedding unavailable ({})", reason);
        }
        let keywords = job.keywords.clone();

        let document_ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let mut slots: Vec<Option<DocumentOutcome>> = (0..total).map(|_| None).collect();

        let semaphore = Arc::new(Semaphore::new(self.options.max_workers.max(1)));
        let timeout = self.options.document_timeout;
        let mut tasks = JoinSet::new();

        for (index, document) in documents.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let job = Arc::clone(&job);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let document_id = document.id.clone();
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let kind = FailureKind::Scoring {
                            reason: "worker pool closed".to_string(),
                        };
                        return (index, DocumentOutcome::failed(document_id, kind));
                    }
                };

                // The blocking work keeps running after a timeout and holds its
                // permit until it actually returns; only the result is dropped
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    engine.score_document(&job, &document)
                });

                let outcome = match tokio::time::timeout(timeout, work).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(join_error)) => DocumentOutcome::failed(
                        document_id,
                        FailureKind::Scoring {
                            reason: format!("worker panicked: {}", join_error),
                        },
                    ),
                    Err(_) => DocumentOutcome::failed(
                        document_id,
                        FailureKind::Timeout {
                            after_ms: timeout.as_millis() as u64,
                        },
                    ),
                };

                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    on_complete(&outcome);
                    slots[index] = Some(outcome);
                }
                Err(e) => warn!("Batch task failed: {}", e),
            }
        }

        let outcomes: Vec<DocumentOutcome> = slots
            .into_iter()
            .zip(document_ids)
            .map(|(slot, document_id)| {
                slot.unwrap_or_else(|| {
                    DocumentOutcome::failed(
                        document_id,
                        FailureKind::Scoring {
                            reason: "no result reported".to_string(),
                        },
                    )
                })
            })
            .collect();

        let result = BatchResult::new(keywords, outcomes);
        info!(
            "Batch finished in {:.2?}: {} scored, {} failed",
            start_time.elapsed(),
            result.scored_count(),
            result.len() - result.scored_count()
        );

        Ok(result)
    }

    /// Job preparation gets the same time limit as a single document. On
    /// expiry the batch proceeds without a job embedding.
    async fn prepare_job(&self, job_description: &str) -> Result<JobProfile> {
        let engine = Arc::clone(&self.engine);
        let owned = job_description.to_string();
        let timeout = self.options.document_timeout;

        let work = tokio::task::spawn_blocking(move || engine.prepare_job(&owned));

        match tokio::time::timeout(timeout, work).await {
            Ok(joined) => joined.map_err(|e| ResumeRankerError::Embedding(format!("Job preparation failed: {}", e))),
            Err(_) => Ok(self.engine.job_without_embedding(
                job_description,
                JobEmbedding::Unavailable {
                    attempts: 1,
                    reason: format!("timed out after {} ms", timeout.as_millis()),
                },
            )),
        }
    }
}
