//! Tabular ranking report built from a batch result

use crate::processing::batch::{BatchResult, DocumentFailure, RankedEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete report handed to the formatters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,
    pub rows: Vec<ResultRow>,
    pub failures: Vec<FailureRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub total_documents: usize,
    pub scored_documents: usize,
    pub failed_documents: usize,
    pub job_keywords: Vec<String>,
    /// Decimal digits used for every score
    pub precision: u32,
    pub include_contacts: bool,
}

/// One ranked document. Scores are already rounded to the report precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub rank: String,
    pub document_id: String,
    pub overall_score: f64,
    pub matched_keywords: String,
    pub semantic_relevance: f64,
    pub keyword_coverage: f64,
    pub summary_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactColumns>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactColumns {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRow {
    pub document_id: String,
    pub kind: String,
    pub reason: String,
}

impl RankingReport {
    pub fn from_batch(
        batch: &BatchResult,
        precision: u32,
        top: Option<usize>,
        include_contacts: bool,
        processing_time_ms: u64,
    ) -> Self {
        let ranked = match top {
            Some(n) => batch.top(n),
            None => batch.ranked(),
        };

        let rows = ranked
            .iter()
            .map(|entry| ResultRow::from_entry(entry, include_contacts))
            .collect();

        let failures: Vec<FailureRow> = batch.failures().into_iter().map(FailureRow::from).collect();
        let scored_documents = batch.scored_count();

        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                processing_time_ms,
                total_documents: batch.len(),
                scored_documents,
                failed_documents: failures.len(),
                job_keywords: batch.keywords().terms().to_vec(),
                precision,
                include_contacts,
            },
            rows,
            failures,
        }
    }

    /// Render a score with the report's fixed number of decimals
    pub fn format_score(&self, value: f64) -> String {
        format!("{:.*}", self.metadata.precision as usize, value)
    }
}

impl ResultRow {
    pub fn from_entry(entry: &RankedEntry<'_>, include_contacts: bool) -> Self {
        let contact = if include_contacts {
            Some(
                entry
                    .contact
                    .map(|c| ContactColumns {
                        name: c.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                        email: c.emails.join(", "),
                        phone: c.phones.join(", "),
                        linkedin: c.linkedin.clone().unwrap_or_default(),
                        github: c.github.clone().unwrap_or_default(),
                    })
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        Self {
            rank: entry.ordinal(),
            document_id: entry.document_id.to_string(),
            overall_score: entry.result.overall_score,
            matched_keywords: entry.result.matched_keywords.join(", "),
            semantic_relevance: entry.result.semantic_relevance,
            keyword_coverage: entry.result.keyword_coverage,
            summary_label: entry.result.summary_label.to_string(),
            contact,
        }
    }
}

impl From<&DocumentFailure> for FailureRow {
    fn from(failure: &DocumentFailure) -> Self {
        Self {
            document_id: failure.document_id.clone(),
            kind: failure.kind.code().to_string(),
            reason: failure.kind.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::aggregator::{ScoreResult, SummaryLabel};
    use crate::processing::batch::{DocumentOutcome, FailureKind, ScoredDocument};
    use crate::processing::contact::ContactDetails;

    fn sample_batch() -> BatchResult {
        let result = |score: f64, matched: &[&str]| ScoreResult {
            overall_score: score,
            matched_keywords: matched.iter().map(|s| s.to_string()).collect(),
            keyword_coverage: 100.0,
            semantic_relevance: 75.0,
            summary_label: SummaryLabel::from_score(score),
        };

        BatchResult::from_outcomes(vec![
            DocumentOutcome::Scored(ScoredDocument {
                document_id: "alice.pdf".to_string(),
                result: result(72.5, &["Python", "AWS"]),
                contact: Some(ContactDetails {
                    name: Some("Alice".to_string()),
                    emails: vec!["alice@example.com".to_string()],
                    ..Default::default()
                }),
            }),
            DocumentOutcome::failed("photo.png", FailureKind::UnsupportedFormat {
                media_type: "png".to_string(),
            }),
            DocumentOutcome::Scored(ScoredDocument {
                document_id: "bob.docx".to_string(),
                result: result(88.0, &["Python"]),
                contact: None,
            }),
        ])
    }

    #[test]
    fn test_rows_follow_rank_order() {
        let report = RankingReport::from_batch(&sample_batch(), 1, None, true, 12);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].rank, "1st");
        assert_eq!(report.rows[0].document_id, "bob.docx");
        assert_eq!(report.rows[1].matched_keywords, "Python, AWS");
        assert_eq!(report.rows[1].contact.as_ref().unwrap().email, "alice@example.com");
        assert!(report.rows[0].contact.as_ref().unwrap().name.is_empty());

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, "unsupported_format");
        assert_eq!(report.metadata.failed_documents, 1);
    }

    #[test]
    fn test_top_and_contacts_toggle() {
        let report = RankingReport::from_batch(&sample_batch(), 3, Some(1), false, 0);
        assert_eq!(report.rows.len(), 1);
        assert!(report.rows[0].contact.is_none());
        assert_eq!(report.format_score(88.0), "88.000");
    }
}
