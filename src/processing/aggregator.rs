//! Score aggregation: blends keyword coverage and semantic relevance

use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative verdict derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryLabel {
    Outstanding,
    Strong,
    Moderate,
    NeedsImprovement,
    Unsatisfactory,
}

impl SummaryLabel {
    /// Strict lower bounds: exactly 80.0 is Strong, not Outstanding
    pub fn from_score(overall_score: f64) -> Self {
        if overall_score > 80.0 {
            SummaryLabel::Outstanding
        } else if overall_score > 65.0 {
            SummaryLabel::Strong
        } else if overall_score > 50.0 {
            SummaryLabel::Moderate
        } else if overall_score > 35.0 {
            SummaryLabel::NeedsImprovement
        } else {
            SummaryLabel::Unsatisfactory
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLabel::Outstanding => "Outstanding",
            SummaryLabel::Strong => "Strong",
            SummaryLabel::Moderate => "Moderate",
            SummaryLabel::NeedsImprovement => "Needs Improvement",
            SummaryLabel::Unsatisfactory => "Unsatisfactory",
        }
    }
}

impl fmt::Display for SummaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring outcome for one document. All scores are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub overall_score: f64,
    pub matched_keywords: Vec<String>,
    pub keyword_coverage: f64,
    pub semantic_relevance: f64,
    pub summary_label: SummaryLabel,
}

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    semantic_weight: f64,
    keyword_weight: f64,
    empty_keyword_score: f64,
    precision: u32,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self {
            semantic_weight: 0.60,
            keyword_weight: 0.40,
            empty_keyword_score: 0.0,
            precision: 1,
        }
    }
}

impl ScoreAggregator {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            semantic_weight: config.semantic_weight,
            keyword_weight: config.keyword_weight,
            empty_keyword_score: config.empty_keyword_score,
            precision: config.precision,
        }
    }

    pub fn aggregate(
        &self,
        matched_keywords: Vec<String>,
        keyword_set_size: usize,
        semantic_similarity: f32,
    ) -> ScoreResult {
        // NaN would pass through clamp untouched
        let similarity = if semantic_similarity.is_finite() {
            semantic_similarity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let semantic_score = f64::from(similarity) * 100.0;

        let keyword_score = if keyword_set_size > 0 {
            let matched = matched_keywords.len().min(keyword_set_size);
            100.0 * matched as f64 / keyword_set_size as f64
        } else {
            self.empty_keyword_score
        };

        let blended = self.semantic_weight * semantic_score + self.keyword_weight * keyword_score;
        let overall_score = self.round(blended.clamp(0.0, 100.0));

        ScoreResult {
            overall_score,
            matched_keywords,
            keyword_coverage: self.round(keyword_score),
            semantic_relevance: self.round(semantic_score),
            summary_label: SummaryLabel::from_score(overall_score),
        }
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
