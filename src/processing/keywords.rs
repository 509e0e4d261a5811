//! Keyword extraction from job descriptions and coverage matching against resumes

use crate::config::KeywordConfig;
use crate::error::{Result, ResumeRankerError};
use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, case-insensitively distinct terms derived from one job description.
/// Order is extraction order, not importance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    /// Builds a set from candidate terms, keeping the first spelling of each
    /// term and at most `limit` entries.
    pub fn from_terms<I, S>(candidates: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        for candidate in candidates {
            if terms.len() >= limit {
                break;
            }
            let term = candidate.into();
            if seen.insert(term.to_lowercase()) {
                terms.push(term);
            }
        }

        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.terms.iter().any(|t| t.to_lowercase() == term)
    }

    /// Terms that occur in `text` as case-insensitive substrings, in set order
    pub fn matched_in(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| haystack.contains(&term.to_lowercase()))
            .cloned()
            .collect()
    }
}

/// Pulls salient terms out of a raw job description: capitalized words
/// (a proper-noun heuristic) followed by curated vocabulary hits.
pub struct KeywordExtractor {
    proper_noun_regex: Regex,
    vocabulary_matcher: AhoCorasick,
    vocabulary: Vec<String>,
    ignored_terms: HashSet<String>,
    top_n: usize,
}

impl KeywordExtractor {
    pub fn new(config: &KeywordConfig) -> Result<Self> {
        let pattern = format!(r"\b[A-Z][a-z]{{{},}}\b", config.min_proper_noun_len.saturating_sub(1).max(1));
        let proper_noun_regex = Regex::new(&pattern)
            .map_err(|e| ResumeRankerError::Configuration(format!("Invalid proper noun pattern: {}", e)))?;

        let vocabulary: Vec<String> = config
            .vocabulary
            .iter()
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .collect();

        let vocabulary_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&vocabulary)
            .map_err(|e| ResumeRankerError::Configuration(format!("Failed to build vocabulary matcher: {}", e)))?;

        let ignored_terms = config
            .ignored_terms
            .iter()
            .map(|term| term.to_lowercase())
            .collect();

        Ok(Self {
            proper_noun_regex,
            vocabulary_matcher,
            vocabulary,
            ignored_terms,
            top_n: config.top_n,
        })
    }

    pub fn extract(&self, job_description: &str) -> KeywordSet {
        let proper_nouns = self
            .proper_noun_regex
            .find_iter(job_description)
            .map(|m| m.as_str())
            .filter(|word| !self.ignored_terms.contains(&word.to_lowercase()))
            .map(str::to_string);

        let vocabulary_hits = self.find_vocabulary_terms(job_description);

        KeywordSet::from_terms(proper_nouns.chain(vocabulary_hits), self.top_n)
    }

    /// Whole-word vocabulary hits, reported in the vocabulary's own spelling
    pub fn find_vocabulary_terms(&self, text: &str) -> Vec<String> {
        self.vocabulary_matcher
            .find_iter(text)
            .filter(|m| is_whole_word(text, m.start(), m.end()))
            .map(|m| self.vocabulary[m.pattern().as_usize()].clone())
            .collect()
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Boundaries only apply on the sides where the matched term itself ends in a
/// word character, so "C++" and "C#" still match before punctuation.
fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];

    let starts_with_word = matched.chars().next().is_some_and(is_word_char);
    let ends_with_word = matched.chars().next_back().is_some_and(is_word_char);

    let before_ok = !starts_with_word || !text[..start].chars().next_back().is_some_and(is_word_char);
    let after_ok = !ends_with_word || !text[end..].chars().next().is_some_and(is_word_char);

    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(&Config::default().keywords).unwrap()
    }

    #[test]
    fn test_scenario_keywords() {
        let keywords = extractor()
            .extract("Looking for a Python developer with AWS and Docker experience, 3+ years");

        assert_eq!(keywords.terms(), &["Python", "Docker", "AWS"]);
        assert!(!keywords.contains("Looking"));
    }

    #[test]
    fn test_vocabulary_uses_canonical_spelling() {
        let terms = extractor().find_vocabulary_terms("we use node.js, postgresql and ci/cd with c++ and c#.");
        assert_eq!(terms, vec!["Node.js", "PostgreSQL", "CI/CD", "C++", "C#"]);
    }

    #[test]
    fn test_vocabulary_respects_word_boundaries() {
        let terms = extractor().find_vocabulary_terms("Going to Googleplex with javascript skills");
        assert_eq!(terms, vec!["JavaScript"]);
    }

    #[test]
    fn test_longest_vocabulary_term_wins() {
        let terms = extractor().find_vocabulary_terms("Deploy on Google Cloud via GitHub Actions");
        assert_eq!(terms, vec!["Google Cloud", "GitHub Actions"]);
    }

    #[test]
    fn test_deduplication_is_case_insensitive_and_ordered() {
        let keywords = extractor().extract("Kafka pipelines in Python. python and KAFKA daily. Kafka again.");
        assert_eq!(keywords.terms(), &["Kafka", "Python"]);
    }

    #[test]
    fn test_top_n_cap() {
        let mut config = Config::default().keywords;
        config.top_n = 2;
        let extractor = KeywordExtractor::new(&config).unwrap();

        let keywords = extractor.extract("Rust, Python, Docker, Kubernetes and Terraform");
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords.terms(), &["Rust", "Python"]);
    }

    #[test]
    fn test_empty_job_description() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("we need someone great, 5 years minimum").is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let keywords = KeywordSet::from_terms(["Python", "AWS", "Docker", "Kafka"], 10);
        let matched = keywords.matched_in("Experienced PYTHON engineer, used docker and aws extensively");
        assert_eq!(matched, vec!["Python", "AWS", "Docker"]);
    }

    #[test]
    fn test_from_terms_limit_counts_distinct_terms() {
        let keywords = KeywordSet::from_terms(["Go", "go", "GO", "Rust"], 2);
        assert_eq!(keywords.terms(), &["Go", "Rust"]);
    }
}
