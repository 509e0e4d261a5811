//! Matching pipeline: normalization, keywords, similarity, aggregation and batching

pub mod document;
pub mod normalizer;
pub mod keywords;
pub mod similarity;
pub mod aggregator;
pub mod contact;
pub mod engine;
pub mod batch;
