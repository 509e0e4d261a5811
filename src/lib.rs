//! Resume ranker library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod output;

pub use error::{Result, ResumeRankerError};
pub use config::Config;
pub use processing::aggregator::{ScoreAggregator, ScoreResult, SummaryLabel};
pub use processing::batch::{BatchResult, BatchRunner, DocumentFailure, DocumentOutcome, FailureKind};
pub use processing::engine::MatchingEngine;
