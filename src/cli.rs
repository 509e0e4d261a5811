//! CLI interface for the resume ranker

use crate::config::{EmbeddingBackend, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(about = "Rank resumes against a job description")]
#[command(long_about = "Score PDF and DOCX resumes against a job description by blending semantic similarity with keyword coverage, then rank the candidate pool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Where the job description comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct JobSource {
    /// Path to the job description (TXT, MD, PDF, DOCX)
    #[arg(short, long)]
    pub job: Option<PathBuf>,

    /// Job description given inline
    #[arg(long)]
    pub job_text: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank a pool of resumes against one job description
    Rank {
        #[command(flatten)]
        job: JobSource,

        /// Resume files or directories containing them
        #[arg(required = true)]
        resumes: Vec<PathBuf>,

        /// Output format: console, csv, json
        #[arg(short, long, value_parser = parse_output_format)]
        format: Option<OutputFormat>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Only show the top N candidates
        #[arg(short, long)]
        top: Option<usize>,

        /// Number of documents scored concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-document timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip contact extraction
        #[arg(long)]
        no_contacts: bool,

        #[command(flatten)]
        embedding: EmbeddingArgs,
    },

    /// Score a single resume
    Score {
        #[command(flatten)]
        job: JobSource,

        /// Path to resume file (PDF, DOCX)
        resume: PathBuf,

        #[command(flatten)]
        embedding: EmbeddingArgs,
    },

    /// Show the keywords extracted from a job description
    Keywords {
        #[command(flatten)]
        job: JobSource,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

impl Commands {
    /// `config reset` and `config path` must work even when the file is broken
    pub fn needs_config(&self) -> bool {
        !matches!(
            self,
            Commands::Config {
                action: Some(ConfigAction::Reset | ConfigAction::Path)
            }
        )
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct EmbeddingArgs {
    /// Embedding model to use (Hugging Face repo id or local path)
    #[arg(short, long)]
    pub embedding: Option<String>,

    /// Use the offline hashed embedder instead of a model
    #[arg(long)]
    pub offline: bool,
}

impl EmbeddingArgs {
    pub fn backend_override(&self) -> Option<EmbeddingBackend> {
        self.offline.then_some(EmbeddingBackend::Hash)
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, csv, json", format)),
    }
}
