//! Resume ranker: score and rank resumes against a job description

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_ranker::cli::{Cli, Commands, ConfigAction, EmbeddingArgs, JobSource};
use resume_ranker::config::Config;
use resume_ranker::input::manager::InputManager;
use resume_ranker::output::formatter::{formatter_for, save_report_to_file, ConsoleFormatter};
use resume_ranker::output::report::RankingReport;
use resume_ranker::processing::batch::{BatchOptions, BatchRunner};
use resume_ranker::processing::keywords::KeywordExtractor;
use resume_ranker::{MatchingEngine, Result, ResumeRankerError};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    // Load configuration
    let config = if cli.command.needs_config() {
        match Config::load_from(Some(config_path.as_path())) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Rank {
            job,
            resumes,
            format,
            save,
            top,
            workers,
            timeout,
            no_contacts,
            embedding,
        } => {
            let start_time = Instant::now();

            if let Some(workers) = workers {
                config.batch.max_workers = workers;
            }
            if let Some(timeout) = timeout {
                config.batch.document_timeout_secs = timeout;
            }
            if no_contacts {
                config.output.include_contacts = false;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if top.is_some() {
                config.output.top = top;
            }
            apply_embedding_overrides(&mut config, &embedding);
            config.validate()?;

            let input_manager = InputManager::from_config(&config.batch);
            let job_description = read_job_source(&input_manager, &job).await?;
            let documents = input_manager.load_documents(&resumes).await?;

            let engine = Arc::new(MatchingEngine::from_config(&config)?);
            let runner = BatchRunner::new(engine, BatchOptions::from_config(&config.batch));

            let progress = ProgressBar::new(documents.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let batch = runner
                .run_with_progress(documents, &job_description, |outcome| {
                    progress.set_message(outcome.document_id().to_string());
                    progress.inc(1);
                })
                .await?;
            progress.finish_and_clear();

            let report = RankingReport::from_batch(
                &batch,
                config.scoring.precision,
                config.output.top,
                config.output.include_contacts,
                start_time.elapsed().as_millis() as u64,
            );

            let formatter = formatter_for(config.output.format, config.output.color_output);
            let output = formatter.format_report(&report)?;

            match save {
                Some(path) => {
                    save_report_to_file(&output, &path)?;
                    info!("Report saved to {}", path.display());
                }
                None => print!("{}", output),
            }
        }

        Commands::Score { job, resume, embedding } => {
            apply_embedding_overrides(&mut config, &embedding);

            let input_manager = InputManager::from_config(&config.batch);
            let job_description = read_job_source(&input_manager, &job).await?;
            let document = input_manager.load_document(&resume).await?;

            let engine = MatchingEngine::from_config(&config)?.with_contacts(false);
            let result = engine
                .score_one(&document.bytes, &document.media_type, &job_description)
                .map_err(|kind| ResumeRankerError::InvalidInput(format!("{}: {}", document.id, kind)))?;

            let formatter = ConsoleFormatter::new(config.output.color_output);
            print!("{}", formatter.format_score(&document.id, &result, config.scoring.precision));
        }

        Commands::Keywords { job } => {
            let input_manager = InputManager::from_config(&config.batch);
            let job_description = read_job_source(&input_manager, &job).await?;

            let extractor = KeywordExtractor::new(&config.keywords)?;
            let keywords = extractor.extract(&job_description);

            if keywords.is_empty() {
                println!("No keywords found.");
            } else {
                for (index, term) in keywords.terms().iter().enumerate() {
                    println!("{:>3}. {}", index + 1, term);
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| ResumeRankerError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("# {}\n", config_path.display());
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(&config_path)?;
                println!("Configuration reset to defaults: {}", config_path.display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

fn apply_embedding_overrides(config: &mut Config, embedding: &EmbeddingArgs) {
    if let Some(model) = &embedding.embedding {
        config.models.embedding_model = model.clone();
    }
    if let Some(backend) = embedding.backend_override() {
        config.models.embedding_backend = backend;
    }
}

async fn read_job_source(input_manager: &InputManager, source: &JobSource) -> Result<String> {
    match (&source.job, &source.job_text) {
        (Some(path), _) => input_manager.read_job_description(path).await,
        (None, Some(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(ResumeRankerError::InvalidInput("Job description is empty".to_string())),
    }
}
