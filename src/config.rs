//! Configuration management for the resume ranker

use crate::error::{Result, ResumeRankerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub keywords: KeywordConfig,
    pub scoring: ScoringConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    /// Hugging Face repo id, or a directory name under `models_dir`
    pub embedding_model: String,
    pub embedding_backend: EmbeddingBackend,
    pub hash_dimensions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Model2Vec,
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub top_n: usize,
    pub min_proper_noun_len: usize,
    /// Curated technology/process terms in their display spelling
    pub vocabulary: Vec<String>,
    /// Capitalized filler words never treated as proper nouns
    pub ignored_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub semantic_weight: f64,
    pub keyword_weight: f64,
    /// Keyword score used when the job description yields no keywords
    pub empty_keyword_score: f64,
    /// Decimal digits kept on every reported score (1..=3)
    pub precision: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_workers: usize,
    pub document_timeout_secs: u64,
    pub embedding_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_documents: usize,
    pub max_total_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
    pub top: Option<usize>,
    pub include_contacts: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Csv,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ranker")
            .join("models");

        let max_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            models: ModelConfig {
                models_dir,
                embedding_model: "minishlab/potion-base-8M".to_string(),
                embedding_backend: EmbeddingBackend::Model2Vec,
                hash_dimensions: 512,
            },
            keywords: KeywordConfig {
                top_n: 30,
                min_proper_noun_len: 3,
                vocabulary: default_vocabulary(),
                ignored_terms: default_ignored_terms(),
            },
            scoring: ScoringConfig {
                semantic_weight: 0.60,
                keyword_weight: 0.40,
                empty_keyword_score: 0.0,
                precision: 1,
            },
            batch: BatchConfig {
                max_workers,
                document_timeout_secs: 60,
                embedding_retries: 2,
                retry_backoff_ms: 200,
                max_documents: 1000,
                max_total_bytes: 100 * 1024 * 1024,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
                top: None,
                include_contacts: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit path, or the default location when `None`.
    /// A missing file is created with defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeRankerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeRankerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ranker")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        for (name, weight) in [
            ("semantic_weight", scoring.semantic_weight),
            ("keyword_weight", scoring.keyword_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ResumeRankerError::Configuration(format!(
                    "scoring.{} must be within [0, 1], got {}",
                    name, weight
                )));
            }
        }

        if (scoring.semantic_weight + scoring.keyword_weight - 1.0).abs() > 1e-6 {
            return Err(ResumeRankerError::Configuration(format!(
                "scoring weights must sum to 1.0, got {}",
                scoring.semantic_weight + scoring.keyword_weight
            )));
        }

        if !(0.0..=100.0).contains(&scoring.empty_keyword_score) {
            return Err(ResumeRankerError::Configuration(
                "scoring.empty_keyword_score must be within [0, 100]".to_string(),
            ));
        }

        if !(1..=3).contains(&scoring.precision) {
            return Err(ResumeRankerError::Configuration(format!(
                "scoring.precision must be 1, 2 or 3, got {}",
                scoring.precision
            )));
        }

        if self.keywords.top_n == 0 {
            return Err(ResumeRankerError::Configuration("keywords.top_n must be at least 1".to_string()));
        }

        if self.keywords.min_proper_noun_len < 2 {
            return Err(ResumeRankerError::Configuration(
                "keywords.min_proper_noun_len must be at least 2".to_string(),
            ));
        }

        if self.batch.max_workers == 0 {
            return Err(ResumeRankerError::Configuration("batch.max_workers must be at least 1".to_string()));
        }

        if self.models.hash_dimensions < 8 {
            return Err(ResumeRankerError::Configuration(
                "models.hash_dimensions must be at least 8".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the embedding model to a local directory when one exists,
    /// otherwise hand the identifier through as a Hugging Face repo id.
    pub fn embedding_model_location(&self) -> PathBuf {
        let local_path = self.models.models_dir.join(&self.models.embedding_model);
        if local_path.exists() {
            local_path
        } else {
            PathBuf::from(&self.models.embedding_model)
        }
    }
}

fn default_vocabulary() -> Vec<String> {
    [
        // Languages
        "Python", "Java", "JavaScript", "TypeScript", "Go", "C++", "C#", "Ruby", "Kotlin", "Swift",
        "Rust", "SQL",
        // Infrastructure and delivery
        "Docker", "Kubernetes", "Terraform", "Ansible", "Jenkins", "GitHub Actions", "GitLab CI",
        "Git", "Linux", "CI/CD",
        // Cloud platforms
        "AWS", "Azure", "GCP", "Google Cloud",
        // Frameworks
        "React", "Angular", "Vue", "Node.js", "Node", "Spring", "Django", "Flask", "TensorFlow",
        "PyTorch", "Selenium",
        // Databases
        "PostgreSQL", "MySQL", "MongoDB", "Redis",
        // Methodologies and interfaces
        "Agile", "Scrum", "Microservices", "REST", "GraphQL", "API", "Postman",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ignored_terms() -> Vec<String> {
    [
        "The", "This", "That", "These", "Our", "You", "Your", "Who", "What", "Why", "How", "And",
        "For", "With", "Will", "Are", "Must", "Should", "Can", "Looking", "Seeking", "Join",
        "Apply", "About", "Experience", "Experienced", "Required", "Requirements", "Responsibilities",
        "Preferred", "Qualifications", "Skills", "Strong", "Excellent", "Good", "Proven", "Ability",
        "Knowledge", "Familiarity", "Candidate", "Candidates", "Years", "Year", "Minimum", "Work",
        "Working", "Team", "Role", "Position", "Job", "Company", "Benefits", "Bonus", "Plus", "Nice",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.precision, 1);
        assert_eq!(config.keywords.top_n, 30);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = Config::default();
        config.scoring.semantic_weight = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_precision_bounds() {
        let mut config = Config::default();
        config.scoring.precision = 4;
        assert!(config.validate().is_err());
        config.scoring.precision = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_creates_missing_file_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let created = Config::load_from(Some(path.as_path())).unwrap();
        assert!(path.exists());

        let reloaded = Config::load_from(Some(path.as_path())).unwrap();
        assert_eq!(reloaded.keywords.vocabulary, created.keywords.vocabulary);
        assert_eq!(reloaded.output.format, OutputFormat::Console);
        assert_eq!(reloaded.models.embedding_backend, EmbeddingBackend::Model2Vec);
    }

    #[test]
    fn test_defaults_overwrite_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[scoring\nprecision = ").unwrap();
        assert!(Config::load_from(Some(path.as_path())).is_err());

        Config::default().save_to(&path).unwrap();
        let repaired = Config::load_from(Some(path.as_path())).unwrap();
        assert_eq!(repaired.scoring.precision, 1);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.batch.max_workers = 0;
        config.save_to(&path).unwrap();

        assert!(matches!(
            Config::load_from(Some(path.as_path())),
            Err(ResumeRankerError::Configuration(_))
        ));
    }
}
