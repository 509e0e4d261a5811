//! Integration tests for the resume ranker

use resume_ranker::config::{Config, EmbeddingBackend};
use resume_ranker::input::manager::InputManager;
use resume_ranker::input::media_type::MediaType;
use resume_ranker::input::text_extractor::{DefaultTextExtractor, TextExtractor};
use resume_ranker::output::formatter::{CsvFormatter, OutputFormatter};
use resume_ranker::output::report::RankingReport;
use resume_ranker::processing::batch::BatchOptions;
use resume_ranker::processing::document::Document;
use resume_ranker::processing::similarity::{Embedder, HashEmbedder};
use resume_ranker::{BatchRunner, FailureKind, MatchingEngine};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const JOB: &str = "Looking for a Python developer with AWS and Docker experience, 3+ years";

/// Treats every supported document as UTF-8 text, with two trigger payloads
/// for exercising worker failures.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], _media_type: &MediaType) -> String {
        match bytes {
            b"PANIC" => panic!("extractor blew up"),
            b"SLOW" => {
                std::thread::sleep(Duration::from_millis(400));
                "Python".to_string()
            }
            _ => String::from_utf8_lossy(bytes).to_string(),
        }
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.models.embedding_backend = EmbeddingBackend::Hash;
    config.batch.max_workers = 4;
    config.batch.retry_backoff_ms = 1;
    config
}

fn runner_with(extractor: Arc<dyn TextExtractor>, options: BatchOptions) -> BatchRunner {
    let config = test_config();
    let engine = MatchingEngine::with_components(&config, extractor, Arc::new(HashEmbedder::default())).unwrap();
    BatchRunner::new(Arc::new(engine), options)
}

fn runner() -> BatchRunner {
    runner_with(Arc::new(PlainTextExtractor), BatchOptions::from_config(&test_config().batch))
}

fn pdf(id: &str, text: &str) -> Document {
    Document::new(id, text.as_bytes().to_vec(), MediaType::Pdf)
}

fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(r#"<?xml version="1.0"?><w:document><w:body>{}</w:body></w:document>"#, body);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_full_keyword_coverage_scenario() {
    let batch = runner()
        .run(
            vec![pdf("candidate.pdf", "Experienced Python engineer, used Docker and AWS extensively")],
            JOB,
        )
        .await
        .unwrap();

    assert!(batch.keywords().contains("Python"));
    assert!(batch.keywords().contains("AWS"));
    assert!(batch.keywords().contains("Docker"));

    let ranked = batch.ranked();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].result.matched_keywords.len(), batch.keywords().len());
    assert_eq!(ranked[0].result.keyword_coverage, 100.0);
    assert!(ranked[0].result.overall_score >= 40.0);
    assert!(ranked[0].result.overall_score <= 100.0);
}

#[tokio::test]
async fn test_ranking_is_stable_under_reordering() {
    let documents = vec![
        pdf("strong.pdf", "Python developer with AWS and Docker in production"),
        pdf("twin_a.pdf", "Python scripting"),
        pdf("weak.pdf", "Pastry chef specialising in French desserts"),
        pdf("twin_b.pdf", "Python scripting"),
    ];
    let mut reversed = documents.clone();
    reversed.reverse();

    let forward = runner().run(documents, JOB).await.unwrap();
    let backward = runner().run(reversed, JOB).await.unwrap();

    let scores = |batch: &resume_ranker::BatchResult| -> HashMap<String, f64> {
        batch
            .ranked()
            .iter()
            .map(|entry| (entry.document_id.to_string(), entry.result.overall_score))
            .collect()
    };
    assert_eq!(scores(&forward), scores(&backward));

    // Identical documents tie; submission order decides their relative rank
    let order = |batch: &resume_ranker::BatchResult| -> Vec<String> {
        batch
            .ranked()
            .iter()
            .map(|entry| entry.document_id.to_string())
            .filter(|id| id.starts_with("twin"))
            .collect()
    };
    assert_eq!(order(&forward), vec!["twin_a.pdf", "twin_b.pdf"]);
    assert_eq!(order(&backward), vec!["twin_b.pdf", "twin_a.pdf"]);

    let ranked = forward.ranked();
    assert_eq!(ranked[0].document_id, "strong.pdf");
    assert_eq!(ranked[0].ordinal(), "1st");
    assert_eq!(ranked.last().unwrap().document_id, "weak.pdf");
    assert_eq!(ranked.last().unwrap().ordinal(), "4th");

    // Outcomes stay in submission order
    assert_eq!(forward.outcomes()[0].document_id(), "strong.pdf");
    assert_eq!(backward.outcomes()[0].document_id(), "twin_b.pdf");
}

#[tokio::test]
async fn test_batch_with_nothing_scored_still_succeeds() {
    let batch = runner()
        .run(vec![pdf("a.pdf", ""), pdf("b.pdf", "   \n ")], JOB)
        .await
        .unwrap();

    assert!(batch.ranked().is_empty());
    assert_eq!(batch.failures().len(), 2);
    assert!(batch
        .failures()
        .iter()
        .all(|failure| failure.kind == FailureKind::NoTextExtracted));
}

#[tokio::test]
async fn test_failure_kinds_are_distinguished() {
    let options = BatchOptions {
        max_workers: 4,
        document_timeout: Duration::from_millis(100),
    };
    let runner = runner_with(Arc::new(PlainTextExtractor), options);

    let documents = vec![
        Document::new("photo.png", b"Python".to_vec(), MediaType::from_extension("png")),
        pdf("blank.pdf", ""),
        pdf("crash.pdf", "PANIC"),
        pdf("slow.pdf", "SLOW"),
        pdf("good.pdf", "Python and AWS"),
    ];

    let batch = runner.run(documents, JOB).await.unwrap();
    let kinds: HashMap<&str, &FailureKind> = batch
        .failures()
        .into_iter()
        .map(|failure| (failure.document_id.as_str(), &failure.kind))
        .collect();

    assert!(matches!(kinds["photo.png"], FailureKind::UnsupportedFormat { .. }));
    assert_eq!(kinds["blank.pdf"], &FailureKind::NoTextExtracted);
    assert!(matches!(kinds["crash.pdf"], FailureKind::Scoring { .. }));
    assert_eq!(kinds["slow.pdf"], &FailureKind::Timeout { after_ms: 100 });

    let ranked = batch.ranked();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].document_id, "good.pdf");
}

/// Sleeps on every extraction and records how many ran at once
#[derive(Default)]
struct ConcurrencyTracker {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl TextExtractor for ConcurrencyTracker {
    fn extract(&self, bytes: &[u8], _media_type: &MediaType) -> String {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(150));
        self.active.fetch_sub(1, Ordering::SeqCst);
        String::from_utf8_lossy(bytes).to_string()
    }
}

#[tokio::test]
async fn test_timed_out_work_keeps_its_worker_slot() {
    let tracker = Arc::new(ConcurrencyTracker::default());
    let options = BatchOptions {
        max_workers: 1,
        document_timeout: Duration::from_millis(20),
    };
    let runner = runner_with(tracker.clone(), options);

    let documents = (0..4).map(|i| pdf(&format!("slow{}.pdf", i), "Python")).collect();
    let batch = runner.run(documents, JOB).await.unwrap();

    assert_eq!(batch.failures().len(), 4);
    assert!(batch
        .failures()
        .iter()
        .all(|failure| failure.kind == FailureKind::Timeout { after_ms: 20 }));
    assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
}

/// Never answers within the batch timeout
struct StalledEmbedder;

impl Embedder for StalledEmbedder {
    fn embed(&self, _text: &str) -> resume_ranker::Result<Vec<f32>> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec![1.0, 0.0])
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

#[tokio::test]
async fn test_stalled_job_embedding_is_bounded_by_timeout() {
    let mut config = test_config();
    config.batch.embedding_retries = 0;
    let engine =
        MatchingEngine::with_components(&config, Arc::new(PlainTextExtractor), Arc::new(StalledEmbedder)).unwrap();
    let options = BatchOptions {
        max_workers: 2,
        document_timeout: Duration::from_millis(50),
    };
    let runner = BatchRunner::new(Arc::new(engine), options);

    let batch = runner
        .run(vec![pdf("a.pdf", "Python"), pdf("b.pdf", "AWS")], JOB)
        .await
        .unwrap();

    assert!(batch.keywords().contains("Python"));
    assert!(batch.ranked().is_empty());
    assert!(batch
        .failures()
        .iter()
        .all(|failure| matches!(failure.kind, FailureKind::EmbeddingFailed { .. })));
}

#[tokio::test]
async fn test_empty_job_description_uses_default_coverage() {
    for _ in 0..2 {
        let batch = runner()
            .run(vec![pdf("a.pdf", "Python developer"), pdf("b.pdf", "Rust developer")], "")
            .await
            .unwrap();

        assert!(batch.keywords().is_empty());
        for entry in batch.ranked() {
            assert_eq!(entry.result.keyword_coverage, 0.0);
            assert_eq!(entry.result.semantic_relevance, 0.0);
            assert!(entry.result.matched_keywords.is_empty());
        }
    }
}

#[tokio::test]
async fn test_docx_resumes_from_disk_to_csv() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("alice.docx"),
        build_docx(&["Alice Smith", "alice@example.com", "Python, AWS and Docker engineer"]),
    )
    .unwrap();
    std::fs::write(
        temp_dir.path().join("bob.docx"),
        build_docx(&["Bob Jones", "Java developer"]),
    )
    .unwrap();
    std::fs::write(temp_dir.path().join("notes.txt"), "Python").unwrap();

    let config = test_config();
    let documents = InputManager::from_config(&config.batch)
        .load_documents(&[temp_dir.path().to_path_buf()])
        .await
        .unwrap();
    assert_eq!(documents.len(), 3);

    let runner = runner_with(
        Arc::new(DefaultTextExtractor::new()),
        BatchOptions::from_config(&config.batch),
    );
    let batch = runner.run(documents, JOB).await.unwrap();

    let ranked = batch.ranked();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].document_id, "alice.docx");
    assert_eq!(ranked[0].contact.and_then(|c| c.name.as_deref()), Some("Alice Smith"));
    assert_eq!(batch.failures().len(), 1);
    assert_eq!(batch.failures()[0].document_id, "notes.txt");

    let report = RankingReport::from_batch(&batch, config.scoring.precision, None, true, 0);
    let csv = CsvFormatter.format_report(&report).unwrap();
    let mut lines = csv.lines().skip(1);
    let first = lines.next().unwrap();
    assert!(first.starts_with("1st,alice.docx,"));
    assert!(first.contains("\"Python, Docker, AWS\""));
    assert!(first.contains("alice@example.com"));
    assert!(lines.next().unwrap().starts_with("2nd,bob.docx,"));
}

#[test]
fn test_score_one_rejects_unreadable_bytes() {
    let config = test_config();
    let engine = MatchingEngine::with_components(
        &config,
        Arc::new(DefaultTextExtractor::new()),
        Arc::new(HashEmbedder::default()),
    )
    .unwrap();

    let result = engine.score_one(b"\x00\x01 not a pdf", &MediaType::Pdf, JOB);
    assert_eq!(result, Err(FailureKind::NoTextExtracted));
}
