//! Output formatters: colored console table, CSV for spreadsheets, JSON for integrations

use crate::config::OutputFormat;
use crate::error::{Result, ResumeRankerError};
use crate::output::report::{RankingReport, ResultRow};
use crate::processing::aggregator::ScoreResult;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for rendering a ranking report
pub trait OutputFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct CsvFormatter;

pub struct JsonFormatter {
    pretty: bool,
}

/// Pick the formatter for a configured output format
pub fn formatter_for(format: OutputFormat, use_colors: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors)),
        OutputFormat::Csv => Box::new(CsvFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(Color::Blue).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    /// Single-document summary used by the `score` command
    pub fn format_score(&self, document_id: &str, result: &ScoreResult, precision: u32) -> String {
        let precision = precision as usize;
        let title = if self.use_colors {
            document_id.bold().to_string()
        } else {
            document_id.to_string()
        };

        let mut output = format!("{}\n", title);
        output.push_str(&format!("  Overall score:      {:.*}\n", precision, result.overall_score));
        output.push_str(&format!("  Semantic relevance: {:.*}\n", precision, result.semantic_relevance));
        output.push_str(&format!("  Keyword coverage:   {:.*}\n", precision, result.keyword_coverage));
        output.push_str(&format!("  Matched keywords:   {}\n", result.matched_keywords.join(", ")));
        output.push_str(&format!(
            "  Summary:            {}\n",
            self.colorize(result.summary_label.as_str(), Color::Cyan)
        ));
        output
    }

    fn label_color(label: &str) -> Color {
        match label {
            "Outstanding" => Color::Green,
            "Strong" => Color::BrightGreen,
            "Moderate" => Color::Yellow,
            "Needs Improvement" => Color::BrightYellow,
            _ => Color::Red,
        }
    }

    fn format_row(&self, report: &RankingReport, row: &ResultRow) -> String {
        // Pad before coloring so escape codes don't break alignment
        let label = format!("{:<17}", row.summary_label);
        let mut line = format!(
            "{:>5}  {:<32} {:>8} {:>9} {:>9}  {}",
            row.rank,
            truncate(&row.document_id, 32),
            report.format_score(row.overall_score),
            report.format_score(row.semantic_relevance),
            report.format_score(row.keyword_coverage),
            self.colorize(&label, Self::label_color(&row.summary_label)),
        );

        if !row.matched_keywords.is_empty() {
            line.push_str(&format!("  {}", row.matched_keywords));
        }
        line.push('\n');

        if let Some(contact) = &row.contact {
            let details: Vec<&str> = [&contact.name, &contact.email, &contact.phone, &contact.linkedin, &contact.github]
                .into_iter()
                .map(String::as_str)
                .filter(|value| !value.is_empty())
                .collect();
            if !details.is_empty() {
                line.push_str(&format!("       {}\n", self.colorize(&details.join(" | "), Color::Cyan)));
            }
        }

        line
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let meta = &report.metadata;
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME RANKING"));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            meta.processing_time_ms
        ));
        output.push_str(&format!(
            "Documents: {} submitted, {} scored, {} failed\n",
            meta.total_documents, meta.scored_documents, meta.failed_documents
        ));

        if meta.job_keywords.is_empty() {
            output.push_str("Job keywords: none found\n");
        } else {
            output.push_str(&format!("Job keywords: {}\n", meta.job_keywords.join(", ")));
        }

        output.push_str(&self.format_header("Ranking"));
        if report.rows.is_empty() {
            output.push_str(&self.colorize("No documents could be scored.\n", Color::Yellow));
        } else {
            output.push_str(&format!(
                "{:>5}  {:<32} {:>8} {:>9} {:>9}  {:<17}  {}\n",
                "Rank", "Document", "Overall", "Semantic", "Keywords", "Summary", "Matched"
            ));
            for row in &report.rows {
                output.push_str(&self.format_row(report, row));
            }
        }

        if !report.failures.is_empty() {
            output.push_str(&self.format_header("Failed Documents"));
            for failure in &report.failures {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    self.colorize("x", Color::Red),
                    failure.document_id,
                    failure.reason
                ));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl OutputFormatter for CsvFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![
            "Rank",
            "Document",
            "Overall Score",
            "Matched Keywords",
            "Semantic Relevance",
            "Keyword Coverage",
            "Summary",
        ];
        if report.metadata.include_contacts {
            header.extend(["Name", "Email", "Phone", "LinkedIn", "GitHub"]);
        }
        writer.write_record(&header)?;

        for row in &report.rows {
            let mut record = vec![
                row.rank.clone(),
                row.document_id.clone(),
                report.format_score(row.overall_score),
                row.matched_keywords.clone(),
                report.format_score(row.semantic_relevance),
                report.format_score(row.keyword_coverage),
                row.summary_label.clone(),
            ];
            if report.metadata.include_contacts {
                let contact = row.contact.clone().unwrap_or_default();
                record.extend([contact.name, contact.email, contact.phone, contact.linkedin, contact.github]);
            }
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ResumeRankerError::OutputFormatting(format!("Failed to flush CSV: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ResumeRankerError::OutputFormatting(format!("CSV output is not UTF-8: {}", e)))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Csv
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, timestamp: bool) -> String {
    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("ranking{}.txt", timestamp_suffix),
        OutputFormat::Csv => format!("ranking{}.csv", timestamp_suffix),
        OutputFormat::Json => format!("ranking{}.json", timestamp_suffix),
    }
}
