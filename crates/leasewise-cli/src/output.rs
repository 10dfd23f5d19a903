//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::workspace::Cached;
use colored::*;
use leasewise_domain::traits::QaRecord;
use leasewise_domain::{AnswerWithSources, Usage};
use leasewise_rag::{ExtractionOutcome, LoadReport, SessionStats, SummaryOutcome};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style, Width},
};

const PREVIEW_CHARS: usize = 160;
const CELL_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of loading a contract.
    pub fn format_load(&self, report: &LoadReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(report),
            OutputFormat::Quiet => Ok(report.doc_id.clone()),
            OutputFormat::Table => {
                let stats = &report.stats;
                let mut out = self.success(&format!("{} {}", stats.file_name, report.status));
                out.push('\n');
                out.push_str(&key_value_table([
                    ("Pages", stats.pages.to_string()),
                    ("Characters", stats.characters.to_string()),
                    ("Chunks", stats.chunks.to_string()),
                    ("Avg chunk size", stats.avg_chunk_size.to_string()),
                    ("Backend", stats.backend.clone()),
                ]));
                Ok(out)
            }
        }
    }

    /// Format an answer with its cited sources.
    pub fn format_answer(&self, answer: &AnswerWithSources) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(answer),
            OutputFormat::Quiet => Ok(answer.answer.clone()),
            OutputFormat::Table => {
                let mut out = answer.answer.clone();
                if answer.sources.is_empty() {
                    return Ok(out);
                }

                let mut builder = Builder::default();
                builder.push_record(["#", "Page", "Score", "Excerpt"]);
                for (i, source) in answer.sources.iter().enumerate() {
                    builder.push_record([
                        (i + 1).to_string(),
                        (source.chunk.page + 1).to_string(),
                        source.score.to_string(),
                        source.preview(PREVIEW_CHARS),
                    ]);
                }
                out.push_str("\n\n");
                out.push_str(&self.colorize("Sources:", "cyan"));
                out.push('\n');
                out.push_str(&table(builder));
                out.push_str(&self.usage_line(&answer.usage));
                Ok(out)
            }
        }
    }

    /// Format a summary.
    pub fn format_summary(&self, summary: &Cached<SummaryOutcome>) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(summary),
            OutputFormat::Quiet => Ok(summary.value.text.clone()),
            OutputFormat::Table => {
                let outcome = &summary.value;
                let mut out = self.colorize(&format!("{} summary", outcome.kind), "cyan");
                out.push_str("\n\n");
                out.push_str(&outcome.text);
                if outcome.is_partial() {
                    out.push_str("\n\n");
                    out.push_str(&self.warning(&format!(
                        "Summary covers the first {} of {} chunks",
                        outcome.chunks_used, outcome.total_chunks
                    )));
                }
                if summary.cached {
                    out.push('\n');
                    out.push_str(&self.info("Cached result"));
                } else {
                    out.push_str(&self.usage_line(&outcome.usage));
                }
                Ok(out)
            }
        }
    }

    /// Format an extraction record.
    pub fn format_extraction(&self, extraction: &Cached<ExtractionOutcome>) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(&extraction.value.record),
            OutputFormat::Quiet => Ok(extraction
                .value
                .record
                .iter()
                .map(|(field, value)| format!("{}={}", field.key(), value))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let outcome = &extraction.value;
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value", ""]);
                for (field, value) in outcome.record.iter() {
                    let marker = if outcome.backfilled.contains(&field) {
                        "backfilled"
                    } else {
                        ""
                    };
                    builder.push_record([field.label(), value, marker]);
                }
                let mut out = table(builder);
                if extraction.cached {
                    out.push('\n');
                    out.push_str(&self.info("Cached result"));
                } else {
                    out.push_str(&self.usage_line(&outcome.usage));
                }
                Ok(out)
            }
        }
    }

    /// Format session statistics.
    pub fn format_stats(&self, stats: &SessionStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(stats),
            OutputFormat::Quiet => Ok(stats.total_chunks.to_string()),
            OutputFormat::Table => Ok(key_value_table([
                (
                    "Active document",
                    stats.active_document.clone().unwrap_or_else(|| "-".to_string()),
                ),
                ("Loaded contracts", stats.loaded_contracts.to_string()),
                ("Total chunks", stats.total_chunks.to_string()),
                ("Vector index size", stats.vector_index_size.to_string()),
                ("Memory turns", stats.memory_turns.to_string()),
            ])),
        }
    }

    /// Format stored question/answer history, newest first.
    pub fn format_history(&self, records: &[QaRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(&records),
            OutputFormat::Quiet => Ok(records
                .iter()
                .map(|r| r.question.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No questions asked yet.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Question", "Answer", "Tokens"]);
                for record in records {
                    builder.push_record([
                        record.question.clone(),
                        record.answer.clone(),
                        record.usage.total_tokens().to_string(),
                    ]);
                }
                Ok(table(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn usage_line(&self, usage: &Usage) -> String {
        if usage.total_tokens() == 0 {
            return String::new();
        }
        let mut line = format!("{} tokens", usage.total_tokens());
        if usage.cost > 0.0 {
            line.push_str(&format!(", ${:.4}", usage.cost));
        }
        format!("\n{}", self.colorize(&line, "magenta"))
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(CELL_WIDTH)))
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn key_value_table<const N: usize>(rows: [(&str, String); N]) -> String {
    let mut builder = Builder::default();
    for (key, value) in rows {
        builder.push_record([key.to_string(), value]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_domain::{
        AnswerStatus, Chunk, ContractField, DocumentStats, ExtractionRecord, ScoredSource,
        SummaryKind,
    };
    use leasewise_rag::LoadStatus;

    fn answer() -> AnswerWithSources {
        AnswerWithSources {
            answer: "The monthly rent is $2,500.".to_string(),
            sources: vec![ScoredSource {
                chunk: Chunk::new("/lease.txt", 0, "Monthly rent: $2,500, due on the 1st.", "plain-text"),
                score: 22,
                matched: vec!["2,500".to_string()],
            }],
            usage: Usage::new(100, 10),
            status: AnswerStatus::Answered,
        }
    }

    fn report() -> LoadReport {
        LoadReport {
            doc_id: "/data/lease.txt".to_string(),
            status: LoadStatus::FromCache,
            stats: DocumentStats {
                file_name: "lease.txt".to_string(),
                pages: 10,
                characters: 12000,
                chunks: 7,
                backend: "plain-text".to_string(),
                avg_chunk_size: 1714,
            },
        }
    }

    #[test]
    fn test_answer_table_lists_sources() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_answer(&answer()).unwrap();
        assert!(output.starts_with("The monthly rent is $2,500."));
        assert!(output.contains("Sources:"));
        assert!(output.contains("Monthly rent"));
        assert!(output.contains("110 tokens"));
    }

    #[test]
    fn test_answer_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_answer(&answer()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "answered");
        assert_eq!(value["sources"][0]["score"], 22);
    }

    #[test]
    fn test_quiet_answer_is_text_only() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(
            formatter.format_answer(&answer()).unwrap(),
            "The monthly rent is $2,500."
        );
    }

    #[test]
    fn test_load_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_load(&report()).unwrap();
        assert!(output.starts_with("✓ lease.txt loaded from cache"));
        assert!(output.contains("plain-text"));
    }

    #[test]
    fn test_partial_summary_warns() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let summary = Cached {
            value: SummaryOutcome {
                kind: SummaryKind::Brief,
                text: "A twelve month lease.".to_string(),
                chunks_used: 10,
                total_chunks: 14,
                usage: Usage::default(),
            },
            cached: false,
        };
        let output = formatter.format_summary(&summary).unwrap();
        assert!(output.contains("first 10 of 14 chunks"));
    }

    #[test]
    fn test_extraction_quiet_lists_every_field() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let mut record = ExtractionRecord::new();
        record.set(ContractField::RentAmount, "$2,500");
        let extraction = Cached {
            value: ExtractionOutcome {
                record,
                backfilled: Vec::new(),
                usage: Usage::default(),
            },
            cached: true,
        };
        let output = formatter.format_extraction(&extraction).unwrap();
        assert_eq!(output.lines().count(), ContractField::ALL.len());
        assert!(output.contains("rent_amount=$2,500"));
    }

    #[test]
    fn test_empty_history() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_history(&[]).unwrap().contains("No questions"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
