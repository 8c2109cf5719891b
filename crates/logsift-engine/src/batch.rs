use logsift_core::{BatchStats, Enricher, NormalizedRecord, ParseError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::analyze::Analyzer;
use crate::detect::detect;
use crate::extract::extract;

/// Per-upload result: all successfully parsed records, per-line failures,
/// and batch statistics. Partial failures never truncate `records`.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<NormalizedRecord>,
    pub errors: Vec<ParseError>,
    pub stats: BatchStats,
}

/// Drives detect → extract → analyze over an ordered sequence of raw lines.
///
/// Blank and whitespace-only lines are filtered before detection. A failing
/// line is recorded as a `ParseError` and the batch continues; there are no
/// fatal errors at this level.
pub struct Pipeline {
    analyzer: Option<Analyzer>,
    enricher: Option<Box<dyn Enricher>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            analyzer: Some(Analyzer::new()),
            enricher: None,
        }
    }

    /// Pipeline that skips request analysis entirely.
    pub fn without_analysis() -> Self {
        Self {
            analyzer: None,
            enricher: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Install the external template-mining collaborator. Its output is
    /// passed through on records untouched.
    pub fn with_enricher(mut self, enricher: Box<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Process one batch. Line numbers refer to positions in the input
    /// sequence (1-based, blanks included); `total_lines` counts only
    /// non-blank lines.
    pub fn process<'a, I>(&self, lines: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut records = Vec::new();
        let mut errors: Vec<ParseError> = Vec::new();

        for (idx, line) in lines.into_iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = idx + 1;

            let kind = detect(line);
            match extract(kind, line) {
                Ok(mut record) => {
                    if let Some(analyzer) = &self.analyzer {
                        if let Some(access) = record.access_mut() {
                            if access.analysis.is_none() {
                                access.analysis = Some(analyzer.analyze(access));
                            }
                        }
                    }
                    if let Some(enricher) = &self.enricher {
                        record.enrichment = enricher.enrich(line);
                    }
                    records.push(record);
                }
                Err(err) => {
                    warn!(line_number, error = %err, "extractor failed, recording and continuing");
                    errors.push(ParseError {
                        line_number,
                        raw_line: line.to_string(),
                        error_message: err.to_string(),
                    });
                }
            }
        }

        let stats = BatchStats::new(records.len(), errors.len());
        debug!(
            total = stats.total_lines,
            parsed = stats.parsed_lines,
            failed = stats.error_lines,
            "batch complete"
        );
        BatchOutcome {
            records,
            errors,
            stats,
        }
    }

    /// Convenience wrapper over `process` for whole documents.
    pub fn process_text(&self, text: &str) -> BatchOutcome {
        self.process(text.lines())
    }
}
