pub mod apache;
pub mod auth;
pub mod windows;

use logsift_core::{LogsiftError, NormalizedRecord, RecordKind, SourceKind};

/// Dispatch a raw line to the extractor for its detected kind.
///
/// Adding a source kind is a controlled, exhaustive-match change here, not
/// an open parser hierarchy. Extractors are total: structural failures
/// degrade to documented fallback defaults instead of erroring; an `Err` is
/// reserved for genuinely unprocessable field content and is recorded by the
/// orchestrator without aborting the batch.
pub fn extract(kind: SourceKind, line: &str) -> Result<NormalizedRecord, LogsiftError> {
    match kind {
        SourceKind::Apache => apache::extract(line),
        SourceKind::Windows => Ok(windows::extract(line)),
        SourceKind::Auth => Ok(auth::extract(line)),
        SourceKind::Unknown => Ok(passthrough(line)),
    }
}

/// Passthrough extractor for unrecognized lines.
pub fn passthrough(line: &str) -> NormalizedRecord {
    NormalizedRecord {
        timestamp: String::new(),
        level: "INFO".to_string(),
        message: line.to_string(),
        raw: line.to_string(),
        enrichment: None,
        kind: RecordKind::Unknown,
    }
}
