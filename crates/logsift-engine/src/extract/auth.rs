use std::sync::LazyLock;

use logsift_core::{NormalizedRecord, RecordKind};
use regex::Regex;

// Syslog-style prefix, e.g. "Mar  6 06:18:01" (day-of-month may be padded
// with a second space).
static RE_SYSLOG_TS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{3}\s+\d{1,2} \d{1,2}:\d{2}:\d{2}").unwrap());

/// Extract an sshd/auth log line.
pub fn extract(line: &str) -> NormalizedRecord {
    let timestamp = RE_SYSLOG_TS
        .find(line)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let lower = line.to_lowercase();
    let level = if lower.contains("failed") {
        "ERROR"
    } else if lower.contains("accepted") {
        "SUCCESS"
    } else {
        "INFO"
    };

    let message = match line.split_once("sshd") {
        Some((_, rest)) => rest.trim().to_string(),
        None => line.to_string(),
    };

    NormalizedRecord {
        timestamp,
        level: level.to_string(),
        message,
        raw: line.to_string(),
        enrichment: None,
        kind: RecordKind::Auth,
    }
}
