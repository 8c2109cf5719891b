use logsift_core::{NormalizedRecord, RecordKind};

/// Extract a comma-delimited Windows event line: timestamp, level, message.
/// Lines with fewer than two fields degrade to the INFO-default fallback.
pub fn extract(line: &str) -> NormalizedRecord {
    let mut parts = line.splitn(3, ',');
    match (parts.next(), parts.next()) {
        (Some(timestamp), Some(level)) => NormalizedRecord {
            timestamp: timestamp.trim().to_string(),
            level: level.trim().to_uppercase(),
            message: parts.next().unwrap_or("").trim().to_string(),
            raw: line.to_string(),
            enrichment: None,
            kind: RecordKind::Windows,
        },
        _ => NormalizedRecord {
            timestamp: String::new(),
            level: "INFO".to_string(),
            message: line.to_string(),
            raw: line.to_string(),
            enrichment: None,
            kind: RecordKind::Windows,
        },
    }
}
