use std::sync::LazyLock;

use logsift_core::SourceKind;
use regex::Regex;

// Bracketed token carrying an hh:mm:ss time, covering both access-log
// timestamps ([10/Oct/2023:13:55:36 +0000]) and error-log timestamps
// ([Wed Oct 11 14:32:52 2023]).
static RE_BRACKET_TS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\d{1,2}:\d{2}:\d{2}[^\]]*\]").unwrap());

// Leading date in dd/dd/dddd or yyyy-mm-dd shape.
static RE_WIN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})").unwrap());

const WIN_LEVEL_TOKENS: [&str; 3] = ["Information", "Warning", "Error"];

/// Classify a raw line into a source kind.
///
/// The rules are checked in a fixed order and the first match wins. The
/// order resolves ambiguous lines on purpose: an auth line containing an
/// Apache-shaped timestamp still classifies as `Auth`, and a Windows event
/// containing the word "Error" classifies as `Apache` via rule 2. Reordering
/// these rules changes classification outcomes and is a breaking change.
pub fn detect(line: &str) -> SourceKind {
    if line.contains("sshd") {
        return SourceKind::Auth;
    }
    if RE_BRACKET_TS.is_match(line) || line.to_lowercase().contains("error") {
        return SourceKind::Apache;
    }
    if RE_WIN_DATE.is_match(line) && WIN_LEVEL_TOKENS.iter().any(|t| line.contains(t)) {
        return SourceKind::Windows;
    }
    SourceKind::Unknown
}
