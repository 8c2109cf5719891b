use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use logsift_core::{
    AccessDetail, LogsiftError, NormalizedRecord, RecordKind, RequestType, ThreatAnnotation,
    ThreatLevel,
};
use regex::Regex;

/// Named log shapes, tried strictly in this order; the first match wins.
/// The order is load-bearing: the common shape is a structural prefix of the
/// combined/nginx shapes, so lines in those formats match it first and carry
/// empty referer/user-agent fields. Reordering is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Common,
    Combined,
    Custom,
    Nginx,
    ErrorLog,
}

static RE_COMMON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(\S+) \S+ \S+ \[([^\]]+)\] "([^"]*)" (\d+) (\S+)"#).unwrap());
static RE_COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) \S+ \S+ \[([^\]]+)\] "([^"]*)" (\d+) (\S+) "([^"]*)" "([^"]*)""#).unwrap()
});
static RE_CUSTOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) - - \[([^\]]+)\] "([^"]*)" (\d+) (\d+) "([^"]*)" "([^"]*)" (\d+)"#)
        .unwrap()
});
static RE_NGINX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) - \S+ \[([^\]]+)\] "([^"]*)" (\d+) (\d+) "([^"]*)" "([^"]*)""#).unwrap()
});
static RE_ERROR_LOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\] \[([^\]]+)\] \[client (\S+)\] (.*)$").unwrap());

fn shapes() -> [(Shape, &'static Regex); 5] {
    [
        (Shape::Common, &RE_COMMON),
        (Shape::Combined, &RE_COMBINED),
        (Shape::Custom, &RE_CUSTOM),
        (Shape::Nginx, &RE_NGINX),
        (Shape::ErrorLog, &RE_ERROR_LOG),
    ]
}

// Fallback scavenging patterns for lines matching none of the named shapes.
static RE_IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap());
static RE_QUOTED_STATUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"" (\d{3}) "#).unwrap());
static RE_BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());
static RE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// Prioritized native timestamp patterns; the first that parses wins.
const TS_FORMATS: [&str; 4] = [
    "%d/%b/%Y:%H:%M:%S %z",
    "%d/%b/%Y:%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y:%H:%M:%S %z",
];

/// Extract an Apache/Nginx access or error log line.
pub fn extract(line: &str) -> Result<NormalizedRecord, LogsiftError> {
    for (shape, re) in shapes() {
        if let Some(caps) = re.captures(line) {
            return match shape {
                Shape::ErrorLog => Ok(extract_error_log(&caps, line)),
                _ => extract_access(shape, &caps, line),
            };
        }
    }
    Ok(extract_fallback(line))
}

fn extract_access(
    shape: Shape,
    caps: &regex::Captures<'_>,
    line: &str,
) -> Result<NormalizedRecord, LogsiftError> {
    let ip = caps[1].to_string();
    let timestamp_str = caps[2].to_string();
    let request = &caps[3];
    let status_code: u32 = caps[4]
        .parse()
        .map_err(|_| LogsiftError::Malformed(format!("status code out of range: {}", &caps[4])))?;
    let response_size = parse_size(&caps[5]);

    let (referer, user_agent, response_time) = match shape {
        Shape::Combined | Shape::Nginx => (
            clean_field(&caps[6]).to_string(),
            clean_field(&caps[7]).to_string(),
            0,
        ),
        Shape::Custom => (
            clean_field(&caps[6]).to_string(),
            clean_field(&caps[7]).to_string(),
            caps[8].parse().unwrap_or(0),
        ),
        _ => (String::new(), String::new(), 0),
    };

    let req = parse_request(request);
    let message = if req.decoded.is_empty() {
        line.to_string()
    } else {
        req.decoded.clone()
    };

    Ok(NormalizedRecord {
        timestamp: timestamp_str.clone(),
        level: "INFO".to_string(),
        message,
        raw: line.to_string(),
        enrichment: None,
        kind: RecordKind::Apache(AccessDetail {
            ip,
            method: req.method,
            url: req.url,
            protocol: req.protocol,
            query_params: req.query_params,
            status_code,
            response_size,
            referer,
            user_agent,
            response_time,
            time: parse_timestamp(&timestamp_str),
            analysis: None,
        }),
    })
}

/// Error-log lines carry no request to analyze; they are unconditionally
/// tagged medium/error/suspicious and bypass the request analyzer.
fn extract_error_log(caps: &regex::Captures<'_>, line: &str) -> NormalizedRecord {
    let timestamp_str = caps[1].to_string();
    let level = caps[2].to_uppercase();
    let ip = caps[3].to_string();
    let message = caps[4].to_string();

    NormalizedRecord {
        timestamp: timestamp_str.clone(),
        level,
        message: message.clone(),
        raw: line.to_string(),
        enrichment: None,
        kind: RecordKind::Apache(AccessDetail {
            ip,
            method: "ERROR".to_string(),
            url: String::new(),
            protocol: String::new(),
            query_params: String::new(),
            status_code: 500,
            response_size: 0,
            referer: String::new(),
            user_agent: String::new(),
            response_time: 0,
            time: parse_timestamp(&timestamp_str),
            analysis: Some(ThreatAnnotation {
                threat_level: ThreatLevel::Medium,
                request_type: RequestType::Error,
                is_suspicious: true,
                attack_indicators: Vec::new(),
            }),
        }),
    }
}

/// Best-effort scavenging for lines matching none of the named shapes:
/// combine whatever an IPv4 address, a quoted status, a bracketed timestamp,
/// and a quoted request string yield.
fn extract_fallback(line: &str) -> NormalizedRecord {
    let ip = RE_IPV4
        .find(line)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let status_code = RE_QUOTED_STATUS
        .captures(line)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    let timestamp_str = RE_BRACKETED
        .captures(line)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let request = RE_QUOTED
        .captures(line)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| line.to_string());

    let req = parse_request(&request);
    let message = if req.decoded.is_empty() {
        line.to_string()
    } else {
        req.decoded.clone()
    };

    NormalizedRecord {
        timestamp: timestamp_str.clone(),
        level: "INFO".to_string(),
        message,
        raw: line.to_string(),
        enrichment: None,
        kind: RecordKind::Apache(AccessDetail {
            ip,
            method: req.method,
            url: req.url,
            protocol: req.protocol,
            query_params: req.query_params,
            status_code,
            response_size: 0,
            referer: String::new(),
            user_agent: String::new(),
            response_time: 0,
            time: parse_timestamp(&timestamp_str),
            analysis: None,
        }),
    }
}

struct RequestParts {
    decoded: String,
    method: String,
    url: String,
    protocol: String,
    query_params: String,
}

/// Split an HTTP request line into method/url/protocol; the URL is
/// percent-decoded and the query string separated at the first `?`.
fn parse_request(request: &str) -> RequestParts {
    let decoded = percent_decode(request);
    let mut parts = decoded.split_whitespace();

    let method = parts.next().unwrap_or("").to_uppercase();
    let (url, query_params) = match parts.next() {
        Some(target) => match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        },
        None => (String::new(), String::new()),
    };
    let protocol = parts.next().unwrap_or("").to_string();

    RequestParts {
        decoded: decoded.clone(),
        method,
        url,
        protocol,
        query_params,
    }
}

/// Minimal percent-decoder. Malformed escapes pass through verbatim and
/// decoded bytes that are not valid UTF-8 are replaced.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Response size of `-` or anything non-numeric normalizes to 0.
fn parse_size(size: &str) -> u64 {
    if size == "-" {
        return 0;
    }
    size.parse().unwrap_or(0)
}

fn clean_field(field: &str) -> &str {
    if field == "-" {
        ""
    } else {
        field
    }
}

/// Convert a native timestamp to a canonical point-in-time for bucketing,
/// trying the prioritized formats in order. Lines whose timestamp parses
/// with none of them bucket at ingestion time; the native string stays
/// untouched on the record.
pub fn parse_timestamp(timestamp_str: &str) -> DateTime<Utc> {
    if timestamp_str.is_empty() {
        return Utc::now();
    }
    for fmt in TS_FORMATS {
        if fmt.contains("%z") {
            if let Ok(dt) = DateTime::parse_from_str(timestamp_str, fmt) {
                return dt.with_timezone(&Utc);
            }
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp_str, fmt) {
            return Utc.from_utc_datetime(&naive);
        }
    }
    Utc::now()
}
