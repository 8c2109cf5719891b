use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enrich::Enrichment;

/// Log family a raw line is classified into. Assigned once by the detector
/// and never revised downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Apache,
    Windows,
    Auth,
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apache => "apache",
            Self::Windows => "windows",
            Self::Auth => "auth",
            Self::Unknown => "unknown",
        }
    }
}

/// Coarse severity assigned by the request analyzer. Ordering matters:
/// escalation is one-directional, `High` is never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Raise the level to `to` if it is higher than the current one.
    pub fn escalate(&mut self, to: ThreatLevel) {
        if to > *self {
            *self = to;
        }
    }
}

/// Request category assigned by the analyzer. Only one value is retained
/// per record; the last rule evaluated wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Normal,
    AuthFailure,
    AccessDenied,
    NotFound,
    ServerError,
    DataModification,
    Error,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AuthFailure => "auth_failure",
            Self::AccessDenied => "access_denied",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
            Self::DataModification => "data_modification",
            Self::Error => "error",
        }
    }
}

/// Tag naming a detected attack pattern family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackIndicator {
    SuspiciousPath,
    SqlInjection,
    Xss,
    PathTraversal,
    CommandInjection,
    FileInclusion,
    Probing,
    AutomatedTool,
}

impl AttackIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuspiciousPath => "suspicious_path",
            Self::SqlInjection => "sql_injection",
            Self::Xss => "xss",
            Self::PathTraversal => "path_traversal",
            Self::CommandInjection => "command_injection",
            Self::FileInclusion => "file_inclusion",
            Self::Probing => "probing",
            Self::AutomatedTool => "automated_tool",
        }
    }
}

/// Threat annotation produced by the request analyzer. Indicator order is
/// detection order; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatAnnotation {
    pub threat_level: ThreatLevel,
    pub request_type: RequestType,
    pub is_suspicious: bool,
    pub attack_indicators: Vec<AttackIndicator>,
}

impl Default for ThreatAnnotation {
    fn default() -> Self {
        Self {
            threat_level: ThreatLevel::Low,
            request_type: RequestType::Normal,
            is_suspicious: false,
            attack_indicators: Vec::new(),
        }
    }
}

/// Access-log payload, present only for Apache-family records.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDetail {
    pub ip: String,
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub query_params: String,
    /// 0 when the status could not be extracted.
    pub status_code: u32,
    /// 0 when absent or logged as `-`.
    pub response_size: u64,
    pub referer: String,
    pub user_agent: String,
    /// Milliseconds; 0 unless the custom format carried one.
    pub response_time: u64,
    /// Canonical point-in-time, used for hour/day/minute bucketing. Falls
    /// back to ingestion time when the native timestamp does not parse.
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ThreatAnnotation>,
}

/// Kind-specific payload of a normalized record, tagged by source.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RecordKind {
    Apache(AccessDetail),
    Windows,
    Auth,
    Unknown,
}

/// Universal per-line output unit of the parsing pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    /// Format-native timestamp text; empty when absent.
    pub timestamp: String,
    /// Uppercased severity token; `INFO` when undetermined.
    pub level: String,
    /// Best-effort payload with prefix metadata stripped.
    pub message: String,
    /// Verbatim original line, always preserved for audit.
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
    #[serde(flatten)]
    pub kind: RecordKind,
}

impl NormalizedRecord {
    pub fn source(&self) -> SourceKind {
        match self.kind {
            RecordKind::Apache(_) => SourceKind::Apache,
            RecordKind::Windows => SourceKind::Windows,
            RecordKind::Auth => SourceKind::Auth,
            RecordKind::Unknown => SourceKind::Unknown,
        }
    }

    pub fn access(&self) -> Option<&AccessDetail> {
        match &self.kind {
            RecordKind::Apache(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn access_mut(&mut self) -> Option<&mut AccessDetail> {
        match &mut self.kind {
            RecordKind::Apache(detail) => Some(detail),
            _ => None,
        }
    }
}
