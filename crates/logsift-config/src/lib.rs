use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// TOML data model
// ---------------------------------------------------------------------------

/// Request-analysis tuning. The built-in suspicious-path and bot
/// vocabularies are fixed; extras are appended after them.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Run the request analyzer on access records (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extra URL-path tokens to treat as suspicious.
    #[serde(default)]
    pub extra_suspicious_paths: Vec<String>,
    /// Extra user-agent tokens to treat as automated tools.
    #[serde(default)]
    pub extra_bot_tokens: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            extra_suspicious_paths: Vec::new(),
            extra_bot_tokens: Vec::new(),
        }
    }
}

/// Metrics aggregation tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Truncation for "top" tables (default: 10).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

/// Top-level TOML config file (`logsift.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsiftConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_true() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
pub fn load(path: &Path) -> Result<LogsiftConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse a TOML string into a LogsiftConfig.
pub fn parse(toml_str: &str) -> Result<LogsiftConfig> {
    let config: LogsiftConfig = toml::from_str(toml_str)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &LogsiftConfig) -> Result<()> {
    if config.metrics.top_n == 0 {
        return Err(ConfigError::Validation(
            "metrics.top_n must be >= 1".into(),
        ));
    }
    for token in config
        .analysis
        .extra_suspicious_paths
        .iter()
        .chain(&config.analysis.extra_bot_tokens)
    {
        if token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "analysis token must not be empty".into(),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
