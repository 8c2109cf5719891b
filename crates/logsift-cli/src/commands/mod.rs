pub mod metrics;
pub mod parse;
pub mod threats;

use std::path::Path;

use logsift_config::LogsiftConfig;
use logsift_core::LogsiftError;
use logsift_engine::{Analyzer, MetricsAggregator, Pipeline};

pub fn load_config(path: Option<&Path>) -> Result<LogsiftConfig, LogsiftError> {
    match path {
        Some(p) => logsift_config::load(p).map_err(|e| LogsiftError::Config(e.to_string())),
        None => Ok(LogsiftConfig::default()),
    }
}

pub fn build_pipeline(config: &LogsiftConfig) -> Pipeline {
    if !config.analysis.enabled {
        return Pipeline::without_analysis();
    }
    Pipeline::new().with_analyzer(Analyzer::with_extras(
        &config.analysis.extra_suspicious_paths,
        &config.analysis.extra_bot_tokens,
    ))
}

pub fn build_aggregator(config: &LogsiftConfig) -> MetricsAggregator {
    MetricsAggregator::with_top_n(config.metrics.top_n)
}

pub fn read_text(path: &Path) -> Result<String, LogsiftError> {
    Ok(std::fs::read_to_string(path)?)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
