/// Logsift error types
#[derive(Debug, thiserror::Error)]
pub enum LogsiftError {
    #[error("malformed line: {0}")]
    Malformed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
