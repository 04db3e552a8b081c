use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiEngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Data source error from {source_name}: {message}")]
    DataSource { source_name: String, message: String },

    #[error("Data fetch timeout for {what}")]
    FetchTimeout { what: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, KpiEngineError>;
