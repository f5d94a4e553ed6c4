use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlExecutorError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Build error: {0}")]
    BuildError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error(
        "Sql Results exhausted, there were {available} of them, and the processing offset reached {offset}"
    )]
    ResultsExhausted { offset: usize, available: usize },

    #[error("Unsupported type {0}")]
    UnsupportedType(String),

    #[error("Cannot submit an empty batch")]
    EmptyBatch,

    #[error("Statement was already processed")]
    AlreadyProcessed,

    #[error("Statement abandoned before processing: {0}")]
    StatementAbandoned(String),

    #[error("SQL executor is closed")]
    ExecutorClosed,
}
