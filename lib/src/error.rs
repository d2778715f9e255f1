use thiserror::Error;

/// Failure kinds surfaced by the scheduling engine and its loaders.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration unreadable or key missing: {0}")]
    ConfigMissing(String),

    #[error("failed to parse environment setting: {0}")]
    EnvironmentParse(String),

    #[error("no workflow files found: {0}")]
    WorkflowNotFound(String),

    #[error("failed to parse workflow file: {0}")]
    WorkflowParse(String),

    #[error("violated the precedence constraint: all predecessors must already be completed")]
    PrecedenceViolation,

    #[error("task list cannot be empty")]
    EmptyTaskList,

    #[error("makespan must be greater than zero")]
    ZeroMakespan,

    #[error("invalid computation cost: less than or equal to zero")]
    ZeroComputation,

    #[error("failed to write result file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
