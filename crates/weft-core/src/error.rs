use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    // Strategy errors
    #[error("strategy invocation failed: {0}")]
    Strategy(String),

    // Graph errors
    #[error("graph build error: {0}")]
    GraphBuild(String),

    #[error("graph execution failed in node '{node}': {message}")]
    GraphNode { node: String, message: String },

    // Task errors
    #[error("invalid task transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    // Event errors
    #[error("event sink closed")]
    SinkClosed,

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WeftError>;
