use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluxionError {
    #[error("Blocked egress: {0}")]
    BlockedEgress(String),

    #[error("Retries exhausted: {0}")]
    RetriesExhausted(String),

    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid flow spec: {0}")]
    InvalidSpec(String),

    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
