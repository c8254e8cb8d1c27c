use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("malformed tool call: {fragment}")]
    MalformedCall { fragment: String },
    #[error("invalid tool call: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("dataset integrity error: {0}")]
    DataIntegrity(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
