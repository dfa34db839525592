//! Error types for the flow engine and session orchestrator.

use parla_core::{FlowId, ParlaError};

/// Errors from the flow engine.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("assistant is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("unknown flow: {0}")]
    UnknownFlow(FlowId),
    #[error("option {option_id} is not on flow {flow}")]
    UnknownOption { flow: FlowId, option_id: String },
    #[error("session state error: {0}")]
    SessionState(String),
}

impl From<FlowError> for ParlaError {
    fn from(err: FlowError) -> Self {
        ParlaError::Flow(err.to_string())
    }
}
