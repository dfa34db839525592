//! Error types for the generation client.

use parla_core::ParlaError;

/// Failures of the external text-generation call.
///
/// The router catches every variant; none of them propagate past it.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("quota exhausted")]
    Quota,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Transport(err.to_string())
    }
}

impl From<GenerateError> for ParlaError {
    fn from(err: GenerateError) -> Self {
        ParlaError::Assist(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_error_display() {
        assert_eq!(
            GenerateError::Transport("connection refused".into()).to_string(),
            "transport error: connection refused"
        );
        assert_eq!(GenerateError::Quota.to_string(), "quota exhausted");
        assert_eq!(
            GenerateError::MalformedResponse("missing text field".into()).to_string(),
            "malformed response: missing text field"
        );
    }

    #[test]
    fn test_generate_error_into_parla_error() {
        let err: ParlaError = GenerateError::Quota.into();
        assert!(matches!(err, ParlaError::Assist(_)));
    }
}
