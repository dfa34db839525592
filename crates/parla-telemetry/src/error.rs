//! Error types for the event-store client.

use parla_core::ParlaError;

/// Failures talking to the remote event store.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("event store returned status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TelemetryError {
    fn from(err: reqwest::Error) -> Self {
        TelemetryError::Transport(err.to_string())
    }
}

impl From<TelemetryError> for ParlaError {
    fn from(err: TelemetryError) -> Self {
        ParlaError::Telemetry(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_error_display() {
        assert_eq!(
            TelemetryError::Transport("timed out".into()).to_string(),
            "transport error: timed out"
        );
        assert_eq!(
            TelemetryError::Status(503).to_string(),
            "event store returned status 503"
        );
        assert_eq!(
            TelemetryError::Decode("expected array".into()).to_string(),
            "decode error: expected array"
        );
    }

    #[test]
    fn test_telemetry_error_into_parla_error() {
        let err: ParlaError = TelemetryError::Status(500).into();
        assert!(matches!(err, ParlaError::Telemetry(_)));
    }
}
