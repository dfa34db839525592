//! Event store client: the only writer/reader of the interaction log.
//!
//! The remote store is append-only; events are never mutated or deleted, and
//! `fetch_all` returns them in no particular order. Consumers that care
//! about sequence sort by timestamp.

use async_trait::async_trait;
use tokio::sync::Mutex;

use parla_core::ChatMetricEvent;

use crate::error::TelemetryError;

/// The interaction log, as seen by this core: append one event, or pull the
/// whole log back.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    async fn append(&self, event: &ChatMetricEvent) -> Result<(), TelemetryError>;

    /// Returns the full event array, unordered.
    async fn fetch_all(&self) -> Result<Vec<ChatMetricEvent>, TelemetryError>;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// reqwest-backed client for the remote event store API.
pub struct HttpEventStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventStore {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat_metrics", self.endpoint)
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn append(&self, event: &ChatMetricEvent) -> Result<(), TelemetryError> {
        let response = self.client.post(self.url()).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ChatMetricEvent>, TelemetryError> {
        let response = self.client.get(self.url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        response
            .json::<Vec<ChatMetricEvent>>()
            .await
            .map_err(|e| TelemetryError::Decode(e.to_string()))
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-memory store for tests and offline runs.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<ChatMetricEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &ChatMetricEvent) -> Result<(), TelemetryError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ChatMetricEvent>, TelemetryError> {
        Ok(self.events.lock().await.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
