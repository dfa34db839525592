//! Fire-and-forget interaction logging.
//!
//! `log` returns immediately; the append runs on a spawned task. Transport
//! failures are swallowed from the UI's point of view, but every append
//! outcome is reported on the diagnostics channel so operators can detect
//! silent data loss.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use parla_core::ChatMetricEvent;

use crate::store::EventStore;

/// Outcome of one fire-and-forget append, for the diagnostics channel only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogResult {
    Ok { event_id: Uuid },
    Failed { event_id: Uuid, error: String },
}

/// Appends one event per turn to the event store without blocking the
/// conversation.
#[derive(Clone)]
pub struct InteractionLogger {
    store: Arc<dyn EventStore>,
    diag_tx: mpsc::UnboundedSender<LogResult>,
}

impl InteractionLogger {
    /// Build a logger over `store`. The returned receiver carries one
    /// [`LogResult`] per append; dropping it is fine — results are then
    /// discarded.
    pub fn new(store: Arc<dyn EventStore>) -> (Self, mpsc::UnboundedReceiver<LogResult>) {
        let (diag_tx, diag_rx) = mpsc::unbounded_channel();
        (Self { store, diag_tx }, diag_rx)
    }

    /// Append `event`, fire-and-forget. Never blocks, never fails from the
    /// caller's point of view.
    ///
    /// Ordering across turns is best-effort: concurrent appends can arrive
    /// at the store out of order, so consumers sort by timestamp.
    pub fn log(&self, event: ChatMetricEvent) {
        let store = Arc::clone(&self.store);
        let diag_tx = self.diag_tx.clone();
        let event_id = event.id;

        tokio::spawn(async move {
            let result = match store.append(&event).await {
                Ok(()) => LogResult::Ok { event_id },
                Err(e) => {
                    debug!(event_id = %event_id, error = %e, "Event append failed");
                    LogResult::Failed {
                        event_id,
                        error: e.to_string(),
                    }
                }
            };
            // Nobody listening on diagnostics is not an error.
            let _ = diag_tx.send(result);
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use crate::store::InMemoryEventStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use parla_core::Role;

    struct FailingStore;

    #[async_trait]
    impl EventStore for FailingStore {
        async fn append(&self, _: &ChatMetricEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Status(503))
        }

        async fn fetch_all(&self) -> Result<Vec<ChatMetricEvent>, TelemetryError> {
            Err(TelemetryError::Status(503))
        }
    }

    fn event() -> ChatMetricEvent {
        ChatMetricEvent {
            id: Uuid::new_v4(),
            user_id: "u-1".into(),
            user_name: "Maria".into(),
            user_role: "partner".into(),
            timestamp: Utc::now(),
            session_id: Uuid::new_v4(),
            message_type: Role::Bot,
            message: "Olá!".into(),
            flow: "initial".into(),
            selected_option: None,
            was_helpful: None,
            ai_generated: false,
            tokens_used: 0,
            response_time_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_log_appends_to_store() {
        let store = Arc::new(InMemoryEventStore::new());
        let (logger, mut diag_rx) = InteractionLogger::new(store.clone());

        let e = event();
        let id = e.id;
        logger.log(e);

        // The diagnostics channel is the sync point for the spawned append.
        assert_eq!(diag_rx.recv().await.unwrap(), LogResult::Ok { event_id: id });
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_log_failure_reports_diagnostic_only() {
        let (logger, mut diag_rx) = InteractionLogger::new(Arc::new(FailingStore));

        let e = event();
        let id = e.id;
        // Must not panic or surface anything to the caller.
        logger.log(e);

        match diag_rx.recv().await.unwrap() {
            LogResult::Failed { event_id, error } => {
                assert_eq!(event_id, id);
                assert!(error.contains("503"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_with_dropped_diagnostics_receiver() {
        let store = Arc::new(InMemoryEventStore::new());
        let (logger, diag_rx) = InteractionLogger::new(store.clone());
        drop(diag_rx);

        logger.log(event());

        // Still lands in the store even with nobody listening.
        for _ in 0..50 {
            if store.len().await == 1 {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("append never completed");
    }

    #[tokio::test]
    async fn test_log_many_events_all_land() {
        let store = Arc::new(InMemoryEventStore::new());
        let (logger, mut diag_rx) = InteractionLogger::new(store.clone());

        for _ in 0..10 {
            logger.log(event());
        }
        for _ in 0..10 {
            assert!(matches!(
                diag_rx.recv().await.unwrap(),
                LogResult::Ok { .. }
            ));
        }
        assert_eq!(store.len().await, 10);
    }
}
