//! Pull-based metrics: fetch the full log, fold it, never fail.
//!
//! A fetch failure surfaces as an empty zero-filled summary (or a header-only
//! CSV) rather than an error, so the dashboard always renders.

use std::sync::Arc;

use tracing::warn;

use parla_core::{ChatMetricEvent, DateRange};
use parla_telemetry::EventStore;

use crate::export::export_csv;
use crate::summary::{summarize, MetricsSummary};

/// Reads the accumulated log on demand and folds it into summaries.
///
/// Each call re-reads and re-folds the entire log. Fine while event volume
/// stays small; the growth path is an incremental aggregate, not a change to
/// the pure `summarize` contract.
#[derive(Clone)]
pub struct MetricsService {
    store: Arc<dyn EventStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Summary over the (optionally date-filtered) log. A fetch failure
    /// yields the empty summary.
    pub async fn summary(&self, range: Option<DateRange>) -> MetricsSummary {
        let events = self.fetch().await;
        summarize(&events, range)
    }

    /// CSV of the (optionally date-filtered) log. A fetch failure yields a
    /// header-only document.
    pub async fn export(&self, range: Option<DateRange>) -> String {
        let events = self.fetch().await;
        let filtered: Vec<ChatMetricEvent> = events
            .into_iter()
            .filter(|e| range.map_or(true, |r| r.contains(e.timestamp)))
            .collect();
        export_csv(&filtered)
    }

    async fn fetch(&self) -> Vec<ChatMetricEvent> {
        match self.store.fetch_all().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Event log fetch failed, serving empty data");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
