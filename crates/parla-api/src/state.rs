//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use parla_assist::TextGenerator;
use parla_flow::Orchestrator;
use parla_metrics::MetricsService;

/// The orchestrator as held by the API: generic over a boxed generator so
/// tests can substitute local impls.
pub type SharedOrchestrator = Arc<Orchestrator<Arc<dyn TextGenerator>>>;

/// Shared application state.
///
/// All fields are cheaply cloneable across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions + engine + router + logger behind one surface.
    pub orchestrator: SharedOrchestrator,
    /// Pull-based analytics over the event store.
    pub metrics: MetricsService,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: SharedOrchestrator, metrics: MetricsService) -> Self {
        Self {
            orchestrator,
            metrics,
            start_time: Instant::now(),
        }
    }
}
