//! Interaction telemetry for the Parla assistant.
//!
//! One event is appended per user/bot turn to a remote event store. Appends
//! are fire-and-forget: the caller never awaits transport success, and any
//! failure is reported on a diagnostics channel instead of surfacing to the
//! UI. The aggregator later pulls the full log back through the same store
//! interface.

pub mod error;
pub mod logger;
pub mod store;

pub use error::TelemetryError;
pub use logger::{InteractionLogger, LogResult};
pub use store::{EventStore, HttpEventStore, InMemoryEventStore};
