//! Usage analytics for the Parla assistant.
//!
//! Folds the raw interaction log into the operational summary shown on the
//! dashboard, and serializes the log to CSV for export. `summarize` is a
//! pure function over the event set; the pull-based [`MetricsService`] wraps
//! it with the event-store fetch and the degrade-to-empty contract.

pub mod export;
pub mod service;
pub mod summary;

pub use export::{export_csv, CSV_HEADER};
pub use service::MetricsService;
pub use summary::{
    summarize, DayCount, FlowCompletion, FlowCount, MetricsSummary, OptionCount, UserCount,
};
