//! Dialogue flow engine for the Parla assistant.
//!
//! Provides the versioned flow catalog (published and validated as a unit),
//! the deterministic state machine that resolves user input to the next bot
//! turn, and the session orchestrator that wires the engine, the AI fallback
//! router, and the interaction logger behind one surface.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod orchestrator;

pub use catalog::{
    default_catalog, CatalogDraft, CatalogError, FlowCatalog, FlowNode, FlowOption, KeywordRule,
    OptionAction,
};
pub use engine::{FlowEngine, Input};
pub use error::FlowError;
pub use orchestrator::Orchestrator;
