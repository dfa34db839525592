//! AI fallback routing for the Parla assistant.
//!
//! When a session has AI mode enabled, free-text input is routed to an
//! external text-generation service instead of the rule tree. Failures never
//! reach the UI: the router degrades to a static apology turn with recovery
//! options, so the conversation always has a next action.

pub mod error;
pub mod generator;
pub mod router;

pub use error::GenerateError;
pub use generator::{Generated, HttpGenerator, TextGenerator};
pub use router::{AssistRouter, RouteContext, RoutedTurn};
