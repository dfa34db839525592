//! Localhost HTTP surface for the Parla assistant core.
//!
//! Exposes the five core operations to the hosting UI — flow resolution,
//! AI routing, telemetry, summaries, and CSV export — plus a health probe.
//! Nothing else belongs to this surface; authentication, uploads, and
//! notifications live elsewhere in the portal.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
