//! HTTP surface of the loudness normalizer.
//!
//! Exposed as a library so integration tests can drive the router in-process.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
