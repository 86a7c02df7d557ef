//! HTTP and WebSocket surface for the Rate of Fire benchmark session.

pub mod api;
pub mod metrics;
pub mod state;
