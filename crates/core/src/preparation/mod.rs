//! Preparation stage.
//!
//! Fetches each active competitor's item list concurrently before a run.
//! Failures are isolated: a competitor whose fetch fails ends up with an
//! empty list while the others proceed.

mod stage;
mod types;

pub use stage::prepare;
pub use types::*;
