//! Competitor registry.
//!
//! Single owner of competitor identities, tokens, derived headers and the
//! item lists fetched for each competitor during preparation.

mod registry;
mod types;

pub use registry::CompetitorRegistry;
pub use types::*;
