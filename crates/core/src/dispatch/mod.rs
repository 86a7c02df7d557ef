//! Dispatch scheduler.
//!
//! Drives a run through `Idle -> CountingDown -> Running -> Idle`, issuing one
//! action request per competitor on every tick and recording outcomes in the
//! result ledger.

mod config;
mod runner;
mod types;

pub use config::DispatchConfig;
pub use runner::Dispatcher;
pub use types::*;
