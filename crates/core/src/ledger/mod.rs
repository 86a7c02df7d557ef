//! Result ledger.
//!
//! Holds, per competitor, a fixed-capacity ring of result slots laid out in
//! rows of 50, plus the aggregate counters of the current run. Dispatches and
//! completions are recorded here, and every change is published as a
//! `LedgerEvent`.

mod events;
mod store;
mod types;

pub use events::LedgerEvent;
pub use store::{LedgerSnapshot, ResultLedger};
pub use types::*;
