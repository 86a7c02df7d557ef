//! Exportable benchmark settings.

mod types;

pub use types::*;
