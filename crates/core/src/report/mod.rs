//! Report builder.
//!
//! Reduces ledger state and run timing into summary metrics and per-request
//! detail rows, and renders them as Markdown or SQL documents.

mod builder;
mod markdown;
mod sql;
mod types;

use chrono::{DateTime, Utc};

pub use builder::summarize;
pub use markdown::render_markdown;
pub use sql::{render_sql, DETAIL_BATCH_SIZE};
pub use types::*;

/// `<prefix>-YYYY-MM-DD-HH-MM.<extension>`
pub fn report_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", prefix, at.format("%Y-%m-%d-%H-%M"), extension)
}
