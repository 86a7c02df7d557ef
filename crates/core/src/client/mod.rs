//! Outbound request abstraction.
//!
//! Everything the harness sends (preparation fetches and action requests)
//! goes through the `RequestClient` trait. The core only looks at the
//! success flag, the parsed JSON body and a failure reason.

mod http;
mod types;

pub use http::HttpRequestClient;
pub use types::*;
