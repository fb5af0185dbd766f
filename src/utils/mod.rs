//! Utility functions and helpers.

pub mod gate;
pub mod http;
pub mod url;

pub use gate::ConcurrencyGate;
pub use http::{Fetch, FetchedPage, Gated, HttpFetcher, create_async_client};
