//! Resolution and tracking pipeline.
//!
//! - `classify`: Recognize what kind of identifier an input is
//! - `resolve` / `merge`: Query the sources and build a canonical product
//! - `diff`: Compare fresh state with the stored record
//! - `track`: Resolve, store and alert in one step
//! - `poll`: Re-resolve every tracked product on a schedule

pub mod classify;
pub mod diff;
pub mod merge;
pub mod poll;
pub mod resolve;
pub mod track;

pub use classify::{CandidateIdentifier, CartId, classify};
pub use diff::UpsertOutcome;
pub use poll::{CycleReport, Poller};
pub use resolve::{Lookup, Resolver};
pub use track::Tracker;
