// src/models/mod.rs

//! Domain models for the tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod product;
mod record;

// Re-export all public types
pub use config::{Config, HttpConfig, NotifyConfig, PollConfig, SiteConfig, StorageConfig};
pub use event::ProductEvent;
pub use product::{CanonicalProduct, SourceFragment, Variant, hashed_id};
pub use record::{TrackedRecord, VariantHistory};
