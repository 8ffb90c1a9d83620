//! Core domain model for chartwise.
//!
//! This crate defines the chart and catalog records, the dedup key used
//! to identify a (song, artist) pair, and the JSON snapshot store that
//! persists resolved songs across runs.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod key;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use key::dedup_key;
pub use store::{pending_records, FeatureStore, MatchStore, SnapshotStore};
