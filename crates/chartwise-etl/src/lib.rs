//! Catalog resolution pipeline for chartwise.
//!
//! Resolves chart records to catalog songs in two matching passes,
//! fetches audio features for the resolved songs and widens the dataset
//! with album siblings. Every remote call goes through a retrying
//! [`QueryClient`]; results land in `chartwise_core` snapshot stores.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod expand;
pub mod features;
pub mod matching;
pub mod query;
pub mod resilience;
pub mod resolve;
pub mod similarity;

pub use catalog::{Catalog, SpotifyClient, TrackFeatures};
pub use config::Config;
pub use error::{CatalogError, CatalogResult, PipelineError, PipelineResult};
pub use expand::{AlbumSampler, ExpansionReport};
pub use features::{FeatureBatchFetcher, FeatureReport};
pub use matching::{MatchEvaluator, MatchRules, MatchVerdict};
pub use query::QueryClient;
pub use resilience::{RateLimiter, RetryPolicy};
pub use resolve::{ExhaustionPolicy, ResolutionEngine, ResolutionReport, ResolveSettings};
