//! Meetup optimization module
//!
//! This module provides the meeting point selection pipeline:
//! - Candidate venue generation around the group centroid
//! - Geographic pre-filtering to bound oracle traffic
//! - Fairness-weighted scoring of per-participant round trips
//! - Orchestration with bounded-concurrency journey quoting

pub mod candidates;
pub mod optimizer;
pub mod scoring;
pub mod sources;

// Re-export commonly used types from submodules
pub use candidates::{CandidateGenerator, prefilter};
pub use optimizer::{MeetupOptimizer, OptimizationResult, VenueScore};
pub use scoring::{MissingLegPolicy, Scorer};
pub use sources::{JourneyTimeProvider, StaticVenueProvider, VenueProvider};
