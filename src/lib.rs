//! `Fairmeet` - Transit-aware meeting point recommendations
//!
//! This library provides the core functionality for journey time lookup,
//! candidate venue generation, and fair meeting point selection for
//! groups travelling across a city.

pub mod cache;
pub mod config;
pub mod error;
pub mod meetup;
pub mod models;
pub mod telemetry;
pub mod tfl;

// Re-export core types for public API
pub use cache::Cache;
pub use config::FairmeetConfig;
pub use error::FairmeetError;
pub use meetup::{
    CandidateGenerator, JourneyTimeProvider, MeetupOptimizer, MissingLegPolicy,
    OptimizationResult, Scorer, StaticVenueProvider, VenueProvider, VenueScore,
};
pub use models::{Coordinate, Participant, Venue};
pub use tfl::{JourneyOptions, LineStatus, TflClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
