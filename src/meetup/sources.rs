//! Data source seams for the optimizer.
//!
//! Journey times and venue catalogs are injected behind traits so the
//! engine runs against the TfL client in production and deterministic
//! fakes in tests.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Coordinate, Venue};

/// Point-to-point travel time oracle.
#[async_trait]
pub trait JourneyTimeProvider: Send + Sync {
    /// Door-to-door transit time in minutes.
    ///
    /// `None` means the source had no itinerary for this leg or failed
    /// to answer; callers decide how a missing leg affects a candidate.
    async fn journey_time(&self, from: &Coordinate, to: &Coordinate) -> Option<u32>;
}

/// Geocoded venue catalog lookup.
#[async_trait]
pub trait VenueProvider: Send + Sync {
    /// The `limit` venues closest to `center` within `radius_m` meters,
    /// sorted by ascending distance.
    async fn nearest_venues(
        &self,
        center: &Coordinate,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Venue>>;
}

/// In-memory venue catalog, useful when the caller already knows the
/// universe of possible meeting points.
pub struct StaticVenueProvider {
    venues: Vec<Venue>,
}

impl StaticVenueProvider {
    #[must_use]
    pub fn new(venues: Vec<Venue>) -> Self {
        Self { venues }
    }
}

fn distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    ) * 1000.0
}

#[async_trait]
impl VenueProvider for StaticVenueProvider {
    async fn nearest_venues(
        &self,
        center: &Coordinate,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Venue>> {
        let mut in_range: Vec<(f64, &Venue)> = self
            .venues
            .iter()
            .map(|venue| (distance_meters(center, &venue.location), venue))
            .filter(|(distance, _)| *distance <= f64::from(radius_m))
            .collect();
        in_range.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(in_range
            .into_iter()
            .take(limit)
            .map(|(_, venue)| venue.clone())
            .collect())
    }
}
