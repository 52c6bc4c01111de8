//! Candidate venue generation and geographic pre-filtering.

use tracing::{debug, warn};

use crate::config::OptimizerConfig;
use crate::meetup::sources::VenueProvider;
use crate::models::{Coordinate, Participant, Venue};

/// Proposes meeting point candidates near the group's geographic middle.
pub struct CandidateGenerator {
    search_radius_m: u32,
    max_venues: usize,
}

impl CandidateGenerator {
    #[must_use]
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            search_radius_m: config.search_radius_m,
            max_venues: config.max_venues,
        }
    }

    /// Venues near the centroid of all participant origins and destinations.
    ///
    /// Returns an empty list when no participants are supplied or when the
    /// catalog fails; both mean "no candidates", not an error.
    pub async fn generate<C>(&self, catalog: &C, participants: &[Participant]) -> Vec<Venue>
    where
        C: VenueProvider,
    {
        let all_points: Vec<Coordinate> = participants
            .iter()
            .flat_map(|p| [p.origin, p.destination])
            .collect();
        let Some(center) = Coordinate::centroid(all_points.iter()) else {
            debug!("no participants supplied, no candidates generated");
            return Vec::new();
        };

        match catalog
            .nearest_venues(&center, self.search_radius_m, self.max_venues)
            .await
        {
            Ok(venues) => {
                debug!(count = venues.len(), "generated candidate venues");
                venues
            }
            Err(error) => {
                warn!("venue catalog lookup failed: {error:#}");
                Vec::new()
            }
        }
    }
}

/// Keep the `cap` candidates nearest the centroid of participant origins.
///
/// Distance is plain Euclidean in coordinate space. The sort is stable:
/// equally distant candidates keep their original order, and with
/// `cap >= len` the input comes back unchanged.
#[must_use]
pub fn prefilter(candidates: Vec<Venue>, participants: &[Participant], cap: usize) -> Vec<Venue> {
    if candidates.len() <= cap {
        return candidates;
    }
    let origins: Vec<Coordinate> = participants.iter().map(|p| p.origin).collect();
    let Some(center) = Coordinate::centroid(origins.iter()) else {
        // No origins to measure against; keep the first `cap` as supplied
        let mut candidates = candidates;
        candidates.truncate(cap);
        return candidates;
    };

    let mut measured: Vec<(f64, Venue)> = candidates
        .into_iter()
        .map(|venue| {
            let d_lat = venue.location.latitude - center.latitude;
            let d_lon = venue.location.longitude - center.longitude;
            ((d_lat * d_lat + d_lon * d_lon).sqrt(), venue)
        })
        .collect();
    measured.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    measured.truncate(cap);
    measured.into_iter().map(|(_, venue)| venue).collect()
}
