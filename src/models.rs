//! Core domain types for meeting point optimization

use serde::{Deserialize, Serialize};

use crate::error::FairmeetError;

/// A geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating the latitude/longitude ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FairmeetError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FairmeetError::validation(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FairmeetError::validation(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Stable cache key fragment for this coordinate.
    ///
    /// Four decimal places (roughly 11 m) so that nearby lookups share
    /// journey quotes without conflating distinct stations.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded(4);
        format!("{lat:.4}:{lon:.4}")
    }

    /// Arithmetic mean of a set of coordinates, per axis.
    ///
    /// Returns `None` for an empty set. A cheap proxy for the geographic
    /// middle, acceptable at city scale.
    pub fn centroid<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut count = 0usize;
        let mut lat_sum = 0.0;
        let mut lon_sum = 0.0;
        for point in points {
            count += 1;
            lat_sum += point.latitude;
            lon_sum += point.longitude;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Self {
            latitude: lat_sum / n,
            longitude: lon_sum / n,
        })
    }
}

/// One attendee of the meetup: where they start from and where they are
/// heading afterwards. Identity beyond list position belongs to callers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Participant {
    /// Where the participant departs from
    pub origin: Coordinate,
    /// Where the participant continues to after the meetup
    pub destination: Coordinate,
}

impl Participant {
    #[must_use]
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

/// A venue under consideration as the meeting point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Venue {
    /// Stable identifier (e.g. Naptan id for stations)
    pub id: String,
    /// Display name
    pub name: String,
    /// Venue position
    pub location: Coordinate,
    /// Optional category tag, e.g. "station" or "restaurant"
    #[serde(default)]
    pub category: Option<String>,
}
