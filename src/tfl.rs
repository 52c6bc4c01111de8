//! TfL Unified API client: journey quotes, station lookups, line status.
//!
//! The quote path never raises; transport, protocol, and payload failures
//! are logged and collapse to "no data" so the optimizer can degrade to
//! fewer candidates instead of aborting.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rand::RngExt;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::config::TflConfig;
use crate::error::FairmeetError;
use crate::meetup::sources::{JourneyTimeProvider, VenueProvider};
use crate::models::{Coordinate, Venue};

/// Station and search lookups change rarely
const STOP_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Line status changes frequently
const STATUS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Options for time-sensitive journey planning.
///
/// Quotes carrying any of these bypass the response cache entirely; only
/// coordinate-only lookups are cacheable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JourneyOptions {
    /// Requested journey time (maps to the API's `time`, HH:MM)
    pub time: Option<NaiveTime>,
    /// Requested journey date (maps to the API's `date`, YYYYMMDD)
    pub date: Option<NaiveDate>,
    /// Interpret `time` as the required arrival rather than departure
    pub arrive_by: bool,
}

/// Service status of one line, reduced to its worst active entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineStatus {
    pub id: String,
    pub name: String,
    /// Severity code; lower is worse, 10 is "Good Service"
    pub severity: i32,
    pub description: String,
    pub reason: Option<String>,
}

/// Client for the TfL Unified API with response caching.
#[derive(Clone)]
pub struct TflClient {
    http: ClientWithMiddleware,
    cache: Cache,
    config: TflConfig,
}

impl TflClient {
    /// Create a new client from configuration and an opened cache.
    pub fn new(config: &TflConfig, cache: Cache) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("fairmeet/0.1.0")
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            cache,
            config: config.clone(),
        })
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(app_id) = &self.config.app_id {
            params.push(("app_id", app_id.clone()));
        }
        if let Some(app_key) = &self.config.app_key {
            params.push(("app_key", app_key.clone()));
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!(%url, "TfL API request");

        let mut query: Vec<(&str, String)> = self.auth_params();
        query.extend(params.iter().map(|(key, value)| (*key, value.clone())));

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("TfL API request failed: {endpoint}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                FairmeetError::api(format!("TfL API returned {status} for {endpoint}")).into(),
            );
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse TfL API response from {endpoint}"))
    }

    /// Raw itinerary durations in minutes between two coordinates.
    ///
    /// Responses depend on the requested departure or arrival time, so
    /// they are never cached here.
    #[instrument(skip(self, options))]
    pub async fn plan_journey(
        &self,
        from: &Coordinate,
        to: &Coordinate,
        options: &JourneyOptions,
    ) -> Result<Vec<u32>> {
        let params = journey_params(from, to, options);
        let response: response::JourneyResponse =
            self.get_json("Journey/JourneyResults", &params).await?;
        Ok(response
            .journeys
            .into_iter()
            .filter_map(|journey| journey.duration)
            .collect())
    }

    /// Best-case door-to-door time in minutes for a coordinate pair.
    ///
    /// The fastest itinerary wins. Coordinate-only quotes are cached under
    /// the rounded pair key with a jittered TTL; every failure is logged
    /// and collapses to `None` so a single bad leg cannot abort a whole
    /// optimization run.
    #[instrument(skip(self))]
    pub async fn journey_time(&self, from: &Coordinate, to: &Coordinate) -> Option<u32> {
        let key = format!("journey:{}:{}", from.cache_key(), to.cache_key());

        match self.cache.get::<u32>(&key).await {
            Ok(Some(minutes)) => return Some(minutes),
            Ok(None) => {}
            Err(error) => warn!("journey cache read failed: {error:#}"),
        }

        let durations = match self.plan_journey(from, to, &JourneyOptions::default()).await {
            Ok(durations) => durations,
            Err(error) => {
                warn!("journey planning failed: {error:#}");
                return None;
            }
        };

        let Some(minutes) = durations.into_iter().min() else {
            warn!("no itineraries returned for journey");
            return None;
        };

        // Spread expiry so a batch of quotes does not refresh all at once
        let jitter: f32 = rand::rng().random_range(0.9..1.1);
        let ttl_seconds = (self.config.journey_ttl_minutes as f32 * 60.0 * jitter) as u64;
        if let Err(error) = self
            .cache
            .put(&key, minutes, Duration::from_secs(ttl_seconds))
            .await
        {
            warn!("journey cache write failed: {error:#}");
        }

        Some(minutes)
    }

    /// Free-text station search.
    #[instrument(skip(self))]
    pub async fn search_stops(&self, query: &str) -> Result<Vec<Venue>> {
        let key = format!("station_search:{query}");
        if let Some(cached) = self.cache.get::<Vec<Venue>>(&key).await? {
            return Ok(cached);
        }

        let endpoint = format!("StopPoint/Search/{}", urlencoding::encode(query));
        let response: response::SearchResponse = self.get_json(&endpoint, &[]).await?;
        let venues: Vec<Venue> = response.matches.into_iter().map(Venue::from).collect();

        self.cache.put(&key, venues.clone(), STOP_CACHE_TTL).await?;
        Ok(venues)
    }

    /// Station details by stop point id.
    #[instrument(skip(self))]
    pub async fn stop_point(&self, id: &str) -> Result<Venue> {
        let key = format!("station:{id}");
        if let Some(cached) = self.cache.get::<Venue>(&key).await? {
            return Ok(cached);
        }

        let endpoint = format!("StopPoint/{}", urlencoding::encode(id));
        let stop: response::StopPoint = self.get_json(&endpoint, &[]).await?;
        let venue = Venue::from(stop);

        self.cache.put(&key, venue.clone(), STOP_CACHE_TTL).await?;
        Ok(venue)
    }

    /// Stations within `radius_m` meters of `center`, nearest first.
    #[instrument(skip(self))]
    pub async fn stops_near(&self, center: &Coordinate, radius_m: u32) -> Result<Vec<Venue>> {
        let key = format!("stops:{}:{radius_m}", center.cache_key());
        if let Some(cached) = self.cache.get::<Vec<Venue>>(&key).await? {
            return Ok(cached);
        }

        let params = [
            ("lat", center.latitude.to_string()),
            ("lon", center.longitude.to_string()),
            ("radius", radius_m.to_string()),
            (
                "stopTypes",
                "NaptanMetroStation,NaptanRailStation,NaptanPublicBusCoachTram".to_string(),
            ),
        ];
        let response: response::StopPointsResponse = self.get_json("StopPoint", &params).await?;
        let venues = stops_to_venues(response.stop_points);

        self.cache.put(&key, venues.clone(), STOP_CACHE_TTL).await?;
        Ok(venues)
    }

    /// The `limit` nearest stations to `center` within `radius_m` meters.
    pub async fn nearest_stops(
        &self,
        center: &Coordinate,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Venue>> {
        let mut venues = self.stops_near(center, radius_m).await?;
        venues.truncate(limit);
        Ok(venues)
    }

    /// Service status for the given lines, or all lines when `None`.
    #[instrument(skip(self))]
    pub async fn line_status(&self, lines: Option<&[&str]>) -> Result<Vec<LineStatus>> {
        let ids = lines
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.join(","));
        let key = format!("line_status:{}", ids.as_deref().unwrap_or("all"));
        if let Some(cached) = self.cache.get::<Vec<LineStatus>>(&key).await? {
            return Ok(cached);
        }

        let endpoint = match &ids {
            Some(ids) => format!("Line/{ids}/Status"),
            None => "Line/Status".to_string(),
        };
        let response: Vec<response::Line> = self.get_json(&endpoint, &[]).await?;
        let statuses: Vec<LineStatus> = response.into_iter().map(LineStatus::from).collect();

        self.cache
            .put(&key, statuses.clone(), STATUS_CACHE_TTL)
            .await?;
        Ok(statuses)
    }
}

#[async_trait]
impl JourneyTimeProvider for TflClient {
    async fn journey_time(&self, from: &Coordinate, to: &Coordinate) -> Option<u32> {
        TflClient::journey_time(self, from, to).await
    }
}

#[async_trait]
impl VenueProvider for TflClient {
    async fn nearest_venues(
        &self,
        center: &Coordinate,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Venue>> {
        self.nearest_stops(center, radius_m, limit).await
    }
}

fn journey_params(
    from: &Coordinate,
    to: &Coordinate,
    options: &JourneyOptions,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("from", format!("{},{}", from.latitude, from.longitude)),
        ("to", format!("{},{}", to.latitude, to.longitude)),
    ];
    if let Some(time) = options.time {
        params.push(("time", time.format("%H:%M").to_string()));
    }
    if let Some(date) = options.date {
        params.push(("date", date.format("%Y%m%d").to_string()));
    }
    if options.arrive_by {
        params.push(("timeIs", "Arriving".to_string()));
    }
    params
}

/// Sort by the API's reported distance (missing distance sorts last) and
/// convert to venues.
fn stops_to_venues(mut stops: Vec<response::StopPoint>) -> Vec<Venue> {
    stops.sort_by(|a, b| {
        a.distance
            .unwrap_or(f64::INFINITY)
            .partial_cmp(&b.distance.unwrap_or(f64::INFINITY))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stops.into_iter().map(Venue::from).collect()
}

/// TfL Unified API response structures and conversion utilities
mod response {
    use serde::Deserialize;

    use super::LineStatus;
    use crate::models::{Coordinate, Venue};

    #[derive(Debug, Deserialize)]
    pub struct JourneyResponse {
        #[serde(default)]
        pub journeys: Vec<Journey>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Journey {
        /// Total duration in minutes
        pub duration: Option<u32>,
    }

    #[derive(Debug, Deserialize)]
    pub struct StopPointsResponse {
        #[serde(rename = "stopPoints", default)]
        pub stop_points: Vec<StopPoint>,
    }

    #[derive(Debug, Deserialize)]
    pub struct StopPoint {
        #[serde(default)]
        pub id: String,
        #[serde(rename = "commonName")]
        pub common_name: Option<String>,
        #[serde(default)]
        pub lat: f64,
        #[serde(default)]
        pub lon: f64,
        /// Meters from the query point, present on radius searches
        pub distance: Option<f64>,
    }

    impl From<StopPoint> for Venue {
        fn from(stop: StopPoint) -> Self {
            Venue {
                id: stop.id,
                name: stop
                    .common_name
                    .unwrap_or_else(|| "Unknown Station".to_string()),
                location: Coordinate {
                    latitude: stop.lat,
                    longitude: stop.lon,
                },
                category: Some("station".to_string()),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchResponse {
        #[serde(default)]
        pub matches: Vec<SearchMatch>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchMatch {
        #[serde(default)]
        pub id: String,
        pub name: Option<String>,
        #[serde(default)]
        pub lat: f64,
        #[serde(default)]
        pub lon: f64,
    }

    impl From<SearchMatch> for Venue {
        fn from(found: SearchMatch) -> Self {
            Venue {
                id: found.id,
                name: found.name.unwrap_or_else(|| "Unknown Station".to_string()),
                location: Coordinate {
                    latitude: found.lat,
                    longitude: found.lon,
                },
                category: Some("station".to_string()),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Line {
        #[serde(default)]
        pub id: String,
        #[serde(default)]
        pub name: String,
        #[serde(rename = "lineStatuses", default)]
        pub line_statuses: Vec<LineStatusEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct LineStatusEntry {
        #[serde(rename = "statusSeverity")]
        pub status_severity: i32,
        #[serde(rename = "statusSeverityDescription", default)]
        pub status_severity_description: String,
        pub reason: Option<String>,
    }

    impl From<Line> for LineStatus {
        fn from(line: Line) -> Self {
            // Lower severity numbers are worse; no entries means all clear
            match line
                .line_statuses
                .into_iter()
                .min_by_key(|status| status.status_severity)
            {
                Some(worst) => LineStatus {
                    id: line.id,
                    name: line.name,
                    severity: worst.status_severity,
                    description: worst.status_severity_description,
                    reason: worst.reason,
                },
                None => LineStatus {
                    id: line.id,
                    name: line.name,
                    severity: 10,
                    description: "Good Service".to_string(),
                    reason: None,
                },
            }
        }
    }
}
