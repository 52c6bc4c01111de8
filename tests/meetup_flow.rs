//! End-to-end optimization flow over scripted journey data.
//!
//! Exercises candidate generation, pre-filtering, and scoring through the
//! public API with a deterministic journey planner, so results do not
//! depend on the live TfL API.

use std::collections::HashMap;

use async_trait::async_trait;
use fairmeet::{
    CandidateGenerator, Coordinate, FairmeetConfig, JourneyTimeProvider, MeetupOptimizer,
    MissingLegPolicy, Participant, StaticVenueProvider, Venue,
};

/// Planner answering only the quotes it was scripted with; everything
/// else is a missing leg.
struct ScriptedPlanner {
    quotes: HashMap<(String, String), u32>,
}

impl ScriptedPlanner {
    fn new() -> Self {
        Self {
            quotes: HashMap::new(),
        }
    }

    fn with_quote(mut self, from: &Coordinate, to: &Coordinate, minutes: u32) -> Self {
        self.quotes
            .insert((from.cache_key(), to.cache_key()), minutes);
        self
    }

    fn with_round_trip(
        self,
        participant: &Participant,
        venue: &Venue,
        outbound: u32,
        inbound: u32,
    ) -> Self {
        self.with_quote(&participant.origin, &venue.location, outbound)
            .with_quote(&venue.location, &participant.destination, inbound)
    }
}

#[async_trait]
impl JourneyTimeProvider for ScriptedPlanner {
    async fn journey_time(&self, from: &Coordinate, to: &Coordinate) -> Option<u32> {
        self.quotes
            .get(&(from.cache_key(), to.cache_key()))
            .copied()
    }
}

fn venue(id: &str, latitude: f64, longitude: f64) -> Venue {
    Venue {
        id: id.to_string(),
        name: format!("{id} station"),
        location: Coordinate {
            latitude,
            longitude,
        },
        category: Some("station".to_string()),
    }
}

fn participants() -> Vec<Participant> {
    vec![
        Participant::new(
            Coordinate {
                latitude: 51.50,
                longitude: -0.20,
            },
            Coordinate {
                latitude: 51.50,
                longitude: -0.10,
            },
        ),
        Participant::new(
            Coordinate {
                latitude: 51.55,
                longitude: -0.15,
            },
            Coordinate {
                latitude: 51.45,
                longitude: -0.15,
            },
        ),
    ]
}

#[tokio::test]
async fn test_generated_candidates_feed_the_optimizer() {
    let config = FairmeetConfig::default().optimizer;
    let group = participants();

    // Catalog around the group's centroid (51.50, -0.15), with one venue
    // far outside the search radius.
    let near = venue("near", 51.51, -0.15);
    let spread = venue("spread", 51.49, -0.16);
    let faraway = venue("faraway", 51.70, -0.15);
    let catalog = StaticVenueProvider::new(vec![spread.clone(), near.clone(), faraway]);

    let candidates = CandidateGenerator::new(&config)
        .generate(&catalog, &group)
        .await;
    let ids: Vec<&str> = candidates.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "spread"]);

    // Balanced round trips at `near` (12 + 12) beat the lopsided ones at
    // `spread` (8 + 20) even though the sums are close.
    let planner = ScriptedPlanner::new()
        .with_round_trip(&group[0], &near, 7, 5)
        .with_round_trip(&group[1], &near, 6, 6)
        .with_round_trip(&group[0], &spread, 4, 4)
        .with_round_trip(&group[1], &spread, 10, 10);

    let outcome = MeetupOptimizer::new(planner, &config)
        .find_optimal_meeting_point(&group, candidates)
        .await;

    assert_eq!(outcome.candidates_attempted, 2);
    assert_eq!(outcome.candidates_scored, 2);
    let best = outcome.best_venue.unwrap();
    assert_eq!(best.venue.id, "near");
    assert_eq!(best.journey_times, vec![12, 12]);
    assert!((best.score - 24.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unreachable_venue_is_dropped_not_fatal() {
    let config = FairmeetConfig::default().optimizer;
    let group = participants();

    let near = venue("near", 51.51, -0.15);
    let broken = venue("broken", 51.49, -0.16);

    // No quotes at all for `broken`: both of its round trips fail.
    let planner = ScriptedPlanner::new()
        .with_round_trip(&group[0], &near, 7, 5)
        .with_round_trip(&group[1], &near, 6, 6);

    let outcome = MeetupOptimizer::new(planner, &config)
        .find_optimal_meeting_point(&group, vec![near.clone(), broken])
        .await;

    assert_eq!(outcome.candidates_attempted, 2);
    assert_eq!(outcome.candidates_scored, 1);
    assert_eq!(outcome.best_venue.unwrap().venue.id, "near");
}

#[tokio::test]
async fn test_assumed_minutes_policy_keeps_partial_venues() {
    let config = FairmeetConfig::default().optimizer;
    let group = participants();

    let near = venue("near", 51.51, -0.15);
    let partial = venue("partial", 51.49, -0.16);

    // `partial` is only reachable for the first participant.
    let planner = ScriptedPlanner::new()
        .with_round_trip(&group[0], &near, 7, 5)
        .with_round_trip(&group[1], &near, 6, 6)
        .with_round_trip(&group[0], &partial, 3, 3);

    let outcome = MeetupOptimizer::new(planner, &config)
        .with_missing_leg_policy(MissingLegPolicy::AssumeMinutes(0))
        .find_optimal_meeting_point(&group, vec![near, partial])
        .await;

    // [6, 0] scores 6 + 0.5 * 3 * 2 = 9, under near's 24.
    assert_eq!(outcome.candidates_scored, 2);
    let best = outcome.best_venue.unwrap();
    assert_eq!(best.venue.id, "partial");
    assert_eq!(best.journey_times, vec![6, 0]);
    assert!((best.score - 9.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_no_participants_yields_no_venue() {
    let config = FairmeetConfig::default().optimizer;
    let planner = ScriptedPlanner::new();

    let outcome = MeetupOptimizer::new(planner, &config)
        .find_optimal_meeting_point(&[], vec![venue("near", 51.51, -0.15)])
        .await;

    assert!(outcome.best_venue.is_none());
    assert_eq!(outcome.candidates_scored, 0);
}

#[tokio::test]
async fn test_no_candidates_yields_no_venue() {
    let config = FairmeetConfig::default().optimizer;
    let planner = ScriptedPlanner::new();

    let outcome = MeetupOptimizer::new(planner, &config)
        .find_optimal_meeting_point(&participants(), Vec::new())
        .await;

    assert!(outcome.best_venue.is_none());
    assert_eq!(outcome.candidates_attempted, 0);
}
