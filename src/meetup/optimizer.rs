//! Meeting point optimization: quote fan-out, aggregation, ranking.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::OptimizerConfig;
use crate::meetup::candidates::prefilter;
use crate::meetup::scoring::{MissingLegPolicy, Scorer};
use crate::meetup::sources::JourneyTimeProvider;
use crate::models::{Coordinate, Participant, Venue};

/// A ranked venue with its per-participant round-trip times.
#[derive(Debug, Clone, Serialize)]
pub struct VenueScore {
    pub venue: Venue,
    /// Round-trip minutes, one entry per participant in input order
    pub journey_times: Vec<u32>,
    /// Lower is better
    pub score: f64,
}

/// Outcome of a single optimization run.
///
/// `candidates_attempted` vs `candidates_scored` lets callers distinguish
/// "nothing found" from "results degraded by data source failures".
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// The best-scoring venue, if any candidate could be ranked
    pub best_venue: Option<VenueScore>,
    /// Candidates evaluated after pre-filtering
    pub candidates_attempted: usize,
    /// Candidates that produced a finite score
    pub candidates_scored: usize,
}

/// Orchestrates journey quoting and scoring over a candidate list.
pub struct MeetupOptimizer<P> {
    planner: P,
    scorer: Scorer,
    policy: MissingLegPolicy,
    max_candidates: usize,
    limiter: Arc<Semaphore>,
}

impl<P: JourneyTimeProvider> MeetupOptimizer<P> {
    #[must_use]
    pub fn new(planner: P, config: &OptimizerConfig) -> Self {
        Self {
            planner,
            scorer: Scorer::new(config.fairness_weight),
            policy: MissingLegPolicy::default(),
            max_candidates: config.max_candidates.max(1),
            limiter: Arc::new(Semaphore::new(config.concurrency.max(1))),
        }
    }

    /// Replace the default missing-leg policy.
    #[must_use]
    pub fn with_missing_leg_policy(mut self, policy: MissingLegPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Find the venue minimizing the fairness-weighted group travel time.
    ///
    /// Candidates beyond the configured cap are pre-filtered by distance
    /// to the participants' origin centroid. Quote requests run
    /// concurrently, bounded by the configured permit count; a candidate
    /// is scored only once every one of its legs has settled. Equal
    /// scores keep the earlier candidate.
    #[instrument(skip_all, fields(participants = participants.len(), candidates = candidates.len()))]
    pub async fn find_optimal_meeting_point(
        &self,
        participants: &[Participant],
        candidates: Vec<Venue>,
    ) -> OptimizationResult {
        let candidates = prefilter(candidates, participants, self.max_candidates);
        let attempted = candidates.len();

        let evaluations = join_all(
            candidates
                .into_iter()
                .map(|venue| self.evaluate(venue, participants)),
        )
        .await;

        let mut scored: Vec<VenueScore> = evaluations.into_iter().flatten().collect();
        let ranked = scored.len();
        scored.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));

        let best = scored.into_iter().next();
        match &best {
            Some(venue_score) => info!(
                venue = %venue_score.venue.name,
                score = venue_score.score,
                "selected meeting point"
            ),
            None => info!(attempted, "no candidate could be ranked"),
        }

        OptimizationResult {
            best_venue: best,
            candidates_attempted: attempted,
            candidates_scored: ranked,
        }
    }

    /// Quote all legs for one candidate, then resolve and score them.
    async fn evaluate(&self, venue: Venue, participants: &[Participant]) -> Option<VenueScore> {
        let legs = join_all(
            participants
                .iter()
                .map(|participant| self.round_trip(participant, &venue)),
        )
        .await;

        let Some(journey_times) = self.policy.resolve(&legs) else {
            warn!(venue = %venue.name, "journey data missing, candidate excluded");
            return None;
        };

        let score = self.scorer.score(&journey_times);
        if !score.is_finite() {
            debug!(venue = %venue.name, "candidate has no scorable journeys");
            return None;
        }

        Some(VenueScore {
            venue,
            journey_times,
            score,
        })
    }

    /// Outbound and return quotes for one participant and candidate.
    async fn round_trip(
        &self,
        participant: &Participant,
        venue: &Venue,
    ) -> (Option<u32>, Option<u32>) {
        tokio::join!(
            self.quote(&participant.origin, &venue.location),
            self.quote(&venue.location, &participant.destination),
        )
    }

    async fn quote(&self, from: &Coordinate, to: &Coordinate) -> Option<u32> {
        // The semaphore is owned by this optimizer and never closed
        let _permit = self.limiter.acquire().await.ok()?;
        self.planner.journey_time(from, to).await
    }
}
