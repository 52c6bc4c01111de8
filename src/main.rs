use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use fairmeet::{
    Cache, CandidateGenerator, Coordinate, FairmeetConfig, MeetupOptimizer, OptimizationResult,
    Participant, TflClient, Venue, telemetry,
};

/// Input document for one optimization run.
#[derive(Debug, Deserialize)]
struct MeetupRequest {
    participants: Vec<Participant>,
    /// Optional fixed venue list; when empty, candidates are generated
    /// from stations near the group's centroid
    #[serde(default)]
    venues: Vec<Venue>,
}

impl MeetupRequest {
    /// Range-check every coordinate in the request.
    ///
    /// Deserialized structs carry no range checks of their own; they
    /// happen here, before any journey is quoted.
    fn validate(&self) -> Result<()> {
        for participant in &self.participants {
            Coordinate::new(participant.origin.latitude, participant.origin.longitude)?;
            Coordinate::new(
                participant.destination.latitude,
                participant.destination.longitude,
            )?;
        }
        for venue in &self.venues {
            Coordinate::new(venue.location.latitude, venue.location.longitude)?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = FairmeetConfig::load()?;
    let telemetry = telemetry::init(&config.logging)?;

    let outcome = run(&config).await;
    telemetry.shutdown();
    outcome
}

async fn run(config: &FairmeetConfig) -> Result<()> {
    let cache =
        Cache::open(config.cache_path()).with_context(|| "Failed to open cache database")?;
    let client = TflClient::new(&config.tfl, cache)?;

    let request = match env::args().nth(1) {
        Some(path) => load_request(Path::new(&path))?,
        None => {
            info!("no request file given, running the built-in demo");
            demo_request()
        }
    };

    let candidates = if request.venues.is_empty() {
        CandidateGenerator::new(&config.optimizer)
            .generate(&client, &request.participants)
            .await
    } else {
        request.venues.clone()
    };

    let optimizer = MeetupOptimizer::new(client, &config.optimizer);
    let outcome = optimizer
        .find_optimal_meeting_point(&request.participants, candidates)
        .await;

    print_outcome(&outcome);
    Ok(())
}

fn load_request(path: &Path) -> Result<MeetupRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let request: MeetupRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse request file {}", path.display()))?;
    request
        .validate()
        .with_context(|| format!("Invalid request file {}", path.display()))?;
    Ok(request)
}

/// Two participants crossing central London, venues generated from
/// stations near their centroid.
fn demo_request() -> MeetupRequest {
    MeetupRequest {
        participants: vec![
            Participant::new(
                // Camden Town heading on to Brixton
                Coordinate {
                    latitude: 51.5390,
                    longitude: -0.1426,
                },
                Coordinate {
                    latitude: 51.4627,
                    longitude: -0.1145,
                },
            ),
            Participant::new(
                // Stratford heading on to Clapham Junction
                Coordinate {
                    latitude: 51.5416,
                    longitude: -0.0042,
                },
                Coordinate {
                    latitude: 51.4645,
                    longitude: -0.1705,
                },
            ),
        ],
        venues: Vec::new(),
    }
}

fn print_outcome(outcome: &OptimizationResult) {
    println!(
        "Scored {} of {} candidate venues",
        outcome.candidates_scored, outcome.candidates_attempted
    );

    match &outcome.best_venue {
        Some(best) => {
            println!(
                "Best meeting point: {} ({}), score {:.1}",
                best.venue.name, best.venue.id, best.score
            );
            for (index, minutes) in best.journey_times.iter().enumerate() {
                println!("  participant {}: {minutes} min round trip", index + 1);
            }
        }
        None => println!("No reachable venue found for this group"),
    }
}
