//! Fairness-weighted venue scoring.

/// How the scoring path treats a journey leg the oracle could not quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingLegPolicy {
    /// Drop the whole candidate from the ranking (default).
    #[default]
    ExcludeCandidate,
    /// Substitute a fixed number of minutes for each missing leg.
    ///
    /// `AssumeMinutes(0)` reproduces the optimistic legacy behavior of
    /// counting a failed leg as free; a large value acts as a worst-case
    /// penalty instead.
    AssumeMinutes(u32),
}

impl MissingLegPolicy {
    /// Collapse per-leg outcomes into per-participant round-trip minutes.
    ///
    /// Legs arrive as `(outbound, return)` pairs, one per participant, in
    /// participant order. `None` means the candidate is excluded under
    /// this policy.
    #[must_use]
    pub fn resolve(&self, legs: &[(Option<u32>, Option<u32>)]) -> Option<Vec<u32>> {
        let mut round_trips = Vec::with_capacity(legs.len());
        for (outbound, inbound) in legs {
            let total = match self {
                Self::ExcludeCandidate => (*outbound)?.saturating_add((*inbound)?),
                Self::AssumeMinutes(fallback) => outbound
                    .unwrap_or(*fallback)
                    .saturating_add(inbound.unwrap_or(*fallback)),
            };
            round_trips.push(total);
        }
        Some(round_trips)
    }
}

/// Scores per-participant round-trip times; lower is better.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    fairness_weight: f64,
}

impl Scorer {
    /// `fairness_weight` controls how strongly uneven travel times are
    /// penalized; expected to lie in [0, 1].
    #[must_use]
    pub fn new(fairness_weight: f64) -> Self {
        Self { fairness_weight }
    }

    /// Combined total-time and fairness score.
    ///
    /// `sum(times) + fairness_weight * stddev(times) * count(times)`,
    /// where `stddev` is the population standard deviation. The
    /// dispersion penalty scales with group size, so imbalance in a
    /// larger group weighs proportionally more. Empty input scores
    /// `+infinity` and is never selected.
    #[must_use]
    pub fn score(&self, journey_times: &[u32]) -> f64 {
        if journey_times.is_empty() {
            return f64::INFINITY;
        }
        let total: u64 = journey_times.iter().map(|&m| u64::from(m)).sum();
        let count = journey_times.len() as f64;
        total as f64 + self.fairness_weight * population_std_dev(journey_times) * count
    }
}

/// Population standard deviation; 0 for fewer than 2 values.
fn population_std_dev(values: &[u32]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&m| f64::from(m)).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&m| {
            let diff = f64::from(m) - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}
