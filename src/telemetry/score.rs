//! Heuristic client reputation score.

use crate::telemetry::stats::ClientStats;

const BASE: f64 = 5.0;
const MIN: f64 = 0.0;
const MAX: f64 = 10.0;

/// Score a client from its counters at time `now` (Unix seconds).
///
/// Informational only; never used for authorization. Always within [0, 10].
pub fn security_score(stats: &ClientStats, now: u64) -> f64 {
    let mut score = BASE;

    score += (stats.resource_counts.len() as f64 * 0.2).min(2.0);
    score += stats.successes as f64 / stats.total_requests.max(1) as f64 * 2.0;

    let tenure_secs = now.saturating_sub(stats.first_seen);
    if tenure_secs > 300 {
        score += (tenure_secs as f64 / 3600.0).min(1.5);
    }

    if stats.failures > 5 {
        score -= 1.0;
    }
    if stats.total_requests > 100 {
        score -= 0.5;
    }

    score.clamp(MIN, MAX)
}
