//! Watched and to-watch time totals.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::AnalyzeError;
use crate::store::EntryTable;
use crate::types::Entry;

/// Watched and committed viewing time over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DurationSummary {
    #[serde(serialize_with = "as_secs")]
    pub watched: Duration,
    #[serde(serialize_with = "as_secs")]
    pub to_watch: Duration,
}

impl DurationSummary {
    pub fn compute(entries: &EntryTable) -> Self {
        Self {
            watched: watched_duration(entries),
            to_watch: to_watch_duration(entries),
        }
    }

    /// Share of the to-watch time already watched.
    pub fn completion(&self) -> Result<f64, AnalyzeError> {
        if self.to_watch.is_zero() {
            return Err(AnalyzeError::InsufficientData(
                "to-watch duration is zero, completion ratio undefined".into(),
            ));
        }
        Ok(self.watched.as_secs_f64() / self.to_watch.as_secs_f64())
    }
}

fn as_secs<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_u64(d.as_secs())
}

fn entry_watched(entry: &Entry) -> Option<Duration> {
    Some(entry.episode_avg_duration?.saturating_mul(entry.user_watched_episodes?))
}

fn entry_to_watch(entry: &Entry) -> Option<Duration> {
    let episodes = match (entry.episode_count, entry.user_watched_episodes) {
        (Some(total), Some(watched)) => total.max(watched),
        (Some(n), None) | (None, Some(n)) => n,
        (None, None) => return None,
    };
    Some(entry.episode_avg_duration?.saturating_mul(episodes))
}

/// Sum of `watched episodes × average episode duration`.
///
/// Untracked entries (no watched count) contribute nothing, as do entries
/// with an unknown episode duration.
pub fn watched_duration(entries: &EntryTable) -> Duration {
    entries
        .iter()
        .filter_map(entry_watched)
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Sum of `max(episode count, watched episodes) × average episode duration`:
/// the total commitment, including episodes not aired yet for entries the
/// user started beyond the announced count.
pub fn to_watch_duration(entries: &EntryTable) -> Duration {
    entries
        .iter()
        .filter_map(entry_to_watch)
        .fold(Duration::ZERO, Duration::saturating_add)
}
