//! Statistics engine: side-effect-free queries over the entry store and the
//! franchise list.
//!
//! Each query lives in its own module and can be called directly. [`compute`]
//! runs all of them for one reference instant and gathers the results into a
//! [`StatsReport`], recording per-statistic failures instead of aborting.

pub mod cooccurrence;
pub mod duration;
pub mod franchise;
pub mod schedule;
pub mod score;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::DateTime;
use chrono_tz::Tz;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::StatisticsSection;
use crate::error::AnalyzeError;
use crate::franchise::Franchise;
use crate::store::EntryTable;
use crate::types::TagDimension;

pub use cooccurrence::{PairCount, co_occurrence, count_pairs};
pub use duration::{DurationSummary, to_watch_duration, watched_duration};
pub use franchise::{FranchiseScore, favorite_franchises};
pub use schedule::{ReleaseRow, ScheduleRow, air_schedule, next_releases};
pub use score::{
    Agreement, AgreementThresholds, BiasRow, PopularityBias, ScoreGroup, ScorePair, ScoreTrend,
    categorical_breakdown, popularity_bias, rank_scale, score_pairs, score_trend,
};

/// A statistic that could not be computed for this sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatFailure {
    pub statistic: &'static str,
    pub message: String,
}

/// Every statistic for one store, franchise list and reference instant.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub reference_time: DateTime<Tz>,
    pub air_schedule: Vec<ScheduleRow>,
    pub next_releases: Vec<ReleaseRow>,
    pub durations: DurationSummary,
    pub completion: Option<f64>,
    pub score_pairs: Vec<ScorePair>,
    pub score_trend: Option<ScoreTrend>,
    pub breakdowns: BTreeMap<TagDimension, Vec<ScoreGroup>>,
    pub popularity_bias: Option<PopularityBias>,
    pub co_occurrence: BTreeMap<TagDimension, Vec<PairCount>>,
    pub favorite_franchises: Vec<FranchiseScore>,
    /// Statistics left out above, with the reason.
    pub failures: Vec<StatFailure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StatsReport {
    pub fn failure(&self, statistic: &str) -> Option<&StatFailure> {
        self.failures.iter().find(|f| f.statistic == statistic)
    }
}

fn join<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

fn settle<T>(
    statistic: &'static str,
    result: Result<T, AnalyzeError>,
    failures: &mut Vec<StatFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(statistic, error = %e, "Statistic skipped");
            failures.push(StatFailure {
                statistic,
                message: e.to_string(),
            });
            None
        }
    }
}

type DimensionRows = (TagDimension, Vec<ScoreGroup>, Vec<PairCount>);

/// Run every statistic against `entries` and `franchises` at `now`.
///
/// With `config.parallel` the independent queries run on the rayon pool;
/// the report is identical either way.
pub fn compute(
    entries: &EntryTable,
    franchises: &[Franchise<'_>],
    now: &DateTime<Tz>,
    config: &StatisticsSection,
) -> StatsReport {
    let start = Instant::now();
    let parallel = config.parallel;
    let thresholds = AgreementThresholds {
        close: config.agreement_close,
        far: config.agreement_far,
    };

    let ((schedule, releases), ((durations, pairs), (trend, bias))) = join(
        parallel,
        || {
            join(
                parallel,
                || air_schedule(entries, now),
                || next_releases(entries, now),
            )
        },
        || {
            join(
                parallel,
                || {
                    join(
                        parallel,
                        || DurationSummary::compute(entries),
                        || score_pairs(entries),
                    )
                },
                || {
                    join(
                        parallel,
                        || score_trend(entries),
                        || popularity_bias(entries, thresholds),
                    )
                },
            )
        },
    );

    let per_dimension = |dimension: TagDimension| -> DimensionRows {
        (
            dimension,
            categorical_breakdown(entries, dimension, config.min_group_size),
            co_occurrence(entries, dimension),
        )
    };
    let dimension_rows: Vec<DimensionRows> = if parallel {
        config.dimensions.par_iter().map(|&d| per_dimension(d)).collect()
    } else {
        config.dimensions.iter().map(|&d| per_dimension(d)).collect()
    };
    let mut breakdowns = BTreeMap::new();
    let mut co_occurrences = BTreeMap::new();
    for (dimension, groups, pairs) in dimension_rows {
        breakdowns.insert(dimension, groups);
        co_occurrences.insert(dimension, pairs);
    }

    let mut failures = Vec::new();
    let completion = settle("completion", durations.completion(), &mut failures);
    let score_trend = settle("score_trend", trend, &mut failures);
    let popularity_bias = settle("popularity_bias", bias, &mut failures);

    let report = StatsReport {
        reference_time: *now,
        air_schedule: schedule,
        next_releases: releases,
        durations,
        completion,
        score_pairs: pairs,
        score_trend,
        breakdowns,
        popularity_bias,
        co_occurrence: co_occurrences,
        favorite_franchises: favorite_franchises(franchises),
        failures,
        elapsed: start.elapsed(),
    };

    info!(
        airing = report.air_schedule.len(),
        upcoming = report.next_releases.len(),
        score_pairs = report.score_pairs.len(),
        failures = report.failures.len(),
        parallel,
        duration = ?report.elapsed,
        "Computed statistics"
    );
    report
}
