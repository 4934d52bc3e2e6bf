//! Analysis orchestrator: Entry Store → Relation Graph → Franchises → Statistics.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyze::{self, StatsReport};
use crate::config::AnistatConfig;
use crate::error::{DataIntegrityError, Result};
use crate::franchise::{Franchise, RelationGraph, assemble};
use crate::progress::{ProgressReporter, Stage};
use crate::store::{BuildOptions, EntryTable};
use crate::types::{CatalogRecord, EntryId, ProgressRecord};

/// Who the analysis is for and when it is evaluated.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub user: String,
    /// Reference instant for schedule and release queries.
    pub reference_time: DateTime<Tz>,
    /// Preferred title languages, most preferred first.
    pub languages: Vec<String>,
}

impl AnalysisRequest {
    pub fn new(user: impl Into<String>, reference_time: DateTime<Tz>) -> Self {
        Self {
            user: user.into(),
            reference_time,
            languages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }
}

/// Everything one run produces. Owns the merged store; franchises are
/// re-borrowed from it on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub user: String,
    pub entries: EntryTable,
    /// Connected components of the relation graph, ordered by lowest id.
    pub components: Vec<BTreeSet<EntryId>>,
    pub report: StatsReport,
}

impl Analysis {
    pub fn franchises(&self) -> std::result::Result<Vec<Franchise<'_>>, DataIntegrityError> {
        assemble(&self.entries, &self.components)
    }
}

/// Runs the four stages for a validated configuration.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnistatConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnistatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnistatConfig {
        &self.config
    }

    /// Merge, cluster and analyze already-fetched records.
    ///
    /// Data integrity problems abort the run. Statistics that cannot be
    /// computed are recorded in [`StatsReport::failures`].
    pub fn run(
        &self,
        request: &AnalysisRequest,
        catalog: &[CatalogRecord],
        progress: &[ProgressRecord],
        reporter: &dyn ProgressReporter,
    ) -> Result<Analysis> {
        let start = Instant::now();

        reporter.start(Stage::MergeEntries, Some(catalog.len() as u64));
        let options = BuildOptions {
            languages: request.languages.clone(),
            max_watched_episodes: self.config.store.max_watched_episodes,
        };
        let entries = EntryTable::build(catalog, progress, &options)?;
        reporter.finish(Stage::MergeEntries);

        reporter.start(Stage::BuildGraph, Some(entries.len() as u64));
        let graph = RelationGraph::build(&entries, &self.config.clustering.continuity_kinds);
        let components = graph.connected_components();
        reporter.finish(Stage::BuildGraph);

        let report = {
            reporter.start(Stage::AssembleFranchises, Some(components.len() as u64));
            let franchises = assemble(&entries, &components)?;
            reporter.finish(Stage::AssembleFranchises);

            reporter.start(Stage::ComputeStatistics, None);
            let report = analyze::compute(
                &entries,
                &franchises,
                &request.reference_time,
                &self.config.statistics,
            );
            reporter.finish(Stage::ComputeStatistics);
            report
        };

        for failure in &report.failures {
            reporter.message(&format!(
                "{} unavailable: {}",
                failure.statistic, failure.message
            ));
        }

        info!(
            user = %request.user,
            entries = entries.len(),
            franchises = components.len(),
            duration = ?start.elapsed(),
            "Analysis complete"
        );
        Ok(Analysis {
            user: request.user.clone(),
            entries,
            components,
            report,
        })
    }
}

/// Key an [`Analysis`] is cached under.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub user: String,
    pub reference_time: DateTime<Tz>,
    pub languages: Vec<String>,
}

impl CacheKey {
    /// Same user, same instant in the same timezone, same title languages.
    pub fn matches(&self, request: &AnalysisRequest) -> bool {
        self.user == request.user
            && self.reference_time == request.reference_time
            && self.reference_time.timezone() == request.reference_time.timezone()
            && self.languages == request.languages
    }
}

impl From<&AnalysisRequest> for CacheKey {
    fn from(request: &AnalysisRequest) -> Self {
        Self {
            user: request.user.clone(),
            reference_time: request.reference_time,
            languages: request.languages.clone(),
        }
    }
}

/// Holds the most recent [`Analysis`]. A request with another key discards it.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    slot: Option<(CacheKey, Analysis)>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&CacheKey> {
        self.slot.as_ref().map(|(key, _)| key)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// Return the cached analysis for `request`, running the pipeline on a miss.
    ///
    /// The previous entry is dropped before the run, so a failed run leaves
    /// the cache empty.
    pub fn get_or_run(
        &mut self,
        pipeline: &AnalysisPipeline,
        request: &AnalysisRequest,
        catalog: &[CatalogRecord],
        progress: &[ProgressRecord],
        reporter: &dyn ProgressReporter,
    ) -> Result<&Analysis> {
        let entry = match self.slot.take() {
            Some(cached) if cached.0.matches(request) => {
                debug!(user = %request.user, "Analysis cache hit");
                cached
            }
            previous => {
                if previous.is_some() {
                    debug!(user = %request.user, "Discarding cached analysis");
                }
                drop(previous);
                let analysis = pipeline.run(request, catalog, progress, reporter)?;
                (CacheKey::from(request), analysis)
            }
        };
        let (_, analysis) = self.slot.insert(entry);
        Ok(&*analysis)
    }
}
