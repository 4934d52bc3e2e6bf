//! Progress reporting for the analysis stages.
//!
//! The CLI uses `IndicatifReporter` for a spinner on stderr.
//! Library callers can use `NoopReporter` or provide their own implementation.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// One step of [`AnalysisPipeline::run`](crate::pipeline::AnalysisPipeline::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MergeEntries,
    BuildGraph,
    AssembleFranchises,
    ComputeStatistics,
}

impl Stage {
    pub const ALL: [Self; 4] = [
        Self::MergeEntries,
        Self::BuildGraph,
        Self::AssembleFranchises,
        Self::ComputeStatistics,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::MergeEntries => "Merging catalog and progress",
            Self::BuildGraph => "Building relation graph",
            Self::AssembleFranchises => "Assembling franchises",
            Self::ComputeStatistics => "Computing statistics",
        }
    }
}

/// Receives stage transitions from the pipeline.
pub trait ProgressReporter: Send + Sync {
    /// A stage is starting; `items` is the number of rows it will visit.
    fn start(&self, stage: Stage, items: Option<u64>);

    /// The current stage has finished.
    fn finish(&self, stage: Stage);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _stage: Stage, _items: Option<u64>) {}
    fn finish(&self, _stage: Stage) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by an `indicatif` bar counting finished stages.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    finished: Mutex<Vec<Stage>>,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new(ProgressBar::new(Stage::ALL.len() as u64))
    }
}

impl IndicatifReporter {
    pub fn new(bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}") {
            bar.set_style(style);
        }
        Self {
            bar,
            finished: Mutex::new(Vec::new()),
        }
    }

    /// A reporter that draws nothing; used under `--quiet` and in tests.
    pub fn hidden() -> Self {
        Self::new(ProgressBar::hidden())
    }

    pub fn finished_stages(&self) -> Vec<Stage> {
        self.finished
            .lock()
            .map(|stages| stages.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, stage: Stage, items: Option<u64>) {
        let msg = match items {
            Some(n) => format!("{} ({n} items)", stage.label()),
            None => stage.label().to_string(),
        };
        self.bar.set_message(msg);
    }

    fn finish(&self, stage: Stage) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.push(stage);
        }
        self.bar.inc(1);
        if stage == Stage::ComputeStatistics {
            self.bar.finish_and_clear();
        }
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_is_silent() {
        let reporter = NoopReporter;
        reporter.start(Stage::MergeEntries, Some(100));
        reporter.message("hello");
        reporter.finish(Stage::MergeEntries);
    }

    #[test]
    fn indicatif_reporter_tracks_stages() {
        let reporter = IndicatifReporter::hidden();
        for stage in Stage::ALL {
            reporter.start(stage, None);
            reporter.finish(stage);
        }
        assert_eq!(reporter.finished_stages(), Stage::ALL.to_vec());
    }
}
