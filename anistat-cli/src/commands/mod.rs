pub mod analyze;
pub mod export;
pub mod franchises;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Args, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;

use anistat_core::config::AnistatConfig;
use anistat_core::pipeline::{Analysis, AnalysisPipeline, AnalysisRequest};
use anistat_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};
use anistat_core::types::{CatalogRecord, ProgressRecord};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute every statistic for a watch list
    Analyze(analyze::AnalyzeArgs),
    /// List franchises with their representative and members
    Franchises(franchises::FranchisesArgs),
    /// Write the merged entry table as JSON
    Export(export::ExportArgs),
}

pub fn run(cmd: Command, quiet: bool) -> anyhow::Result<()> {
    match cmd {
        Command::Analyze(args) => analyze::run(&args, quiet),
        Command::Franchises(args) => franchises::run(&args, quiet),
        Command::Export(args) => export::run(&args, quiet),
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Inputs shared by every command.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Catalog records (JSON array)
    #[arg(long)]
    pub catalog: PathBuf,

    /// User progress records (JSON array)
    #[arg(long)]
    pub progress: PathBuf,

    /// User the progress belongs to
    #[arg(long, default_value = "local")]
    pub user: String,

    /// Reference instant, RFC 3339 (default: now)
    #[arg(long)]
    pub now: Option<String>,

    /// IANA timezone results are expressed in
    #[arg(long, default_value = "UTC", env = "ANISTAT_TZ")]
    pub tz: String,

    /// Preferred title language, repeatable (e.g. --lang en --lang ja)
    #[arg(long = "lang")]
    pub languages: Vec<String>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl InputArgs {
    /// Resolve `--now` and `--tz` into the reference instant. Only place
    /// that reads the wall clock.
    pub fn reference_time(&self) -> anyhow::Result<DateTime<Tz>> {
        let tz: Tz = self
            .tz
            .parse()
            .map_err(|e| anyhow::anyhow!("Unknown timezone {:?}: {e}", self.tz))?;
        let instant = match &self.now {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now timestamp: {raw}"))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };
        Ok(instant.with_timezone(&tz))
    }

    pub fn load_config(&self) -> anyhow::Result<AnistatConfig> {
        match &self.config {
            Some(path) => AnistatConfig::load(path)
                .with_context(|| format!("Cannot load config: {}", path.display())),
            None => Ok(AnistatConfig::default()),
        }
    }

    pub fn request(&self) -> anyhow::Result<AnalysisRequest> {
        Ok(AnalysisRequest::new(self.user.clone(), self.reference_time()?)
            .with_languages(self.languages.clone()))
    }

    /// Load everything and run the pipeline once.
    pub fn analyze(&self, quiet: bool) -> anyhow::Result<Analysis> {
        let pipeline =
            AnalysisPipeline::new(self.load_config()?).context("Invalid config")?;
        let request = self.request()?;
        let catalog: Vec<CatalogRecord> = read_json(&self.catalog, "catalog")?;
        let progress: Vec<ProgressRecord> = read_json(&self.progress, "progress")?;

        let reporter: Box<dyn ProgressReporter> = if quiet {
            Box::new(NoopReporter)
        } else {
            Box::new(IndicatifReporter::default())
        };
        pipeline
            .run(&request, &catalog, &progress, reporter.as_ref())
            .context("Analysis failed")
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {what} file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Cannot parse {what} file: {}", path.display()))
}

/// `1h 05m` style rendering for report durations.
pub fn format_duration(d: std::time::Duration) -> String {
    let minutes = d.as_secs() / 60;
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}
