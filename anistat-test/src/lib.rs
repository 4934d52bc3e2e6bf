// Integration test utilities and fixture management for anistat.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;

use anistat_core::config::AnistatConfig;
use anistat_core::pipeline::{Analysis, AnalysisPipeline, AnalysisRequest};
use anistat_core::progress::NoopReporter;
use anistat_core::types::{Broadcast, CatalogRecord, EntryId, ProgressRecord, Relation, RelationKind};

// ── Record builders ──────────────────────────────────────────────

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad date {raw}: {e}"))
}

/// Fluent builder for one [`CatalogRecord`].
#[derive(Debug, Clone)]
pub struct CatalogEntry(CatalogRecord);

impl CatalogEntry {
    pub fn new(id: u64, title: &str) -> Self {
        Self(CatalogRecord {
            id: EntryId(id),
            title: title.to_string(),
            ..CatalogRecord::default()
        })
    }

    /// Episode count and average episode length in minutes.
    pub fn episodes(mut self, count: u32, minutes: u64) -> Self {
        self.0.episodes = Some(count);
        self.0.episode_avg_duration = Some(Duration::from_secs(minutes * 60));
        self
    }

    pub fn aired(mut self, start: &str, end: Option<&str>) -> Self {
        self.0.air_start = Some(date(start));
        self.0.air_end = end.map(date);
        self
    }

    pub fn score(mut self, score: f64) -> Self {
        self.0.score = Some(score);
        self
    }

    pub fn title_in(mut self, lang: &str, title: &str) -> Self {
        self.0.titles.insert(lang.to_string(), title.to_string());
        self
    }

    pub fn genres(mut self, genres: &[&str]) -> Self {
        self.0.genres = genres.iter().map(|g| (*g).to_string()).collect();
        self
    }

    pub fn themes(mut self, themes: &[&str]) -> Self {
        self.0.themes = themes.iter().map(|t| (*t).to_string()).collect();
        self
    }

    pub fn studio(mut self, studio: &str) -> Self {
        self.0.studios = vec![studio.to_string()];
        self
    }

    pub fn demographic(mut self, demographic: &str) -> Self {
        self.0.demographics = vec![demographic.to_string()];
        self
    }

    pub fn related(mut self, id: u64, kind: RelationKind) -> Self {
        self.0.relations.push(Relation {
            id: EntryId(id),
            kind,
        });
        self
    }

    pub fn broadcast(mut self, weekday: Weekday, hour: u32, minute: u32, timezone: Tz) -> Self {
        self.0.broadcast = Some(Broadcast {
            weekday,
            time: NaiveTime::from_hms_opt(hour, minute, 0).expect("valid broadcast time"),
            timezone,
        });
        self
    }

    pub fn build(self) -> CatalogRecord {
        self.0
    }
}

pub fn progress(id: u64, watched: Option<u32>, score: Option<f64>) -> ProgressRecord {
    ProgressRecord {
        id: EntryId(id),
        watched_episodes: watched,
        score,
    }
}

// ── Sample watch list ────────────────────────────────────────────

/// Wednesday 2024-04-10 12:00 in Tokyo.
pub fn reference_time() -> DateTime<Tz> {
    chrono_tz::Asia::Tokyo
        .with_ymd_and_hms(2024, 4, 10, 12, 0, 0)
        .single()
        .expect("unambiguous reference time")
}

/// A small catalog with known answers.
///
/// - 1 → 2 sequel, 2 → 3 side story: one franchise {1, 2, 3}, represented by 1.
///   The relation 2 → 3 is declared on one side only.
/// - 4 and 5 are linked by `other` only: two franchises.
/// - 6 and 7 are airing at [`reference_time`]; 6 has a Wednesday 23:00 slot,
///   7 none (weekly from its Monday start).
/// - 8 starts after the reference time.
/// - 9 is unannounced and points at an entry outside the catalog.
pub fn sample_catalog() -> Vec<CatalogRecord> {
    vec![
        CatalogEntry::new(1, "Hoshifuru Gakuen")
            .title_in("en", "Starfall Academy")
            .episodes(12, 24)
            .aired("2019-04-05", Some("2019-06-21"))
            .score(8.1)
            .genres(&["Action", "Fantasy"])
            .themes(&["School"])
            .studio("Studio Kite")
            .demographic("Shounen")
            .related(2, RelationKind::Sequel)
            .build(),
        CatalogEntry::new(2, "Hoshifuru Gakuen II")
            .title_in("en", "Starfall Academy II")
            .episodes(12, 24)
            .aired("2021-01-08", Some("2021-03-26"))
            .score(8.4)
            .genres(&["Action", "Fantasy"])
            .themes(&["School"])
            .studio("Studio Kite")
            .demographic("Shounen")
            .related(1, RelationKind::Prequel)
            .related(3, RelationKind::SideStory)
            .build(),
        CatalogEntry::new(3, "Hoshifuru Gakuen: Recess")
            .episodes(1, 30)
            .aired("2021-08-01", Some("2021-08-01"))
            .score(7.2)
            .genres(&["Comedy", "Fantasy"])
            .themes(&["School"])
            .studio("Studio Kite")
            .demographic("Shounen")
            .build(),
        CatalogEntry::new(4, "Harbor Lights")
            .episodes(24, 23)
            .aired("2022-10-02", Some("2023-03-19"))
            .score(7.8)
            .genres(&["Drama", "Romance"])
            .studio("Studio Pier")
            .demographic("Josei")
            .related(5, RelationKind::Other)
            .build(),
        CatalogEntry::new(5, "Harbor Lights Recap")
            .episodes(1, 90)
            .aired("2023-05-01", Some("2023-05-01"))
            .score(6.0)
            .genres(&["Drama"])
            .studio("Studio Pier")
            .related(4, RelationKind::Other)
            .build(),
        CatalogEntry::new(6, "Orbital Cooks")
            .episodes(13, 24)
            .aired("2024-04-03", None)
            .score(7.5)
            .genres(&["Comedy", "Sci-Fi"])
            .themes(&["Gourmet"])
            .studio("Studio Kite")
            .demographic("Seinen")
            .broadcast(Weekday::Wed, 23, 0, chrono_tz::Asia::Tokyo)
            .build(),
        CatalogEntry::new(7, "Moonlit Ledger")
            .episodes(12, 24)
            .aired("2024-04-01", None)
            .score(8.9)
            .genres(&["Mystery", "Drama"])
            .themes(&["Detective"])
            .studio("Studio Pier")
            .demographic("Seinen")
            .build(),
        CatalogEntry::new(8, "Gearheart")
            .episodes(12, 24)
            .aired("2024-07-05", None)
            .genres(&["Action", "Sci-Fi"])
            .themes(&["Mecha"])
            .studio("Studio Bolt")
            .build(),
        CatalogEntry::new(9, "Untitled Project")
            .related(99, RelationKind::Sequel)
            .build(),
    ]
}

pub fn sample_progress() -> Vec<ProgressRecord> {
    vec![
        progress(1, Some(12), Some(9.0)),
        progress(2, Some(12), Some(8.0)),
        progress(3, Some(1), Some(6.0)),
        progress(4, Some(24), Some(7.0)),
        progress(6, Some(1), None),
        progress(7, Some(1), Some(10.0)),
    ]
}

// ── Pipeline helpers ─────────────────────────────────────────────

/// Run the full pipeline over the sample watch list.
pub fn run_sample(config: AnistatConfig) -> Analysis {
    run_pipeline(config, &sample_catalog(), &sample_progress())
}

pub fn run_pipeline(
    config: AnistatConfig,
    catalog: &[CatalogRecord],
    progress: &[ProgressRecord],
) -> Analysis {
    let pipeline = AnalysisPipeline::new(config).expect("valid config");
    let request = AnalysisRequest::new("fixture", reference_time());
    pipeline
        .run(&request, catalog, progress, &NoopReporter)
        .expect("sample watch list is consistent")
}

// ── On-disk fixtures ─────────────────────────────────────────────

/// Catalog and progress JSON files in a temporary directory.
#[derive(Debug)]
pub struct WatchListFiles {
    pub dir: tempfile::TempDir,
}

impl WatchListFiles {
    pub fn new(catalog: &[CatalogRecord], progress: &[ProgressRecord]) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let files = Self { dir };
        files.write_json("catalog.json", catalog);
        files.write_json("progress.json", progress);
        files
    }

    pub fn sample() -> Self {
        Self::new(&sample_catalog(), &sample_progress())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn catalog(&self) -> PathBuf {
        self.path().join("catalog.json")
    }

    pub fn progress(&self) -> PathBuf {
        self.path().join("progress.json")
    }

    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.path().join("anistat.toml");
        std::fs::write(&path, toml).expect("write config");
        path
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, name: &str, value: &T) {
        let raw = serde_json::to_string_pretty(value).expect("serialize fixture");
        std::fs::write(self.path().join(name), raw).expect("write fixture");
    }
}
