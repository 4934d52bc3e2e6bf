use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::error::DataIntegrityError;
use crate::types::{CatalogRecord, Entry, EntryId, ProgressRecord, Tags};

use super::EntryTable;

/// Knobs for [`EntryTable::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Preferred title languages, most preferred first.
    pub languages: Vec<String>,
    /// Ceiling for a watched episode count.
    pub max_watched_episodes: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            max_watched_episodes: 10_000,
        }
    }
}

impl EntryTable {
    /// Merge catalog records with the user's progress records by id.
    ///
    /// Catalog records without progress get empty user fields. A progress
    /// record whose id is not in the catalog fails the whole build.
    pub fn build(
        catalog: &[CatalogRecord],
        progress: &[ProgressRecord],
        options: &BuildOptions,
    ) -> Result<Self, DataIntegrityError> {
        let mut seen: HashSet<EntryId> = HashSet::with_capacity(catalog.len());
        for record in catalog {
            if !seen.insert(record.id) {
                return Err(DataIntegrityError::DuplicateEntry { id: record.id });
            }
            check_score(record.id, record.score)?;
        }

        let mut by_id: HashMap<EntryId, &ProgressRecord> = HashMap::with_capacity(progress.len());
        for record in progress {
            if !seen.contains(&record.id) {
                return Err(DataIntegrityError::UnknownEntry { id: record.id });
            }
            if by_id.insert(record.id, record).is_some() {
                return Err(DataIntegrityError::DuplicateProgress { id: record.id });
            }
            if let Some(watched) = record.watched_episodes {
                if watched > options.max_watched_episodes {
                    return Err(DataIntegrityError::WatchedAboveCeiling {
                        id: record.id,
                        watched,
                        ceiling: options.max_watched_episodes,
                    });
                }
            }
            check_score(record.id, record.score)?;
        }

        let entries: Vec<Entry> = catalog
            .iter()
            .map(|record| merge_one(record, by_id.get(&record.id).copied(), &options.languages))
            .collect();

        let table = Self::from_entries(entries);
        info!(
            entries = table.len(),
            tracked = by_id.len(),
            "Built entry store"
        );
        Ok(table)
    }
}

fn check_score(id: EntryId, score: Option<f64>) -> Result<(), DataIntegrityError> {
    match score {
        Some(s) if !(0.0..=10.0).contains(&s) => {
            Err(DataIntegrityError::ScoreOutOfRange { id, score: s })
        }
        _ => Ok(()),
    }
}

fn merge_one(record: &CatalogRecord, progress: Option<&ProgressRecord>, languages: &[String]) -> Entry {
    let title = localized_title(record, languages).to_string();
    if progress.is_none() {
        debug!(id = %record.id, "Catalog entry has no user progress");
    }
    Entry {
        id: record.id,
        title,
        episode_count: record.episodes,
        episode_avg_duration: record.episode_avg_duration,
        air_start: record.air_start,
        air_end: record.air_end,
        catalog_score: record.score,
        tags: Tags {
            genres: to_set(&record.genres),
            themes: to_set(&record.themes),
            studios: to_set(&record.studios),
            demographics: to_set(&record.demographics),
        },
        relations: record.relations.clone(),
        broadcast: record.broadcast,
        user_watched_episodes: progress.and_then(|p| p.watched_episodes),
        user_score: progress.and_then(|p| p.score),
    }
}

fn to_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the display title for the first preferred language that has one.
///
/// Each language tag is tried exactly, then by its primary subtag
/// (`en-US` falls back to `en`). Without a match the default title is used.
pub fn localized_title<'a>(record: &'a CatalogRecord, languages: &[String]) -> &'a str {
    for lang in languages {
        if let Some(title) = find_title(record, lang) {
            return title;
        }
        if let Some((primary, _)) = lang.split_once('-') {
            if let Some(title) = find_title(record, primary) {
                return title;
            }
        }
    }
    &record.title
}

fn find_title<'a>(record: &'a CatalogRecord, lang: &str) -> Option<&'a str> {
    record
        .titles
        .iter()
        .find(|(key, title)| key.eq_ignore_ascii_case(lang) && !title.trim().is_empty())
        .map(|(_, title)| title.as_str())
}
