use std::collections::BTreeSet;
use std::time::Duration;

use anistat_core::analyze::Agreement;
use anistat_core::config::AnistatConfig;
use anistat_core::error::{AnistatError, DataIntegrityError};
use anistat_core::pipeline::{AnalysisCache, AnalysisPipeline, AnalysisRequest};
use anistat_core::progress::NoopReporter;
use anistat_core::types::{EntryId, RelationKind, TagDimension};
use anistat_test::{
    CatalogEntry, progress, reference_time, run_pipeline, run_sample, sample_catalog,
    sample_progress,
};
use chrono::TimeZone;

fn ids(franchise: &anistat_core::franchise::Franchise<'_>) -> Vec<u64> {
    franchise.ids().map(|id| id.0).collect()
}

// ── Franchises ───────────────────────────────────────────────────

#[test]
fn sample_franchises() {
    let analysis = run_sample(AnistatConfig::default());
    let franchises = analysis.franchises().unwrap();

    let groups: Vec<Vec<u64>> = franchises.iter().map(ids).collect();
    assert_eq!(
        groups,
        vec![vec![1, 2, 3], vec![4], vec![5], vec![6], vec![7], vec![8], vec![9]]
    );
    assert_eq!(franchises[0].representative().id, EntryId(1));
    assert_eq!(franchises[0].title(), "Hoshifuru Gakuen");
}

#[test]
fn franchises_partition_the_catalog() {
    let analysis = run_sample(AnistatConfig::default());
    let mut seen = BTreeSet::new();
    for franchise in analysis.franchises().unwrap() {
        for id in franchise.ids() {
            assert!(seen.insert(id), "entry {id} listed twice");
        }
    }
    let all: BTreeSet<EntryId> = analysis.entries.ids().collect();
    assert_eq!(seen, all);
}

#[test]
fn narrower_continuity_splits_side_story() {
    let mut config = AnistatConfig::default();
    config.clustering.continuity_kinds = [RelationKind::Sequel, RelationKind::Prequel]
        .into_iter()
        .collect();
    let analysis = run_sample(config);
    let groups: Vec<Vec<u64>> = analysis.franchises().unwrap().iter().map(ids).collect();
    assert_eq!(groups[0], vec![1, 2]);
    assert_eq!(groups[1], vec![3]);
}

#[test]
fn wider_continuity_merges_other_relations() {
    let mut config = AnistatConfig::default();
    config.clustering.continuity_kinds.insert(RelationKind::Other);
    let analysis = run_sample(config);
    let groups: Vec<Vec<u64>> = analysis.franchises().unwrap().iter().map(ids).collect();
    assert!(groups.contains(&vec![4, 5]));
}

// ── Statistics ───────────────────────────────────────────────────

#[test]
fn sample_durations() {
    let report = run_sample(AnistatConfig::default()).report;
    assert_eq!(report.durations.watched, Duration::from_secs(1206 * 60));
    assert_eq!(report.durations.to_watch, Duration::from_secs(2136 * 60));
    let completion = report.completion.unwrap();
    assert!((completion - 1206.0 / 2136.0).abs() < 1e-12);
}

#[test]
fn sample_schedule_and_releases() {
    let report = run_sample(AnistatConfig::default()).report;

    let airing: Vec<u64> = report.air_schedule.iter().map(|r| r.id.0).collect();
    assert_eq!(airing, vec![6, 7]);
    let tokyo = chrono_tz::Asia::Tokyo;
    assert_eq!(
        report.air_schedule[0].next_episode,
        tokyo.with_ymd_and_hms(2024, 4, 10, 23, 0, 0).single()
    );
    assert_eq!(
        report.air_schedule[1].next_episode,
        tokyo.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).single()
    );

    assert_eq!(report.next_releases.len(), 1);
    assert_eq!(report.next_releases[0].id, EntryId(8));
    assert_eq!(report.next_releases[0].days_until, 86);
}

#[test]
fn sample_popularity_bias() {
    let report = run_sample(AnistatConfig::default()).report;
    assert_eq!(report.score_pairs.len(), 5);

    let bias = report.popularity_bias.unwrap();
    let order: Vec<u64> = bias.rows.iter().map(|r| r.id.0).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 7]);
    assert!((bias.rows[0].difference - 0.25).abs() < 1e-12);
    assert!((bias.rows[1].difference + 0.25).abs() < 1e-12);
    assert_eq!(bias.rows[0].agreement, Agreement::Far);
    assert_eq!(bias.rows[2].agreement, Agreement::Close);
    assert!((bias.conformity - 0.8).abs() < 1e-12);
}

#[test]
fn sample_breakdown_respects_minimum() {
    let report = run_sample(AnistatConfig::default()).report;
    assert!(report.breakdowns.values().all(Vec::is_empty));

    let mut config = AnistatConfig::default();
    config.statistics.min_group_size = 2;
    let report = run_sample(config).report;
    let genres: Vec<(&str, usize)> = report.breakdowns[&TagDimension::Genre]
        .iter()
        .map(|g| (g.tag.as_str(), g.count))
        .collect();
    assert_eq!(genres, vec![("Drama", 2), ("Action", 2), ("Fantasy", 3)]);
}

#[test]
fn sample_co_occurrence_and_favorites() {
    let report = run_sample(AnistatConfig::default()).report;
    let top = &report.co_occurrence[&TagDimension::Genre][0];
    assert_eq!((top.first.as_str(), top.second.as_str(), top.count), ("Action", "Fantasy", 2));

    let favorites: Vec<u64> = report
        .favorite_franchises
        .iter()
        .map(|f| f.representative.0)
        .collect();
    assert_eq!(favorites, vec![7, 1, 4]);
    assert_eq!(report.favorite_franchises[1].watched_episodes, 25);
    assert_eq!(report.favorite_franchises[1].scored_members, 3);
}

#[test]
fn sample_report_has_no_failures() {
    let report = run_sample(AnistatConfig::default()).report;
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.score_trend.unwrap().points.len(), 5);
}

// ── Inputs ───────────────────────────────────────────────────────

#[test]
fn localized_titles_follow_language_preference() {
    let pipeline = AnalysisPipeline::new(AnistatConfig::default()).unwrap();
    let request =
        AnalysisRequest::new("fixture", reference_time()).with_languages(vec!["en-GB".into()]);
    let analysis = pipeline
        .run(&request, &sample_catalog(), &sample_progress(), &NoopReporter)
        .unwrap();
    assert_eq!(analysis.entries.get(EntryId(1)).unwrap().title, "Starfall Academy");
    assert_eq!(
        analysis.entries.get(EntryId(3)).unwrap().title,
        "Hoshifuru Gakuen: Recess"
    );
}

#[test]
fn orphan_progress_is_fatal() {
    let pipeline = AnalysisPipeline::new(AnistatConfig::default()).unwrap();
    let mut records = sample_progress();
    records.push(progress(404, Some(1), None));
    let err = pipeline
        .run(
            &AnalysisRequest::new("fixture", reference_time()),
            &sample_catalog(),
            &records,
            &NoopReporter,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AnistatError::DataIntegrity(DataIntegrityError::UnknownEntry { id: EntryId(404) })
    ));
}

#[test]
fn untracked_entry_counts_toward_to_watch_only() {
    let catalog = vec![CatalogEntry::new(1, "solo").episodes(12, 24).build()];
    let report = run_pipeline(AnistatConfig::default(), &catalog, &[]).report;
    assert_eq!(report.durations.watched, Duration::ZERO);
    assert_eq!(report.durations.to_watch, Duration::from_secs(288 * 60));
}

#[test]
fn entry_table_exports_as_json_array() {
    let analysis = run_sample(AnistatConfig::default());
    let json = serde_json::to_value(&analysis.entries).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["user_watched_episodes"], 12);
    assert!(rows[4]["user_watched_episodes"].is_null());
}

#[test]
fn cache_serves_repeat_requests() {
    let pipeline = AnalysisPipeline::new(AnistatConfig::default()).unwrap();
    let mut cache = AnalysisCache::new();
    let request = AnalysisRequest::new("fixture", reference_time());

    let first = cache
        .get_or_run(&pipeline, &request, &sample_catalog(), &sample_progress(), &NoopReporter)
        .unwrap()
        .entries
        .len();
    let second = cache
        .get_or_run(&pipeline, &request, &[], &[], &NoopReporter)
        .unwrap()
        .entries
        .len();
    assert_eq!(first, second);
}
