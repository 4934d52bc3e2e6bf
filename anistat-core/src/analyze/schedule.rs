//! Air schedule and upcoming releases relative to a caller-supplied instant.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

use crate::store::EntryTable;
use crate::types::{Broadcast, Entry, EntryId};

/// Broadcaster timezone assumed when an entry carries no broadcast slot.
pub const DEFAULT_BROADCAST_TZ: Tz = chrono_tz::Asia::Tokyo;

/// An entry currently on air.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub id: EntryId,
    pub title: String,
    /// Next broadcast at or after the reference instant, in the reference
    /// instant's timezone.
    pub next_episode: Option<DateTime<Tz>>,
    pub air_start: NaiveDate,
    pub air_end: Option<NaiveDate>,
    pub episode_count: Option<u32>,
    pub user_watched_episodes: Option<u32>,
}

/// An entry that has not started airing yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseRow {
    pub id: EntryId,
    pub title: String,
    pub air_start: NaiveDate,
    pub days_until: i64,
}

/// Whether `entry` is on air on `today`: started on or before it and not
/// ended before it. An unknown end date means still airing.
pub fn is_airing(entry: &Entry, today: NaiveDate) -> bool {
    entry.air_start.is_some_and(|start| start <= today)
        && entry.air_end.is_none_or(|end| end >= today)
}

/// The weekly slot used to place an entry's episodes: the declared
/// broadcast, else `air_start`'s weekday at midnight broadcaster time.
pub fn weekly_slot(entry: &Entry) -> Option<Broadcast> {
    entry.broadcast.or_else(|| {
        entry.air_start.map(|start| Broadcast {
            weekday: start.weekday(),
            time: NaiveTime::MIN,
            timezone: DEFAULT_BROADCAST_TZ,
        })
    })
}

/// First occurrence of `slot` at or after `now`, expressed in `now`'s timezone.
///
/// Local times skipped by a DST transition resolve to the following week.
pub fn next_occurrence(slot: &Broadcast, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let local_today = now.with_timezone(&slot.timezone).date_naive();
    (0..14u64)
        .filter_map(|offset| local_today.checked_add_days(Days::new(offset)))
        .filter(|date| date.weekday() == slot.weekday)
        .filter_map(|date| {
            slot.timezone
                .from_local_datetime(&date.and_time(slot.time))
                .earliest()
        })
        .find(|t| t >= now)
        .map(|t| t.with_timezone(&now.timezone()))
}

fn next_episode(entry: &Entry, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let slot = weekly_slot(entry)?;
    let next = next_occurrence(&slot, now)?;
    let past_end = entry
        .air_end
        .is_some_and(|end| next.with_timezone(&slot.timezone).date_naive() > end);
    (!past_end).then_some(next)
}

/// Entries on air at `now`, soonest next episode first. Entries whose next
/// episode cannot be placed come last; ties break by id.
pub fn air_schedule(entries: &EntryTable, now: &DateTime<Tz>) -> Vec<ScheduleRow> {
    let today = now.date_naive();
    let mut rows: Vec<ScheduleRow> = entries
        .iter()
        .filter(|e| is_airing(e, today))
        .filter_map(|e| {
            Some(ScheduleRow {
                id: e.id,
                title: e.title.clone(),
                next_episode: next_episode(e, now),
                air_start: e.air_start?,
                air_end: e.air_end,
                episode_count: e.episode_count,
                user_watched_episodes: e.user_watched_episodes,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        (a.next_episode.is_none(), a.next_episode, a.id)
            .cmp(&(b.next_episode.is_none(), b.next_episode, b.id))
    });
    rows
}

/// Entries whose air start is strictly after `now`'s local date, earliest first.
pub fn next_releases(entries: &EntryTable, now: &DateTime<Tz>) -> Vec<ReleaseRow> {
    let today = now.date_naive();
    let mut rows: Vec<ReleaseRow> = entries
        .iter()
        .filter_map(|e| {
            let start = e.air_start.filter(|&s| s > today)?;
            Some(ReleaseRow {
                id: e.id,
                title: e.title.clone(),
                air_start: start,
                days_until: (start - today).num_days(),
            })
        })
        .collect();
    rows.sort_by_key(|r| (r.air_start, r.id));
    rows
}
