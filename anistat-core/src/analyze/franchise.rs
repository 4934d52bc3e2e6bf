//! Per-franchise rollups over the user's scores.

// Statistical computations intentionally cast int→float.
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::franchise::Franchise;
use crate::types::EntryId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FranchiseScore {
    pub representative: EntryId,
    pub title: String,
    pub mean_user_score: f64,
    pub scored_members: usize,
    pub members: usize,
    pub watched_episodes: u64,
}

fn rollup(franchise: &Franchise<'_>) -> Option<FranchiseScore> {
    let scores: Vec<f64> = franchise
        .members()
        .iter()
        .filter_map(|e| e.user_score)
        .collect();
    if scores.is_empty() {
        return None;
    }
    let representative = franchise.representative();
    Some(FranchiseScore {
        representative: representative.id,
        title: representative.title.clone(),
        mean_user_score: scores.iter().sum::<f64>() / scores.len() as f64,
        scored_members: scores.len(),
        members: franchise.len(),
        watched_episodes: franchise
            .members()
            .iter()
            .filter_map(|e| e.user_watched_episodes)
            .map(u64::from)
            .sum(),
    })
}

/// Franchises ranked by the user's mean score over their scored members.
///
/// Franchises without any user score are left out. Ties break by
/// representative id.
pub fn favorite_franchises(franchises: &[Franchise<'_>]) -> Vec<FranchiseScore> {
    let mut rows: Vec<FranchiseScore> = franchises.iter().filter_map(rollup).collect();
    rows.sort_by(|a, b| {
        b.mean_user_score
            .total_cmp(&a.mean_user_score)
            .then_with(|| a.representative.cmp(&b.representative))
    });
    rows
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::franchise::assemble;
    use crate::store::EntryTable;
    use crate::types::Entry;

    fn scored(id: u64, score: Option<f64>, watched: Option<u32>) -> Entry {
        let mut e = Entry::new(id, format!("show {id}"));
        e.user_score = score;
        e.user_watched_episodes = watched;
        e
    }

    fn components(groups: &[&[u64]]) -> Vec<BTreeSet<EntryId>> {
        groups
            .iter()
            .map(|g| g.iter().copied().map(EntryId).collect())
            .collect()
    }

    #[test]
    fn ranked_by_mean_score() {
        let table = EntryTable::from_entries(vec![
            scored(1, Some(6.0), Some(12)),
            scored(2, Some(8.0), Some(12)),
            scored(3, None, Some(3)),
            scored(4, Some(9.0), Some(24)),
            scored(5, None, None),
        ]);
        let franchises = assemble(&table, &components(&[&[1, 2, 3], &[4], &[5]])).unwrap();
        let rows = favorite_franchises(&franchises);

        assert_eq!(rows.len(), 2, "unscored franchise omitted");
        assert_eq!(rows[0].representative, EntryId(4));
        assert_eq!(rows[1].representative, EntryId(1));
        assert!((rows[1].mean_user_score - 7.0).abs() < 1e-12);
        assert_eq!(rows[1].scored_members, 2);
        assert_eq!(rows[1].members, 3);
        assert_eq!(rows[1].watched_episodes, 27);
    }

    #[test]
    fn ties_break_by_representative() {
        let table = EntryTable::from_entries(vec![
            scored(7, Some(8.0), None),
            scored(3, Some(8.0), None),
        ]);
        let franchises = assemble(&table, &components(&[&[3], &[7]])).unwrap();
        let reps: Vec<EntryId> = favorite_franchises(&franchises)
            .iter()
            .map(|r| r.representative)
            .collect();
        assert_eq!(reps, vec![EntryId(3), EntryId(7)]);
    }
}
