//! Score statistics: paired samples, categorical breakdown, rank-normalized
//! popularity bias, and score trend against air date.

// Statistical computations intentionally cast int→float.
#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::AnalyzeError;
use crate::store::EntryTable;
use crate::types::{EntryId, TagDimension};

// ── Paired sample ──────────────────────────────────────────────────

/// Catalog and user score of one entry, for downstream density estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePair {
    pub id: EntryId,
    pub title: String,
    pub catalog_score: f64,
    pub user_score: f64,
}

/// Entries carrying both a catalog and a user score, in id order.
pub fn score_pairs(entries: &EntryTable) -> Vec<ScorePair> {
    entries
        .iter()
        .filter_map(|e| {
            let (catalog_score, user_score) = e.paired_scores()?;
            Some(ScorePair {
                id: e.id,
                title: e.title.clone(),
                catalog_score,
                user_score,
            })
        })
        .collect()
}

// ── Categorical breakdown ──────────────────────────────────────────

/// User scores of every scored entry carrying one tag value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGroup {
    pub tag: String,
    pub count: usize,
    pub mean_score: f64,
    /// Individual user scores, in entry id order.
    pub scores: Vec<f64>,
}

/// Mean user score per tag value along `dimension`.
///
/// Only entries with a user score are counted. Groups with fewer than
/// `min_count` scores are dropped entirely. Result is sorted by mean score
/// descending, ties by tag descending.
pub fn categorical_breakdown(
    entries: &EntryTable,
    dimension: TagDimension,
    min_count: usize,
) -> Vec<ScoreGroup> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for entry in entries {
        let Some(score) = entry.user_score else {
            continue;
        };
        for tag in entry.tags.get(dimension) {
            groups.entry(tag.as_str()).or_default().push(score);
        }
    }

    let mut out: Vec<ScoreGroup> = groups
        .into_iter()
        .filter(|(_, scores)| scores.len() >= min_count)
        .map(|(tag, scores)| ScoreGroup {
            tag: tag.to_string(),
            count: scores.len(),
            mean_score: mean(&scores),
            scores,
        })
        .collect();
    out.sort_by(|a, b| {
        b.mean_score
            .total_cmp(&a.mean_score)
            .then_with(|| b.tag.cmp(&a.tag))
    });
    out
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ── Rank scaling ───────────────────────────────────────────────────

/// Scale a score column to `[0, 1]` by descending rank:
/// `1 - (rank_desc - 1) / (n - 1)`, so the top score maps to 1.0 and the
/// bottom one to 0.0. Tied values share their average rank.
///
/// Undefined for fewer than two values.
pub fn rank_scale(values: &[f64]) -> Result<Vec<f64>, AnalyzeError> {
    let n = values.len();
    if n <= 1 {
        return Err(AnalyzeError::InsufficientData(format!(
            "rank scaling needs at least 2 values, got {n}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0.0_f64; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]].total_cmp(&values[order[start]]) == Ordering::Equal {
            end += 1;
        }
        // Positions start..end hold 1-based ranks start+1..=end.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg_rank;
        }
        start = end;
    }

    let denom = (n - 1) as f64;
    Ok(ranks.into_iter().map(|r| 1.0 - (r - 1.0) / denom).collect())
}

// ── Popularity bias ────────────────────────────────────────────────

/// How closely the user's rank of an entry matches the catalog's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Agreement {
    Close,
    Moderate,
    Far,
}

impl Agreement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Moderate => "moderate",
            Self::Far => "far",
        }
    }
}

/// Absolute rank-difference bands for [`Agreement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgreementThresholds {
    pub close: f64,
    pub far: f64,
}

impl Default for AgreementThresholds {
    fn default() -> Self {
        Self {
            close: 0.05,
            far: 0.15,
        }
    }
}

impl AgreementThresholds {
    pub fn classify(&self, abs_difference: f64) -> Agreement {
        if abs_difference <= self.close {
            Agreement::Close
        } else if abs_difference <= self.far {
            Agreement::Moderate
        } else {
            Agreement::Far
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasRow {
    pub id: EntryId,
    pub title: String,
    pub catalog_score: f64,
    pub user_score: f64,
    pub catalog_scaled: f64,
    pub user_scaled: f64,
    /// `user_scaled - catalog_scaled`.
    pub difference: f64,
    pub abs_difference: f64,
    pub agreement: Agreement,
}

/// Rank-normalized comparison of user scores against catalog scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityBias {
    /// Sorted by `abs_difference` descending, ties by id.
    pub rows: Vec<BiasRow>,
    /// `1 - 2 * mean(abs_difference)`. Lies in `[-1, 1]`; realistic lists
    /// land in `[0, 1]` but nothing guarantees it.
    pub conformity: f64,
}

impl PopularityBias {
    /// `conformity` clamped to `[0, 1]` for percentage display.
    pub fn display_conformity(&self) -> f64 {
        self.conformity.clamp(0.0, 1.0)
    }
}

/// Rank-scale catalog and user scores independently over the entries that
/// carry both, and compare them per entry.
pub fn popularity_bias(
    entries: &EntryTable,
    thresholds: AgreementThresholds,
) -> Result<PopularityBias, AnalyzeError> {
    let pairs = score_pairs(entries);
    let catalog: Vec<f64> = pairs.iter().map(|p| p.catalog_score).collect();
    let user: Vec<f64> = pairs.iter().map(|p| p.user_score).collect();
    let catalog_scaled = rank_scale(&catalog)?;
    let user_scaled = rank_scale(&user)?;

    let mut rows: Vec<BiasRow> = pairs
        .into_iter()
        .zip(catalog_scaled.into_iter().zip(user_scaled))
        .map(|(pair, (c, u))| {
            let difference = u - c;
            let abs_difference = difference.abs();
            BiasRow {
                id: pair.id,
                title: pair.title,
                catalog_score: pair.catalog_score,
                user_score: pair.user_score,
                catalog_scaled: c,
                user_scaled: u,
                difference,
                abs_difference,
                agreement: thresholds.classify(abs_difference),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.abs_difference
            .total_cmp(&a.abs_difference)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mean_abs = rows.iter().map(|r| r.abs_difference).sum::<f64>() / rows.len() as f64;
    Ok(PopularityBias {
        rows,
        conformity: 1.0 - 2.0 * mean_abs,
    })
}

// ── Score trend ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub id: EntryId,
    /// Air start as a fractional year.
    pub year: f64,
    pub user_score: f64,
}

/// Least-squares line of user score against air start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTrend {
    /// Score change per year of air start.
    pub slope: f64,
    pub intercept: f64,
    pub points: Vec<TrendPoint>,
}

/// Air date as `year + elapsed_days / days_in_year`.
pub fn fractional_year(date: NaiveDate) -> f64 {
    let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
    f64::from(date.year()) + f64::from(date.ordinal0()) / days_in_year
}

/// Does the user favour newer or older entries?
pub fn score_trend(entries: &EntryTable) -> Result<ScoreTrend, AnalyzeError> {
    let points: Vec<TrendPoint> = entries
        .iter()
        .filter_map(|e| {
            Some(TrendPoint {
                id: e.id,
                year: fractional_year(e.air_start?),
                user_score: e.user_score?,
            })
        })
        .collect();

    let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.year, p.user_score)).collect();
    let (slope, intercept) = least_squares(&xy).ok_or_else(|| {
        AnalyzeError::InsufficientData(format!(
            "score trend needs at least 2 distinct air dates, got {} points",
            xy.len()
        ))
    })?;
    Ok(ScoreTrend {
        slope,
        intercept,
        points,
    })
}

/// Simple linear regression (least squares) on mean-centred x. `None` when
/// the x values do not span a range.
fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let (min_x, max_x) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
            (lo.min(x), hi.max(x))
        });
    if max_x - min_x <= 0.0 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Some((slope, intercept))
}
