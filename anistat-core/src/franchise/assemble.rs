use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::DataIntegrityError;
use crate::store::EntryTable;
use crate::types::{Entry, EntryId};

/// Chronological ordering key: air start ascending with unknown dates last,
/// then id. The leading flag sorts `None` after every `Some`.
pub fn chronological_key(entry: &Entry) -> (bool, Option<NaiveDate>, EntryId) {
    (entry.air_start.is_none(), entry.air_start, entry.id)
}

/// A read-only view over the entries of one connected component.
///
/// Members are borrowed from the backing [`EntryTable`] and ordered by
/// [`chronological_key`]. The representative is the member with the
/// earliest known air start (lowest id on ties), or the lowest id when no
/// member has an air start.
#[derive(Debug, Clone, Serialize)]
pub struct Franchise<'a> {
    members: Vec<&'a Entry>,
    representative: &'a Entry,
}

impl<'a> Franchise<'a> {
    fn from_members(mut members: Vec<&'a Entry>) -> Option<Self> {
        members.sort_by_key(|e| chronological_key(e));
        let representative = select_representative(&members)?;
        Some(Self {
            members,
            representative,
        })
    }

    pub fn members(&self) -> &[&'a Entry] {
        &self.members
    }

    pub fn representative(&self) -> &'a Entry {
        self.representative
    }

    pub fn title(&self) -> &'a str {
        &self.representative.title
    }

    pub fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.members.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First known air start and last known air end across members.
    pub fn air_span(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let start = self.members.iter().filter_map(|e| e.air_start).min();
        let end = self.members.iter().filter_map(|e| e.air_end).max();
        (start, end)
    }
}

fn select_representative<'a>(members: &[&'a Entry]) -> Option<&'a Entry> {
    let dated = members
        .iter()
        .filter_map(|e| e.air_start.map(|d| (d, e.id, *e)))
        .min_by_key(|&(d, id, _)| (d, id));
    match dated {
        Some((_, _, e)) => Some(e),
        None => members.iter().min_by_key(|e| e.id).copied(),
    }
}

/// Turn connected components into franchises, in component order.
///
/// Empty components are skipped. A component naming an id the table does
/// not hold means the components were computed against another store.
pub fn assemble<'a>(
    entries: &'a EntryTable,
    components: &[BTreeSet<EntryId>],
) -> Result<Vec<Franchise<'a>>, DataIntegrityError> {
    let mut franchises = Vec::with_capacity(components.len());
    for component in components {
        let members = component
            .iter()
            .map(|&id| {
                entries
                    .get(id)
                    .ok_or(DataIntegrityError::MissingMember { id })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(franchise) = Franchise::from_members(members) {
            franchises.push(franchise);
        }
    }

    info!(
        franchises = franchises.len(),
        singletons = franchises.iter().filter(|f| f.len() == 1).count(),
        "Assembled franchises"
    );
    Ok(franchises)
}
