//! Franchise clustering: relation graph construction and component assembly.

pub mod assemble;
pub mod graph;

pub use assemble::{Franchise, assemble, chronological_key};
pub use graph::RelationGraph;

#[cfg(test)]
mod proptests {
    use std::collections::{BTreeSet, HashSet};

    use proptest::prelude::*;

    use super::*;
    use crate::store::EntryTable;
    use crate::types::{Entry, EntryId, Relation, RelationKind};

    fn arb_kind() -> impl Strategy<Value = RelationKind> {
        proptest::sample::select(RelationKind::ALL.to_vec())
    }

    /// Up to 40 entries with random relations among ids `0..48`, so some
    /// targets fall outside the store.
    fn arb_table() -> impl Strategy<Value = EntryTable> {
        proptest::collection::btree_map(
            0u64..40,
            proptest::collection::vec((0u64..48, arb_kind()), 0..4),
            0..40,
        )
        .prop_map(|rows| {
            let entries = rows
                .into_iter()
                .map(|(id, rels)| {
                    let mut e = Entry::new(id, format!("e{id}"));
                    e.relations = rels
                        .into_iter()
                        .map(|(to, kind)| Relation {
                            id: EntryId(to),
                            kind,
                        })
                        .collect();
                    e
                })
                .collect();
            EntryTable::from_entries(entries)
        })
    }

    fn continuity() -> BTreeSet<RelationKind> {
        RelationKind::CONTINUITY.into_iter().collect()
    }

    fn franchise_of(franchises: &[Franchise<'_>], id: EntryId) -> Option<usize> {
        franchises.iter().position(|f| f.ids().any(|m| m == id))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn franchises_partition_the_store(table in arb_table()) {
            let graph = RelationGraph::build(&table, &continuity());
            let franchises = assemble(&table, &graph.connected_components()).unwrap();

            let mut seen = HashSet::new();
            for franchise in &franchises {
                for id in franchise.ids() {
                    prop_assert!(seen.insert(id), "entry {} in two franchises", id);
                }
            }
            let all: HashSet<EntryId> = table.ids().collect();
            prop_assert_eq!(seen, all);
        }

        #[test]
        fn continuity_edges_share_a_franchise(table in arb_table()) {
            let continuity = continuity();
            let graph = RelationGraph::build(&table, &continuity);
            let franchises = assemble(&table, &graph.connected_components()).unwrap();

            for entry in &table {
                for rel in &entry.relations {
                    if continuity.contains(&rel.kind) && table.contains(rel.id) {
                        prop_assert_eq!(
                            franchise_of(&franchises, entry.id),
                            franchise_of(&franchises, rel.id)
                        );
                    }
                }
            }
        }

        #[test]
        fn components_ordered_by_lowest_member(table in arb_table()) {
            let graph = RelationGraph::build(&table, &continuity());
            let mins: Vec<EntryId> = graph
                .connected_components()
                .iter()
                .filter_map(|c| c.first().copied())
                .collect();
            let mut sorted = mins.clone();
            sorted.sort_unstable();
            prop_assert_eq!(mins, sorted);
        }

        #[test]
        fn representative_is_a_member(table in arb_table()) {
            let graph = RelationGraph::build(&table, &continuity());
            for franchise in assemble(&table, &graph.connected_components()).unwrap() {
                let rep = franchise.representative().id;
                prop_assert!(franchise.ids().any(|id| id == rep));
            }
        }
    }
}
