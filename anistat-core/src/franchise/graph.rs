//! Relation graph: undirected continuity edges between entries of one store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use tracing::{debug, info};

use crate::store::EntryTable;
use crate::types::{EntryId, RelationKind};

/// Undirected graph over every entry of an [`EntryTable`], with an edge for
/// each continuity-preserving relation, with `EntryId` ↔ `NodeIndex` mapping.
///
/// Relations are mirrored: a sequel declared only on one side still links
/// both entries. Self-loops and relations to entries outside the table are
/// dropped, and parallel declarations collapse into a single edge.
#[derive(Debug)]
pub struct RelationGraph {
    pub graph: UnGraph<EntryId, RelationKind>,
    pub id_to_index: HashMap<EntryId, NodeIndex>,
}

impl RelationGraph {
    pub fn build(entries: &EntryTable, continuity: &BTreeSet<RelationKind>) -> Self {
        let mut graph = UnGraph::<EntryId, RelationKind>::with_capacity(entries.len(), 0);
        let mut id_to_index: HashMap<EntryId, NodeIndex> = HashMap::with_capacity(entries.len());

        for entry in entries {
            let idx = graph.add_node(entry.id);
            id_to_index.insert(entry.id, idx);
        }

        let mut dropped = 0usize;
        for entry in entries {
            let src = id_to_index[&entry.id];
            for relation in &entry.relations {
                if !continuity.contains(&relation.kind) || relation.id == entry.id {
                    continue;
                }
                let Some(&tgt) = id_to_index.get(&relation.id) else {
                    dropped += 1;
                    debug!(
                        from = %entry.id,
                        to = %relation.id,
                        kind = %relation.kind,
                        "Relation target not in store, skipping"
                    );
                    continue;
                };
                if graph.find_edge(src, tgt).is_none() {
                    graph.add_edge(src, tgt, relation.kind);
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dropped,
            "Built relation graph"
        );

        Self { graph, id_to_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a continuity edge joins `a` and `b`, in either direction.
    pub fn are_linked(&self, a: EntryId, b: EntryId) -> bool {
        match (self.id_to_index.get(&a), self.id_to_index.get(&b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Direct continuity neighbours of `id`, sorted.
    pub fn neighbors(&self, id: EntryId) -> Vec<EntryId> {
        let Some(&idx) = self.id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<EntryId> = self.graph.neighbors(idx).map(|n| self.graph[n]).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Connected components, via union-find over node indices.
    ///
    /// Components are ordered by the lowest entry id they contain, so output
    /// order is stable across runs on identical input.
    pub fn connected_components(&self) -> Vec<BTreeSet<EntryId>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.raw_edges() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut by_root: HashMap<usize, BTreeSet<EntryId>> = HashMap::new();
        for idx in self.graph.node_indices() {
            by_root
                .entry(sets.find(idx.index()))
                .or_default()
                .insert(self.graph[idx]);
        }

        // Keyed by smallest member; components are disjoint so keys are unique.
        let ordered: BTreeMap<EntryId, BTreeSet<EntryId>> = by_root
            .into_values()
            .filter_map(|set| set.first().copied().map(|min| (min, set)))
            .collect();
        ordered.into_values().collect()
    }
}
