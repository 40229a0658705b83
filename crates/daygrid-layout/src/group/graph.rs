//! Overlap graph construction for one day's timed events.
//!
//! # Overview
//!
//! Nodes are timed events sorted by `(start, end, id)`; node `i` is the
//! `i`-th event in that order. An undirected edge `i -- j` means the two
//! events overlap under the open-interval rule
//! `start_i < end_j && end_i > start_j`, so events that merely touch share
//! no edge.
//!
//! Because nodes are sorted by start, the scan for node `i` stops at the
//! first later event starting at or after `end_i`. Worst case is still
//! quadratic (every event overlaps every other), which is fine for the
//! handful of events a calendar day holds.

#![allow(clippy::module_name_repetitions)]

use std::cmp::Ordering;

use daygrid_core::EventCore;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use tracing::instrument;

// ---------------------------------------------------------------------------
// OverlapGraph
// ---------------------------------------------------------------------------

/// Undirected overlap graph over a day's timed events.
#[derive(Debug)]
pub struct OverlapGraph<'a> {
    /// Node weights are the events; node index == position in `sorted`.
    pub graph: UnGraph<&'a EventCore, ()>,
    sorted: Vec<&'a EventCore>,
}

impl<'a> OverlapGraph<'a> {
    /// Build the graph. All-day events are ignored.
    #[instrument(skip_all)]
    pub fn build<I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a EventCore>,
    {
        let mut sorted: Vec<&'a EventCore> = events.into_iter().filter(|e| !e.all_day).collect();
        sorted.sort_by(|a, b| chronological(a, b));

        let mut graph = UnGraph::<&'a EventCore, ()>::with_capacity(sorted.len(), sorted.len());
        for &event in &sorted {
            graph.add_node(event);
        }

        for (i, a) in sorted.iter().enumerate() {
            for (j, b) in sorted.iter().enumerate().skip(i + 1) {
                if b.start >= a.end {
                    break;
                }
                if a.overlaps(b) {
                    graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                }
            }
        }

        Self { graph, sorted }
    }

    /// Events in node order.
    #[must_use]
    pub fn events(&self) -> &[&'a EventCore] {
        &self.sorted
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of overlapping pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node indices overlapping node `i`, ascending.
    #[must_use]
    pub fn overlapping(&self, i: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(i))
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Connected components as ascending node-index lists, ordered by their
    /// first node.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.node_count();
        let mut sets = UnionFind::<usize>::new(n);
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let labels = sets.into_labeling();

        let mut slot_of_label: Vec<Option<usize>> = vec![None; n];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for (node, &label) in labels.iter().enumerate() {
            let slot = *slot_of_label[label].get_or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(node);
        }
        components
    }

    /// Highest number of events running at the same instant.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        // Ends sort before starts at the same instant: touching is not overlap.
        let mut points: Vec<(chrono::NaiveDateTime, i32)> = self
            .sorted
            .iter()
            .flat_map(|e| [(e.start, 1), (e.end, -1)])
            .collect();
        points.sort_unstable();

        let mut current: i64 = 0;
        let mut peak: i64 = 0;
        for (_, delta) in points {
            current += i64::from(delta);
            peak = peak.max(current);
        }
        usize::try_from(peak).unwrap_or(0)
    }
}

/// Canonical ordering: start, then end, then id.
#[must_use]
pub fn chronological(a: &EventCore, b: &EventCore) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
