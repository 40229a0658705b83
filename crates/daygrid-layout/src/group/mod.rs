//! Overlap grouping for one day's timed events.
//!
//! # Overview
//!
//! ```text
//! timed events of one day
//!        ↓  graph::OverlapGraph::build()
//! OverlapGraph (nodes sorted by start, edges = overlapping pairs)
//!        ↓  group_events(policy)
//! Vec<OverlapGroup> (a partition, ordered by earliest member)
//!        ↓  OverlapStats::from_graph()
//! OverlapStats (pairs, groups, largest group, peak concurrency)
//! ```
//!
//! ## Policies
//!
//! [`GroupingPolicy::Transitive`] emits the connected components of the
//! overlap graph, so no two groups contain overlapping events.
//!
//! [`GroupingPolicy::AnchorSingleHop`] walks events in start order. The
//! earliest unassigned event becomes an anchor and pulls in every unassigned
//! event that overlaps *it*. An event that overlaps only a non-anchor member
//! starts a later group instead, so overlapping events can end up in
//! different groups. Nothing is ever assigned twice.

use std::fmt;

use chrono::NaiveDateTime;
use daygrid_core::EventCore;
use daygrid_core::config::GroupingPolicy;
use serde::Serialize;
use tracing::{debug, instrument};

pub mod graph;

pub use graph::{OverlapGraph, chronological};

/// Identifier of an overlap group within one day layout (`g0`, `g1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        id.to_string()
    }
}

/// One cluster of events, members in `(start, end, id)` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGroup<'a> {
    pub id: GroupId,
    pub members: Vec<&'a EventCore>,
}

impl OverlapGroup<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    /// Earliest start across members.
    #[must_use]
    pub fn envelope_start(&self) -> Option<NaiveDateTime> {
        self.members.iter().map(|e| e.start).min()
    }

    /// Latest end across members.
    #[must_use]
    pub fn envelope_end(&self) -> Option<NaiveDateTime> {
        self.members.iter().map(|e| e.end).max()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|e| e.id.as_str())
    }
}

/// Partition a graph's events into overlap groups under `policy`.
#[must_use]
#[instrument(skip(graph), fields(events = graph.node_count()))]
pub fn group_events<'a>(graph: &OverlapGraph<'a>, policy: GroupingPolicy) -> Vec<OverlapGroup<'a>> {
    let node_lists = match policy {
        GroupingPolicy::Transitive => graph.components(),
        GroupingPolicy::AnchorSingleHop => anchor_groups(graph),
    };

    let groups: Vec<OverlapGroup<'a>> = node_lists
        .into_iter()
        .enumerate()
        .map(|(n, nodes)| OverlapGroup {
            id: GroupId(n),
            members: nodes.into_iter().map(|i| graph.events()[i]).collect(),
        })
        .collect();

    debug!(groups = groups.len(), "grouped events");
    groups
}

fn anchor_groups(graph: &OverlapGraph<'_>) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut assigned = vec![false; n];
    let mut groups = Vec::new();

    for anchor in 0..n {
        if assigned[anchor] {
            continue;
        }
        assigned[anchor] = true;
        let mut members = vec![anchor];
        for other in graph.overlapping(anchor) {
            if !assigned[other] {
                assigned[other] = true;
                members.push(other);
            }
        }
        members.sort_unstable();
        groups.push(members);
    }

    groups
}

// ---------------------------------------------------------------------------
// OverlapStats
// ---------------------------------------------------------------------------

/// Density summary of one day's timed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapStats {
    pub event_count: usize,
    /// Number of overlapping event pairs.
    pub overlap_pairs: usize,
    pub group_count: usize,
    pub largest_group: usize,
    /// Groups with more than one member.
    pub multi_event_groups: usize,
    /// Peak number of events running at one instant.
    pub max_concurrency: usize,
}

impl OverlapStats {
    #[must_use]
    pub fn from_graph(graph: &OverlapGraph<'_>, policy: GroupingPolicy) -> Self {
        let groups = group_events(graph, policy);
        Self {
            event_count: graph.node_count(),
            overlap_pairs: graph.edge_count(),
            group_count: groups.len(),
            largest_group: groups.iter().map(OverlapGroup::len).max().unwrap_or(0),
            multi_event_groups: groups.iter().filter(|g| !g.is_single()).count(),
            max_concurrency: graph.max_concurrency(),
        }
    }

    /// Return `true` if no two events overlap.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.overlap_pairs == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: &str, start: (u32, u32), end: (u32, u32)) -> EventCore {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");
        EventCore {
            id: id.to_string(),
            start: day.and_hms_opt(start.0, start.1, 0).expect("valid start"),
            end: day.and_hms_opt(end.0, end.1, 0).expect("valid end"),
            all_day: false,
            title: id.to_string(),
            description: None,
            color: None,
        }
    }

    fn group_ids(groups: &[OverlapGroup<'_>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.ids().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn reference_scenario_groups() {
        let a = event("A", (9, 0), (10, 0));
        let b = event("B", (9, 30), (10, 30));
        let c = event("C", (11, 0), (11, 15));
        let graph = OverlapGraph::build([&c, &b, &a]);

        for policy in [GroupingPolicy::Transitive, GroupingPolicy::AnchorSingleHop] {
            let groups = group_events(&graph, policy);
            assert_eq!(group_ids(&groups), vec![vec!["A", "B"], vec!["C"]]);
            assert_eq!(groups[0].id, GroupId(0));
            assert_eq!(groups[1].id.to_string(), "g1");
        }
    }

    #[test]
    fn policies_differ_on_long_chains() {
        // a-b overlap, b-c overlap, a-c do not.
        let a = event("a", (9, 0), (10, 0));
        let b = event("b", (9, 45), (11, 0));
        let c = event("c", (10, 30), (12, 0));
        let graph = OverlapGraph::build([&a, &b, &c]);

        let transitive = group_events(&graph, GroupingPolicy::Transitive);
        assert_eq!(group_ids(&transitive), vec![vec!["a", "b", "c"]]);

        let anchored = group_events(&graph, GroupingPolicy::AnchorSingleHop);
        assert_eq!(group_ids(&anchored), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn anchor_policy_never_duplicates_members() {
        let a = event("a", (9, 0), (10, 0));
        let b = event("b", (9, 30), (11, 0));
        let c = event("c", (10, 30), (11, 30));
        let d = event("d", (10, 45), (12, 0));
        let graph = OverlapGraph::build([&a, &b, &c, &d]);

        let groups = group_events(&graph, GroupingPolicy::AnchorSingleHop);
        let mut all: Vec<String> = groups
            .iter()
            .flat_map(|g| g.ids().map(str::to_string))
            .collect();
        all.sort();
        assert_eq!(all, ["a", "b", "c", "d"]);
        assert_eq!(group_ids(&groups), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn envelope_spans_members() {
        let a = event("a", (9, 0), (10, 0));
        let b = event("b", (9, 30), (10, 30));
        let graph = OverlapGraph::build([&a, &b]);
        let groups = group_events(&graph, GroupingPolicy::Transitive);
        assert_eq!(groups[0].envelope_start(), Some(a.start));
        assert_eq!(groups[0].envelope_end(), Some(b.end));
        assert!(!groups[0].is_single());
    }

    #[test]
    fn stats_summarize_density() {
        let a = event("a", (9, 0), (10, 0));
        let b = event("b", (9, 15), (9, 45));
        let c = event("c", (9, 30), (10, 30));
        let d = event("d", (13, 0), (14, 0));
        let graph = OverlapGraph::build([&a, &b, &c, &d]);

        let stats = OverlapStats::from_graph(&graph, GroupingPolicy::Transitive);
        assert_eq!(stats.event_count, 4);
        assert_eq!(stats.overlap_pairs, 3);
        assert_eq!(stats.group_count, 2);
        assert_eq!(stats.largest_group, 3);
        assert_eq!(stats.multi_event_groups, 1);
        assert_eq!(stats.max_concurrency, 3);
        assert!(!stats.is_flat());
    }

    #[test]
    fn group_id_serializes_as_label() {
        let json = serde_json::to_string(&GroupId(3)).expect("serialize");
        assert_eq!(json, "\"g3\"");
    }
}
