//! Scroll affordances for day-view lanes.
//!
//! Whether a lane can scroll further left or right depends on the rendered
//! widths, which only the view knows. [`LaneScrollState`] is therefore owned
//! by the view and updated from its scroll and resize callbacks. It never
//! feeds back into [`crate::compose::DayLayout`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::compose::{DayLayout, RenderMode};
use crate::group::GroupId;

/// Sub-pixel slack when comparing the scrolled edge against the content width.
pub const EDGE_TOLERANCE_PX: f64 = 1.0;

/// Horizontal scroll position of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub client_width: f64,
    pub scroll_width: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn max_scroll_left(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }
}

/// Which scroll arrows to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollAffordance {
    pub show_left: bool,
    pub show_right: bool,
}

impl ScrollAffordance {
    #[must_use]
    pub fn from_metrics(metrics: ScrollMetrics) -> Self {
        Self {
            show_left: metrics.scroll_left > 0.0,
            show_right: metrics.scroll_left + metrics.client_width
                < metrics.scroll_width - EDGE_TOLERANCE_PX,
        }
    }

    #[must_use]
    pub const fn any(self) -> bool {
        self.show_left || self.show_right
    }
}

/// View-owned map from lane to its current metrics and affordance.
#[derive(Debug, Clone, Default)]
pub struct LaneScrollState {
    lanes: BTreeMap<GroupId, ScrollMetrics>,
}

impl LaneScrollState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll event. The offset is clamped to the scrollable range.
    pub fn on_scroll(&mut self, group: GroupId, scroll_left: f64) -> ScrollAffordance {
        let metrics = self.lanes.entry(group).or_default();
        metrics.scroll_left = scroll_left.clamp(0.0, metrics.max_scroll_left());
        ScrollAffordance::from_metrics(*metrics)
    }

    /// Record new widths after a resize, keeping the scroll offset in range.
    pub fn on_resize(
        &mut self,
        group: GroupId,
        client_width: f64,
        scroll_width: f64,
    ) -> ScrollAffordance {
        let metrics = self.lanes.entry(group).or_default();
        metrics.client_width = client_width.max(0.0);
        metrics.scroll_width = scroll_width.max(0.0);
        metrics.scroll_left = metrics.scroll_left.clamp(0.0, metrics.max_scroll_left());
        ScrollAffordance::from_metrics(*metrics)
    }

    /// Align tracked lanes with a fresh layout.
    ///
    /// Lanes that vanished are forgotten. Every scroll lane gets its content
    /// width from the layout and `client_width` as its visible width; lanes
    /// seen before keep their scroll offset.
    pub fn sync_with(&mut self, layout: &DayLayout, client_width: f64) {
        let lanes: BTreeMap<GroupId, f64> = layout
            .groups
            .iter()
            .filter(|g| g.render_mode == RenderMode::ScrollLane)
            .filter_map(|g| g.content_width.map(|w| (g.group_id, w)))
            .collect();

        self.lanes.retain(|id, _| lanes.contains_key(id));
        for (id, content_width) in lanes {
            self.on_resize(id, client_width, content_width);
        }
    }

    #[must_use]
    pub fn get(&self, group: GroupId) -> ScrollAffordance {
        self.lanes
            .get(&group)
            .map(|m| ScrollAffordance::from_metrics(*m))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn metrics(&self, group: GroupId) -> Option<ScrollMetrics> {
        self.lanes.get(&group).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}
