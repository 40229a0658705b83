//! Day view: overlapping events share one box with a scrollable member row.

use chrono::NaiveDateTime;

use super::{CompositeStrategy, EventPlacement, GroupLayout, LayoutOptions, RenderMode};
use crate::group::OverlapGroup;

/// Single events keep their own geometry. A multi-event group becomes one
/// container spanning the group's envelope, with members placed left to right
/// at a fixed width inside a horizontally scrollable row.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayLaneStrategy;

impl CompositeStrategy for DayLaneStrategy {
    fn name(&self) -> &'static str {
        "day-lane"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compose_group(
        &self,
        group: &OverlapGroup<'_>,
        day_start: NaiveDateTime,
        options: &LayoutOptions,
    ) -> GroupLayout {
        let (Some(first), Some(start), Some(end)) = (
            group.members.first(),
            group.envelope_start(),
            group.envelope_end(),
        ) else {
            return empty(group);
        };

        if group.is_single() {
            let geometry = options.grid.map(day_start, first.start, first.end);
            return GroupLayout::single(group.id, first, geometry);
        }

        let envelope = options.grid.map(day_start, start, end);
        let width = options.lane_member_width_px;
        let cap = options.max_lane_members.max(1);

        let placements: Vec<EventPlacement> = group
            .members
            .iter()
            .enumerate()
            .map(|(lane, event)| EventPlacement {
                event_id: event.id.clone(),
                top: envelope.top,
                height: envelope.height,
                group_id: group.id,
                render_mode: RenderMode::ScrollLane,
                lane: Some(lane),
                left: Some(lane as f64 * width),
                visible: lane < cap,
                hidden_count: None,
            })
            .collect();

        let shown = group.len().min(cap);
        GroupLayout {
            group_id: group.id,
            render_mode: RenderMode::ScrollLane,
            top: envelope.top,
            height: envelope.height,
            member_count: group.len(),
            overflow_count: group.len() - shown,
            content_width: Some(shown as f64 * width),
            placements,
        }
    }
}

fn empty(group: &OverlapGroup<'_>) -> GroupLayout {
    GroupLayout {
        group_id: group.id,
        render_mode: RenderMode::Single,
        top: 0.0,
        height: 0.0,
        member_count: 0,
        overflow_count: 0,
        content_width: None,
        placements: Vec::new(),
    }
}
