//! Vertical time grid: 24 rows of fixed height spanning one day.

use chrono::{NaiveDateTime, TimeDelta};
use daygrid_core::config::GridConfig;
use daygrid_core::model::{MINUTES_PER_DAY, minutes_between};
use serde::Serialize;

pub const HOURS_IN_DAY: u32 = 24;

/// Pixel position of a block inside a day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockGeometry {
    pub top: f64,
    pub height: f64,
}

/// Maps wall-clock intervals onto pixel offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub row_height_px: f64,
    /// Blocks shorter than this are drawn this tall.
    pub min_duration_minutes: u32,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::from(&GridConfig::default())
    }
}

impl From<&GridConfig> for TimeGrid {
    fn from(config: &GridConfig) -> Self {
        Self {
            row_height_px: config.row_height_px,
            min_duration_minutes: config.min_duration_minutes,
        }
    }
}

impl TimeGrid {
    #[must_use]
    pub fn total_height(&self) -> f64 {
        f64::from(HOURS_IN_DAY) * self.row_height_px
    }

    /// Offset of `start` below `day_start`; starts before the day clamp to 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn top(&self, day_start: NaiveDateTime, start: NaiveDateTime) -> f64 {
        let minutes = minutes_between(day_start, start).max(0);
        minutes as f64 / MINUTES_PER_DAY as f64 * self.total_height()
    }

    /// Block height with the minimum-duration floor applied.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn height(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        let minutes = minutes_between(start, end).max(i64::from(self.min_duration_minutes));
        minutes as f64 / 60.0 * self.row_height_px
    }

    /// Geometry of `start..end` clipped to the day that begins at `day_start`.
    ///
    /// The part of the interval past midnight is dropped, and the floored
    /// height never runs below the last row.
    #[must_use]
    pub fn map(
        &self,
        day_start: NaiveDateTime,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BlockGeometry {
        let day_end = day_start + TimeDelta::days(1);
        let top = self.top(day_start, start).min(self.total_height());
        let height = self.height(start.max(day_start), end.min(day_end));
        BlockGeometry {
            top,
            height: height.min(self.total_height() - top),
        }
    }

    /// Minute of day under pixel offset `y`, clamped to `[0, 1440)`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn minute_at(&self, y: f64) -> u32 {
        let last = (MINUTES_PER_DAY - 1) as f64;
        if !y.is_finite() || y <= 0.0 {
            return 0;
        }
        // Nudge up so exact row offsets do not round down a minute.
        let minute = (y / self.total_height() * MINUTES_PER_DAY as f64 + 1e-6).floor();
        minute.min(last) as u32
    }
}
