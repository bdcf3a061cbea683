//! Absolute start-time resolution.
//!
//! A segment only knows monotonic time. [`TimeReconciler`] tries an ordered
//! list of [`TimeResolver`] tiers and the first that produces a start time
//! wins. Only fix-derived results are allowed to update a route's persisted
//! start, and only when they are more confident than what is stored.

mod fix;
mod tiers;
mod wall;

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

pub use fix::{Fix, FixLocator, FixSource};
pub use tiers::{CachedRouteStart, DirectoryName, RouteScan, SegmentFix, WallClock};
pub use wall::WallClockProbe;

use crate::path::SegmentPath;

pub const DEFAULT_SEGMENT_SECONDS: i64 = 60;

/// Confidence stored with a fix-derived route start.
pub const FIX_CONFIDENCE: i64 = 2;

/// Tier that produced a [`TimeResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSource {
    SegmentFix,
    CachedRouteStart,
    RouteScan,
    WallClock,
    DirectoryName,
}

impl TimeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeSource::SegmentFix => "segment_fix",
            TimeSource::CachedRouteStart => "cached_route_start",
            TimeSource::RouteScan => "route_scan",
            TimeSource::WallClock => "wall_clock",
            TimeSource::DirectoryName => "directory_name",
        }
    }

    pub fn is_fix_derived(self) -> bool {
        matches!(self, TimeSource::SegmentFix | TimeSource::RouteScan)
    }

    pub fn confidence(self) -> i64 {
        match self {
            TimeSource::SegmentFix | TimeSource::RouteScan => FIX_CONFIDENCE,
            TimeSource::WallClock => 1,
            TimeSource::CachedRouteStart | TimeSource::DirectoryName => 0,
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeResolution {
    pub source: TimeSource,
    pub segment_start: DateTime<Utc>,
    pub route_start: DateTime<Utc>,
}

/// What a segment import knows about time before resolution.
#[derive(Debug, Clone)]
pub struct SegmentClock<'a> {
    pub path: &'a SegmentPath,
    pub first_log_time: Option<u64>,
    /// First valid fix inside the segment itself.
    pub fix: Option<Fix>,
    /// Wall-clock minus monotonic time, nanoseconds.
    pub wall_clock_offset: Option<i64>,
    /// Route start already persisted by an earlier import.
    pub cached_route_start: Option<DateTime<Utc>>,
    pub segment_duration: TimeDelta,
}

impl SegmentClock<'_> {
    /// Distance from the route start to this segment's start.
    pub fn route_offset(&self) -> Option<TimeDelta> {
        index_offset(self.segment_duration, self.path.segment_index)
    }
}

pub(crate) fn index_offset(duration: TimeDelta, index: u32) -> Option<TimeDelta> {
    duration.checked_mul(i32::try_from(index).ok()?)
}

/// Start of the segment whose first event was logged at `first_log_time`,
/// given a fix observed later in the same segment.
pub(crate) fn start_from_fix(fix: Fix, first_log_time: u64) -> Option<DateTime<Utc>> {
    let elapsed = i64::try_from(fix.log_time.saturating_sub(first_log_time)).ok()?;
    fix.timestamp.checked_sub_signed(TimeDelta::nanoseconds(elapsed))
}

/// One tier of the resolution chain.
pub trait TimeResolver: Send + Sync {
    fn source(&self) -> TimeSource;

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution>;
}

/// Ordered chain of resolvers.
pub struct TimeReconciler {
    tiers: Vec<Box<dyn TimeResolver>>,
}

impl TimeReconciler {
    pub fn new(tiers: Vec<Box<dyn TimeResolver>>) -> Self {
        Self { tiers }
    }

    /// Segment fix, cached route start, sibling scan, wall clock, directory name.
    pub fn standard(locator: FixLocator, event_log_names: Vec<String>) -> Self {
        Self::new(vec![
            Box::new(SegmentFix),
            Box::new(CachedRouteStart),
            Box::new(RouteScan::new(locator, event_log_names)),
            Box::new(WallClock),
            Box::new(DirectoryName),
        ])
    }

    pub fn resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let resolution = self.tiers.iter().find_map(|tier| tier.try_resolve(segment));
        if resolution.is_none() {
            log::warn!("no time source resolved an absolute start for {}", segment.path);
        }
        resolution
    }
}
