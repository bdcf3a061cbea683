use std::{
    collections::HashSet,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use chrono::DateTime;
use rayon::prelude::*;

use super::{
    FixLocator, SegmentClock, TimeResolution, TimeResolver, TimeSource, index_offset,
    start_from_fix,
};
use crate::path::SegmentPath;

/// Tier 1: a fix inside the segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentFix;

impl TimeResolver for SegmentFix {
    fn source(&self) -> TimeSource {
        TimeSource::SegmentFix
    }

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let segment_start = start_from_fix(segment.fix?, segment.first_log_time?)?;
        let route_start = segment_start.checked_sub_signed(segment.route_offset()?)?;
        Some(TimeResolution {
            source: self.source(),
            segment_start,
            route_start,
        })
    }
}

/// Tier 2: a route start persisted by an earlier import.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedRouteStart;

impl TimeResolver for CachedRouteStart {
    fn source(&self) -> TimeSource {
        TimeSource::CachedRouteStart
    }

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let route_start = segment.cached_route_start?;
        Some(TimeResolution {
            source: self.source(),
            segment_start: route_start.checked_add_signed(segment.route_offset()?)?,
            route_start,
        })
    }
}

/// Tier 3: the first fix found in any sibling segment on disk.
///
/// Routes whose scan came up empty are remembered, so each route is scanned
/// at most once per resolver.
pub struct RouteScan {
    locator: FixLocator,
    event_log_names: Vec<String>,
    exhausted: Mutex<HashSet<String>>,
}

impl RouteScan {
    pub fn new(locator: FixLocator, event_log_names: Vec<String>) -> Self {
        Self {
            locator,
            event_log_names,
            exhausted: Mutex::new(HashSet::new()),
        }
    }

    fn is_exhausted(&self, route_id: &str) -> bool {
        self.exhausted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(route_id)
    }

    fn mark_exhausted(&self, route_id: String) {
        self.exhausted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route_id);
    }

    fn candidates(&self, path: &SegmentPath) -> Vec<(u32, PathBuf)> {
        match path.siblings() {
            Ok(siblings) => siblings
                .into_iter()
                .filter_map(|s| {
                    let log = s.find_file(&self.event_log_names)?;
                    Some((s.segment_index, log))
                })
                .collect(),
            Err(e) => {
                log::warn!("cannot list siblings of {path}: {e}");
                Vec::new()
            }
        }
    }
}

impl TimeResolver for RouteScan {
    fn source(&self) -> TimeSource {
        TimeSource::RouteScan
    }

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let route_id = segment.path.route_id();
        if self.is_exhausted(&route_id) {
            return None;
        }

        let candidates = self.candidates(segment.path);
        log::info!(
            "scanning {} sibling segments of {route_id} for a fix",
            candidates.len()
        );
        let found = candidates.par_iter().find_map_first(|(index, log_path)| {
            match self.locator.find_in_file(log_path) {
                Ok(found) => found.map(|(fix, first)| (*index, fix, first)),
                Err(e) => {
                    log::warn!("skipping sibling {}: {e}", log_path.display());
                    None
                }
            }
        });

        let Some((index, fix, first)) = found else {
            self.mark_exhausted(route_id);
            return None;
        };
        let sibling_start = start_from_fix(fix, first)?;
        let route_start =
            sibling_start.checked_sub_signed(index_offset(segment.segment_duration, index)?)?;
        Some(TimeResolution {
            source: self.source(),
            segment_start: route_start.checked_add_signed(segment.route_offset()?)?,
            route_start,
        })
    }
}

/// Tier 4: the recorder's own wall-clock offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl TimeResolver for WallClock {
    fn source(&self) -> TimeSource {
        TimeSource::WallClock
    }

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let offset = segment.wall_clock_offset.filter(|o| *o > 0)?;
        let first = i64::try_from(segment.first_log_time?).ok()?;
        let segment_start = DateTime::from_timestamp_nanos(first.checked_add(offset)?);
        Some(TimeResolution {
            source: self.source(),
            segment_start,
            route_start: segment_start.checked_sub_signed(segment.route_offset()?)?,
        })
    }
}

/// Tier 5: the route token read as hexadecimal Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryName;

impl TimeResolver for DirectoryName {
    fn source(&self) -> TimeSource {
        TimeSource::DirectoryName
    }

    fn try_resolve(&self, segment: &SegmentClock<'_>) -> Option<TimeResolution> {
        let route_start = DateTime::from_timestamp(segment.path.route_token_seconds()?, 0)?;
        Some(TimeResolution {
            source: self.source(),
            segment_start: route_start.checked_add_signed(segment.route_offset()?)?,
            route_start,
        })
    }
}
