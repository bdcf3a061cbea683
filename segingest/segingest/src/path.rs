//! Segment directory naming: `<device-id>--<route-token>--<segment-index>`.

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A parsed segment location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPath {
    pub device_id: String,
    pub route_token: String,
    pub segment_index: u32,
    /// The segment directory.
    pub dir: PathBuf,
}

impl SegmentPath {
    /// Parse a segment directory, or an event-log file inside one.
    ///
    /// Returns `None` when the directory name does not follow the
    /// `<device>--<route>--<index>` pattern.
    pub fn parse(path: &Path) -> Option<Self> {
        let dir = if path.is_file() { path.parent()? } else { path };
        let name = dir.file_name()?.to_str()?;
        let (device_id, route_token, segment_index) = split_name(name)?;
        Some(Self {
            device_id: device_id.to_string(),
            route_token: route_token.to_string(),
            segment_index,
            dir: dir.to_path_buf(),
        })
    }

    /// `<device>--<route>`, shared by every segment of the route.
    pub fn route_id(&self) -> String {
        format!("{}--{}", self.device_id, self.route_token)
    }

    /// Approximate route start from the hexadecimal route token, in Unix seconds.
    pub fn route_token_seconds(&self) -> Option<i64> {
        i64::from_str_radix(&self.route_token, 16).ok()
    }

    /// First existing file among `names` inside the segment directory.
    pub fn find_file(&self, names: &[String]) -> Option<PathBuf> {
        names
            .iter()
            .map(|name| self.dir.join(name))
            .find(|p| p.is_file())
    }

    /// Other segments of the same route in the parent directory, by index.
    pub fn siblings(&self) -> std::io::Result<Vec<SegmentPath>> {
        let Some(parent) = self.dir.parent() else {
            return Ok(Vec::new());
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let mut out = Vec::new();
        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(sibling) = SegmentPath::parse(&entry.path()) else {
                continue;
            };
            if sibling.device_id == self.device_id
                && sibling.route_token == self.route_token
                && sibling.segment_index != self.segment_index
            {
                out.push(sibling);
            }
        }
        out.sort_by_key(|s| s.segment_index);
        Ok(out)
    }
}

impl fmt::Display for SegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.route_id(), self.segment_index)
    }
}

fn split_name(name: &str) -> Option<(&str, &str, u32)> {
    let (rest, index) = name.rsplit_once("--")?;
    let (device, route) = rest.split_once("--")?;
    if device.is_empty() || route.is_empty() {
        return None;
    }
    Some((device, route, index.parse().ok()?))
}
