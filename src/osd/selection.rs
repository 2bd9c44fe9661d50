//! Resource Selection
//!
//! Resolves which devices and directories a node's OSD will use. Devices are
//! chosen either by an explicit list or by a filter, never both.

use crate::error::{Error, Result};
use regex::Regex;

/// Filter value that selects every available device
pub const ALL_DEVICES: &str = "all";

// =============================================================================
// Device Filter
// =============================================================================

/// Filter over discovered device names
#[derive(Debug, Clone)]
pub enum DeviceFilter {
    /// Every available device
    All,
    /// Devices whose name matches the pattern
    Pattern(Regex),
}

impl DeviceFilter {
    /// Parse a filter value, compiling it unless it is the `all` sentinel
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == ALL_DEVICES {
            return Ok(DeviceFilter::All);
        }

        Regex::new(raw)
            .map(DeviceFilter::Pattern)
            .map_err(|e| Error::InvalidDeviceFilter {
                filter: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// Check if a device name passes the filter
    pub fn matches(&self, device_name: &str) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Pattern(re) => re.is_match(device_name),
        }
    }

    /// The filter as given on the command line
    pub fn as_str(&self) -> &str {
        match self {
            DeviceFilter::All => ALL_DEVICES,
            DeviceFilter::Pattern(re) => re.as_str(),
        }
    }
}

impl PartialEq for DeviceFilter {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for DeviceFilter {}

impl std::fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Device Selection
// =============================================================================

/// How devices are chosen for the OSD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelection {
    /// No devices; directories only
    None,
    /// Explicitly named devices
    Explicit(Vec<String>),
    /// Devices discovered on the node and passed through a filter
    Filter(DeviceFilter),
}

impl DeviceSelection {
    /// Check if a discovered device is selected
    pub fn matches(&self, device_name: &str) -> bool {
        let name = strip_dev_prefix(device_name);
        match self {
            DeviceSelection::None => false,
            DeviceSelection::Explicit(devices) => {
                devices.iter().any(|d| strip_dev_prefix(d) == name)
            }
            DeviceSelection::Filter(filter) => filter.matches(name),
        }
    }

    /// Whether a device filter (rather than an explicit list) is in use
    pub fn uses_filter(&self) -> bool {
        matches!(self, DeviceSelection::Filter(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DeviceSelection::None)
    }
}

// =============================================================================
// Resource Selection
// =============================================================================

/// The node's resolved storage resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSelection {
    devices: DeviceSelection,
    directories: Vec<String>,
}

impl ResourceSelection {
    /// Resolve the resource selection from raw comma-separated inputs.
    ///
    /// Fails with [`Error::ConfigurationConflict`] when both an explicit
    /// device list and a device filter are given.
    pub fn resolve(explicit_devices: &str, device_filter: &str, directories: &str) -> Result<Self> {
        let explicit_devices = explicit_devices.trim();
        let device_filter = device_filter.trim();

        let devices = match (explicit_devices.is_empty(), device_filter.is_empty()) {
            (false, false) => return Err(Error::ConfigurationConflict),
            (true, false) => DeviceSelection::Filter(DeviceFilter::parse(device_filter)?),
            (false, true) => {
                let list = split_list(explicit_devices);
                if list.is_empty() {
                    DeviceSelection::None
                } else {
                    DeviceSelection::Explicit(list)
                }
            }
            (true, true) => DeviceSelection::None,
        };

        Ok(Self {
            devices,
            directories: split_list(directories),
        })
    }

    pub fn devices(&self) -> &DeviceSelection {
        &self.devices
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    /// True when neither devices nor directories were requested
    pub fn is_empty(&self) -> bool {
        self.devices.is_none() && self.directories.is_empty()
    }
}

/// Split a comma separated list, trimming entries and dropping empty ones
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn strip_dev_prefix(name: &str) -> &str {
    name.strip_prefix("/dev/").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_devices_and_filter_conflict() {
        let result = ResourceSelection::resolve("sdb,sdc", "sd[b-c]", "");
        assert_matches!(result, Err(Error::ConfigurationConflict));

        let result = ResourceSelection::resolve("sdb", "all", "/var/lib/osd");
        assert_matches!(result, Err(Error::ConfigurationConflict));
    }

    #[test]
    fn test_conflict_checks_raw_inputs() {
        let result = ResourceSelection::resolve(",,", "all", "");
        assert_matches!(result, Err(Error::ConfigurationConflict));

        let sel = ResourceSelection::resolve(",,", "  ", "").unwrap();
        assert!(sel.devices().is_none());
    }

    #[test]
    fn test_explicit_devices() {
        let sel = ResourceSelection::resolve("sdb, sdc,,", "", "").unwrap();
        assert_eq!(
            sel.devices(),
            &DeviceSelection::Explicit(vec!["sdb".into(), "sdc".into()])
        );
        assert!(!sel.devices().uses_filter());
        assert!(sel.directories().is_empty());
    }

    #[test]
    fn test_filter_all_sentinel() {
        let sel = ResourceSelection::resolve("", "all", "").unwrap();
        assert_eq!(sel.devices(), &DeviceSelection::Filter(DeviceFilter::All));
        assert!(sel.devices().matches("sdz"));
        assert!(sel.devices().matches("nvme0n1"));
    }

    #[test]
    fn test_filter_pattern() {
        let sel = ResourceSelection::resolve("", "^sd[b-d]$", "").unwrap();
        assert!(sel.devices().uses_filter());
        assert!(sel.devices().matches("sdb"));
        assert!(sel.devices().matches("/dev/sdd"));
        assert!(!sel.devices().matches("sda"));
        assert!(!sel.devices().matches("sdb1"));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = ResourceSelection::resolve("", "sd[", "");
        assert_matches!(result, Err(Error::InvalidDeviceFilter { filter, .. }) if filter == "sd[");
    }

    #[test]
    fn test_directories_combine_with_either_strategy() {
        let sel = ResourceSelection::resolve("sdb", "", "/a,/b").unwrap();
        assert_eq!(sel.directories(), &["/a".to_string(), "/b".to_string()]);

        let sel = ResourceSelection::resolve("", "all", "/a").unwrap();
        assert_eq!(sel.directories(), &["/a".to_string()]);

        let sel = ResourceSelection::resolve("", "", "/a").unwrap();
        assert!(sel.devices().is_none());
        assert!(!sel.is_empty());
    }

    #[test]
    fn test_empty_selection() {
        let sel = ResourceSelection::resolve("", "", "").unwrap();
        assert!(sel.is_empty());
        assert!(!sel.devices().matches("sdb"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let a = ResourceSelection::resolve("", "^nvme", "/var/lib/rook").unwrap();
        let b = ResourceSelection::resolve("", "^nvme", "/var/lib/rook").unwrap();
        assert_eq!(a, b);

        let a = ResourceSelection::resolve("sdb,sdc", "", "").unwrap();
        let b = ResourceSelection::resolve("sdb,sdc", "", "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_match_ignores_dev_prefix() {
        let sel = ResourceSelection::resolve("/dev/sdb", "", "").unwrap();
        assert!(sel.devices().matches("sdb"));
        assert!(!sel.devices().matches("sdc"));
    }
}
