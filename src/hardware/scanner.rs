//! Block Device Scanner
//!
//! Enumerates whole-disk block devices from sysfs so device filters can be
//! applied, and reports whether a device already appears to be in use.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// =============================================================================
// Scanner Configuration
// =============================================================================

/// Configuration for the block device scanner
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Include loopback devices
    pub include_loopback: bool,
    /// Include RAM disks
    pub include_ram: bool,
    /// Include device mapper devices
    pub include_dm: bool,
    /// Path to sysfs (for testing)
    pub sysfs_path: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            include_loopback: false,
            include_ram: false,
            include_dm: false,
            sysfs_path: PathBuf::from("/sys"),
        }
    }
}

// =============================================================================
// Block Device
// =============================================================================

/// A whole-disk block device discovered on the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDevice {
    /// Kernel name (e.g. sdb, nvme0n1)
    pub name: String,
    /// Capacity in bytes
    pub size_bytes: u64,
    /// Whether the device is rotational
    pub rotational: bool,
    /// Partitions found on the device
    pub partitions: Vec<String>,
    /// Devices stacked on top of this one (LVM, dm-crypt, ...)
    pub holders: Vec<String>,
}

impl BlockDevice {
    /// Why the device looks in use, if it does
    pub fn in_use_reason(&self) -> Option<String> {
        if !self.partitions.is_empty() {
            Some(format!("has partitions {}", self.partitions.join(",")))
        } else if !self.holders.is_empty() {
            Some(format!("held by {}", self.holders.join(",")))
        } else {
            None
        }
    }
}

// =============================================================================
// Hardware Scanner
// =============================================================================

/// Scans sysfs for block devices on Linux systems
pub struct HardwareScanner {
    config: ScannerConfig,
}

impl HardwareScanner {
    /// Create a new hardware scanner
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Create a scanner rooted at the given sysfs path
    pub fn with_sysfs(sysfs_path: impl Into<PathBuf>) -> Self {
        Self::new(ScannerConfig {
            sysfs_path: sysfs_path.into(),
            ..Default::default()
        })
    }

    fn block_root(&self) -> PathBuf {
        self.config.sysfs_path.join("class/block")
    }

    /// Discover all whole-disk block devices, sorted by name
    pub fn discover(&self) -> Result<Vec<BlockDevice>> {
        let block_path = self.block_root();
        if !block_path.exists() {
            return Err(Error::HardwareDiscovery(format!(
                "block device sysfs not found at {}",
                block_path.display()
            )));
        }

        let mut devices = Vec::new();

        for entry in fs::read_dir(&block_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            if !self.should_include_device(&name) {
                continue;
            }

            // Skip partitions
            if self.is_partition(&entry.path()) {
                continue;
            }

            devices.push(self.scan_device(&name, &entry.path())?);
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Discovered {} block devices", devices.len());

        Ok(devices)
    }

    /// Look up a single device by kernel name
    pub fn device(&self, name: &str) -> Result<BlockDevice> {
        let path = self.block_root().join(name);
        if !path.exists() {
            return Err(Error::DeviceNotFound {
                device: name.to_string(),
            });
        }
        self.scan_device(name, &path)
    }

    fn scan_device(&self, name: &str, sysfs_path: &Path) -> Result<BlockDevice> {
        // Size is reported in 512-byte sectors
        let size_bytes = self
            .read_sysfs_attr(sysfs_path, "size")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|sectors| sectors * 512)
            .unwrap_or(0);

        let rotational = self
            .read_sysfs_attr(sysfs_path, "queue/rotational")
            .map(|r| r.trim() == "1")
            .unwrap_or(false);

        Ok(BlockDevice {
            name: name.to_string(),
            size_bytes,
            rotational,
            partitions: self.list_partitions(name, sysfs_path)?,
            holders: list_dir_names(&sysfs_path.join("holders"))?,
        })
    }

    /// Partitions appear as child directories named after the parent
    fn list_partitions(&self, name: &str, sysfs_path: &Path) -> Result<Vec<String>> {
        let mut partitions: Vec<String> = list_dir_names(sysfs_path)?
            .into_iter()
            .filter(|child| child.starts_with(name) && child != name)
            .filter(|child| self.is_partition(&sysfs_path.join(child)))
            .collect();
        partitions.sort();
        Ok(partitions)
    }

    /// Check if a path is a partition
    fn is_partition(&self, sysfs_path: &Path) -> bool {
        // Partitions have a "partition" file
        sysfs_path.join("partition").exists()
    }

    /// Check if a device should be included
    fn should_include_device(&self, name: &str) -> bool {
        if !self.config.include_loopback && name.starts_with("loop") {
            return false;
        }

        if !self.config.include_ram && name.starts_with("ram") {
            return false;
        }

        if !self.config.include_dm && name.starts_with("dm-") {
            return false;
        }

        // md RAID and zram are never OSD candidates
        !(name.starts_with("md") || name.starts_with("zram") || name.starts_with("sr"))
    }

    /// Read a sysfs attribute
    fn read_sysfs_attr(&self, base_path: &Path, attr: &str) -> Result<String> {
        let path = base_path.join(attr);
        fs::read_to_string(&path).map_err(|e| {
            Error::HardwareDiscovery(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

fn list_dir_names(path: &Path) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        names.push(entry?.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}
