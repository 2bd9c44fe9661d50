//! Hardware Module
//!
//! Local block device discovery used to resolve device filters.

pub mod scanner;

pub use scanner::{BlockDevice, HardwareScanner, ScannerConfig};
