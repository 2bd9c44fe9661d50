//! OSD Store Configuration
//!
//! Sizing parameters and backend selection for the OSD object store.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default write-ahead log size in MB (bluestore)
pub const WAL_DEFAULT_SIZE_MB: u32 = 576;
/// Default database size in MB (bluestore)
pub const DB_DEFAULT_SIZE_MB: u32 = 20480;
/// Default journal size in MB (filestore)
pub const JOURNAL_DEFAULT_SIZE_MB: u32 = 5120;

// =============================================================================
// Store Type
// =============================================================================

/// Backing store engine for an OSD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Write-ahead-log based store
    Bluestore,
    /// Journaled store on a filesystem
    Filestore,
}

impl StoreType {
    /// Parse a store type; the empty string means "choose automatically"
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        match raw.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "bluestore" => Ok(Some(StoreType::Bluestore)),
            "filestore" => Ok(Some(StoreType::Filestore)),
            other => Err(Error::Configuration(format!(
                "unknown OSD store type '{}' (expected bluestore or filestore)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Bluestore => write!(f, "bluestore"),
            StoreType::Filestore => write!(f, "filestore"),
        }
    }
}

// =============================================================================
// Store Config
// =============================================================================

/// Store engine parameters passed through to the daemon provisioner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Journal size in MB (filestore)
    pub journal_size_mb: u32,
    /// Write-ahead log size in MB (bluestore)
    pub wal_size_mb: u32,
    /// Database size in MB (bluestore)
    pub database_size_mb: u32,
    /// Store engine; `None` lets the provisioner choose
    pub store_type: Option<StoreType>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_size_mb: JOURNAL_DEFAULT_SIZE_MB,
            wal_size_mb: WAL_DEFAULT_SIZE_MB,
            database_size_mb: DB_DEFAULT_SIZE_MB,
            store_type: None,
        }
    }
}

impl StoreConfig {
    /// Store type to use for a resource when none was configured.
    ///
    /// Directories get filestore, devices get bluestore.
    pub fn effective_store_type(&self, is_directory: bool) -> StoreType {
        self.store_type.unwrap_or(if is_directory {
            StoreType::Filestore
        } else {
            StoreType::Bluestore
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_store_type_parse() {
        assert_eq!(StoreType::parse("").unwrap(), None);
        assert_eq!(StoreType::parse("bluestore").unwrap(), Some(StoreType::Bluestore));
        assert_eq!(StoreType::parse("Filestore").unwrap(), Some(StoreType::Filestore));
        assert_matches!(StoreType::parse("zfs"), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();

        assert_eq!(config.journal_size_mb, 5120);
        assert_eq!(config.wal_size_mb, 576);
        assert_eq!(config.database_size_mb, 20480);
        assert_eq!(config.store_type, None);
    }

    #[test]
    fn test_effective_store_type() {
        let auto = StoreConfig::default();
        assert_eq!(auto.effective_store_type(true), StoreType::Filestore);
        assert_eq!(auto.effective_store_type(false), StoreType::Bluestore);

        let pinned = StoreConfig {
            store_type: Some(StoreType::Filestore),
            ..Default::default()
        };
        assert_eq!(pinned.effective_store_type(false), StoreType::Filestore);
    }
}
