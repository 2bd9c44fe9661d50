//! Error types for the OSD provisioner
//!
//! Provides structured error types for resource selection, location
//! formatting, the provisioning workflow, and status reporting.

use thiserror::Error;

/// Unified error type for the provisioner
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required flag: --{flag}")]
    MissingFlag { flag: String },

    // =========================================================================
    // Resource Selection Errors
    // =========================================================================
    #[error("Only one of --data-devices and --data-device-filter can be specified")]
    ConfigurationConflict,

    #[error("Invalid device filter '{filter}': {reason}")]
    InvalidDeviceFilter { filter: String, reason: String },

    #[error("Invalid location: CRUSH location field '{field}' is not in a valid format")]
    InvalidLocation { field: String },

    // =========================================================================
    // Provisioning Errors
    // =========================================================================
    /// Failure reported by the daemon provisioning operation. The message is
    /// carried verbatim into the orchestration status record.
    #[error("{0}")]
    ProvisioningFailure(String),

    #[error("No devices or directories selected for node {node_name}")]
    NoResourcesSelected { node_name: String },

    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Device {device} is in use ({reason}); set --force-format to reformat it")]
    DeviceInUse { device: String, reason: String },

    #[error("Hardware discovery failed: {0}")]
    HardwareDiscovery(String),

    // =========================================================================
    // Status Store Errors
    // =========================================================================
    #[error("Failed to write orchestration status for {cluster_id}/{node_name}: {reason}")]
    StatusWriteFailure {
        cluster_id: String,
        node_name: String,
        reason: String,
    },

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error. Success is the only zero exit.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Whether this error was raised before a provisioning agent existed.
    ///
    /// Such errors never leave an orchestration status behind.
    pub fn is_pre_agent(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::MissingFlag { .. }
                | Error::ConfigurationConflict
                | Error::InvalidDeviceFilter { .. }
                | Error::InvalidLocation { .. }
        )
    }
}

/// Result type alias for the provisioner
pub type Result<T> = std::result::Result<T, Error>;
