//! OSD Provisioner
//!
//! Provisions a storage daemon (OSD) on a single cluster node and records
//! failures in a cluster-visible orchestration status store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          osd provision (CLI)                                │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐                      ┌─────────────────────────┐   │
//! │  │  Resource Selector  │                      │   Location Formatter    │   │
//! │  │  (devices | filter) │                      │   (CRUSH key=value)     │   │
//! │  └──────────┬──────────┘                      └────────────┬────────────┘   │
//! │             └──────────────────┬───────────────────────────┘                │
//! │                    ┌───────────┴───────────┐                                │
//! │                    │   Provisioning Agent  │                                │
//! │                    │      (immutable)      │                                │
//! │                    └───────────┬───────────┘                                │
//! │                    ┌───────────┴───────────┐                                │
//! │                    │  Provisioning         │──── failure ───┐               │
//! │                    │  Orchestrator         │                │               │
//! │                    └───────────┬───────────┘                │               │
//! ├────────────────────────────────┼────────────────────────────┼───────────────┤
//! │  ┌─────────────────────────────┴───────┐  ┌─────────────────┴────────────┐  │
//! │  │        Daemon Provisioner           │  │        Status Store          │  │
//! │  │  (sysfs scan, prepare, ceph-osd)    │  │   (ConfigMap | in-memory)    │  │
//! │  └─────────────────────────────────────┘  └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`osd`]: Resource selection, location formatting, agent, and workflow
//! - [`provisioner`]: Daemon provisioner and filestore-on-device runner
//! - [`status`]: Orchestration status stores
//! - [`hardware`]: Block device discovery
//! - [`domain`]: Port definitions
//! - [`config`]: Command line flags
//! - [`error`]: Error types and handling

pub mod config;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod osd;
pub mod provisioner;
pub mod status;

// Re-export commonly used types
pub use domain::ports::{
    DaemonProvisioner, DaemonProvisionerRef, OrchestrationState, OrchestrationStatus,
    StatusStore, StatusStoreRef,
};

pub use error::{Error, Result};

pub use osd::{
    provision_node, Agent, AgentSpec, CrushLocation, DeviceFilter, DeviceSelection,
    ProvisionContext, ProvisionRequest, ProvisioningOrchestrator, ResourceSelection, StoreConfig,
    StoreType,
};

pub use provisioner::{run_filestore_on_device, FilestoreDevice, LocalProvisioner};

pub use status::{
    connect_client, ConfigMapStatusStore, ConfigMapStoreConfig, MemoryStatusStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
