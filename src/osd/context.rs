//! Provisioning Context
//!
//! Runtime environment handed to the daemon provisioner: cluster identity,
//! monitor endpoints, network addresses, and local filesystem roots.

use kube::Client;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Default OSD daemon binary
pub const DEFAULT_DAEMON_BINARY: &str = "ceph-osd";

// =============================================================================
// Cluster Info
// =============================================================================

/// Identity and credentials of the storage cluster
#[derive(Clone, Default)]
pub struct ClusterInfo {
    /// Cluster name (also the namespace the cluster lives in)
    pub name: String,
    /// Monitor name -> endpoint
    pub monitors: BTreeMap<String, String>,
    pub mon_secret: String,
    pub admin_secret: String,
}

impl std::fmt::Debug for ClusterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterInfo")
            .field("name", &self.name)
            .field("monitors", &self.monitors)
            .field("mon_secret", &"<redacted>")
            .field("admin_secret", &"<redacted>")
            .finish()
    }
}

/// Parse monitor endpoints of the form `a=10.0.0.1:6789,b=10.0.0.2:6789`.
///
/// Malformed entries are skipped.
pub fn parse_mon_endpoints(raw: &str) -> BTreeMap<String, String> {
    let mut monitors = BTreeMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((name, endpoint)) if !name.trim().is_empty() && !endpoint.trim().is_empty() => {
                monitors.insert(name.trim().to_string(), endpoint.trim().to_string());
            }
            _ => warn!(entry = %entry, "Ignoring malformed mon endpoint"),
        }
    }

    monitors
}

// =============================================================================
// Network Info
// =============================================================================

/// Addresses the daemon binds to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    pub public_addr_ipv4: String,
    pub cluster_addr_ipv4: String,
}

impl NetworkInfo {
    /// Daemon arguments for the configured addresses
    pub fn daemon_args(&self) -> Vec<String> {
        vec![
            format!("--public-addr={}", self.public_addr_ipv4),
            format!("--cluster-addr={}", self.cluster_addr_ipv4),
        ]
    }
}

// =============================================================================
// Provision Context
// =============================================================================

/// Everything the provisioner needs beyond the agent itself
#[derive(Clone)]
pub struct ProvisionContext {
    pub cluster: ClusterInfo,
    pub network: NetworkInfo,
    /// Directory for generated OSD configuration
    pub config_dir: PathBuf,
    /// Root of sysfs (overridable for testing)
    pub sysfs_path: PathBuf,
    /// Root of device nodes (overridable for testing)
    pub dev_path: PathBuf,
    /// Binary started for the OSD daemon
    pub daemon_binary: String,
    /// Kubernetes client, absent in standalone mode
    pub kube_client: Option<Client>,
}

impl Default for ProvisionContext {
    fn default() -> Self {
        Self {
            cluster: ClusterInfo::default(),
            network: NetworkInfo::default(),
            config_dir: PathBuf::from("/var/lib/rook"),
            sysfs_path: PathBuf::from("/sys"),
            dev_path: PathBuf::from("/dev"),
            daemon_binary: DEFAULT_DAEMON_BINARY.to_string(),
            kube_client: None,
        }
    }
}
