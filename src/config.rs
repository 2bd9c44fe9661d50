//! Command Line Configuration
//!
//! Flags for the `osd` commands. Every flag can also be set through a
//! `ROOK_`-prefixed environment variable (`--data-devices` reads
//! `ROOK_DATA_DEVICES`).

use crate::error::{Error, Result};
use crate::osd::{
    parse_mon_endpoints, ClusterInfo, NetworkInfo, ProvisionContext, ProvisionRequest,
    StoreConfig, StoreType, DB_DEFAULT_SIZE_MB, DEFAULT_DAEMON_BINARY, JOURNAL_DEFAULT_SIZE_MB,
    WAL_DEFAULT_SIZE_MB,
};
use crate::provisioner::FilestoreDevice;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

// =============================================================================
// CLI Root
// =============================================================================

/// OSD Provisioner - prepares and runs a storage daemon on this node
#[derive(Parser, Debug)]
#[command(name = "osd-provisioner", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provisions and runs the osd daemon
    #[command(subcommand)]
    Osd(OsdCommand),
}

#[derive(Subcommand, Debug)]
pub enum OsdCommand {
    /// Generates osd config and prepares an osd for runtime
    Provision(ProvisionArgs),
    /// Runs the osd daemon for a filestore device
    FilestoreDevice(FilestoreDeviceArgs),
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ROOK_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "ROOK_LOG_JSON", global = true)]
    pub log_json: bool,
}

// =============================================================================
// Cluster Flags
// =============================================================================

/// Flags shared by every osd command
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// Name of the cluster (also its namespace)
    #[arg(long, env = "ROOK_CLUSTER_NAME", default_value = "")]
    pub cluster_name: String,

    /// Monitor endpoints, e.g. a=10.0.0.1:6789,b=10.0.0.2:6789
    #[arg(long, env = "ROOK_MON_ENDPOINTS", default_value = "")]
    pub mon_endpoints: String,

    /// Monitor secret
    #[arg(long, env = "ROOK_MON_SECRET", default_value = "", hide_env_values = true)]
    pub mon_secret: String,

    /// Admin secret
    #[arg(long, env = "ROOK_ADMIN_SECRET", default_value = "", hide_env_values = true)]
    pub admin_secret: String,

    /// Directory for generated configuration
    #[arg(long, env = "ROOK_CONFIG_DIR", default_value = "/var/lib/rook")]
    pub config_dir: PathBuf,

    /// Public network address of this node
    #[arg(long, env = "ROOK_PUBLIC_IPV4", default_value = "")]
    pub public_ipv4: String,

    /// Cluster (private) network address of this node
    #[arg(long, env = "ROOK_PRIVATE_IPV4", default_value = "")]
    pub private_ipv4: String,

    /// OSD daemon binary
    #[arg(long, env = "ROOK_DAEMON_BINARY", default_value = DEFAULT_DAEMON_BINARY)]
    pub daemon_binary: String,

    /// Root of sysfs
    #[arg(long, env = "ROOK_SYSFS_PATH", default_value = "/sys", hide = true)]
    pub sysfs_path: PathBuf,

    /// Run without Kubernetes; status is kept in memory
    #[arg(long, env = "ROOK_STANDALONE")]
    pub standalone: bool,
}

impl ClusterArgs {
    /// Verify the cluster flags every command needs
    pub fn verify_required(&self) -> Result<()> {
        verify_required(&[
            ("cluster-name", &self.cluster_name),
            ("mon-endpoints", &self.mon_endpoints),
            ("mon-secret", &self.mon_secret),
            ("admin-secret", &self.admin_secret),
        ])
    }

    /// Build the provisioning context (without a Kubernetes client)
    pub fn context(&self) -> ProvisionContext {
        ProvisionContext {
            cluster: ClusterInfo {
                name: self.cluster_name.clone(),
                monitors: parse_mon_endpoints(&self.mon_endpoints),
                mon_secret: self.mon_secret.clone(),
                admin_secret: self.admin_secret.clone(),
            },
            network: NetworkInfo {
                public_addr_ipv4: self.public_ipv4.clone(),
                cluster_addr_ipv4: self.private_ipv4.clone(),
            },
            config_dir: self.config_dir.clone(),
            sysfs_path: self.sysfs_path.clone(),
            dev_path: PathBuf::from("/dev"),
            daemon_binary: self.daemon_binary.clone(),
            kube_client: None,
        }
    }
}

// =============================================================================
// Provision Flags
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Comma separated list of devices to use for storage
    #[arg(long, env = "ROOK_DATA_DEVICES", default_value = "")]
    pub data_devices: String,

    /// A regex filter for the device names to use, or "all"
    #[arg(long, env = "ROOK_DATA_DEVICE_FILTER", default_value = "")]
    pub data_device_filter: String,

    /// Comma separated list of directory paths to use for storage
    #[arg(long, env = "ROOK_DATA_DIRECTORIES", default_value = "")]
    pub data_directories: String,

    /// Device to use for metadata (e.g. a high performance SSD/NVMe device)
    #[arg(long, env = "ROOK_METADATA_DEVICE", default_value = "")]
    pub metadata_device: String,

    /// Location of this node for CRUSH placement
    #[arg(long, env = "ROOK_LOCATION", default_value = "")]
    pub location: String,

    /// Force the format of any specified devices, even if they already have a filesystem. BE CAREFUL!
    #[arg(long, env = "ROOK_FORCE_FORMAT")]
    pub force_format: bool,

    /// The host name of the node (defaults to $HOSTNAME)
    #[arg(long, env = "ROOK_NODE_NAME")]
    pub node_name: Option<String>,

    /// The UID of the cluster resource that owns this cluster
    #[arg(long, env = "ROOK_CLUSTER_ID", default_value = "")]
    pub cluster_id: String,

    /// Size (MB) of the OSD write ahead log (bluestore)
    #[arg(long = "osd-wal-size", env = "ROOK_OSD_WAL_SIZE", default_value_t = WAL_DEFAULT_SIZE_MB)]
    pub wal_size_mb: u32,

    /// Size (MB) of the OSD database (bluestore)
    #[arg(long = "osd-database-size", env = "ROOK_OSD_DATABASE_SIZE", default_value_t = DB_DEFAULT_SIZE_MB)]
    pub database_size_mb: u32,

    /// Size (MB) of the OSD journal (filestore)
    #[arg(long = "osd-journal-size", env = "ROOK_OSD_JOURNAL_SIZE", default_value_t = JOURNAL_DEFAULT_SIZE_MB)]
    pub journal_size_mb: u32,

    /// Type of backing OSD store to use (bluestore or filestore)
    #[arg(long = "osd-store", env = "ROOK_OSD_STORE", default_value = "")]
    pub store_type: String,

    /// Only prepare osd directories or devices, do not start the daemon
    #[arg(
        long = "osd-prepare-only",
        env = "ROOK_OSD_PREPARE_ONLY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub prepare_only: bool,
}

impl ProvisionArgs {
    /// Node name from the flag, falling back to `$HOSTNAME`
    pub fn resolved_node_name(&self) -> String {
        self.node_name
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_default()
    }

    /// Verify all flags required to provision
    pub fn verify_required(&self) -> Result<()> {
        let node_name = self.resolved_node_name();
        verify_required(&[("cluster-id", &self.cluster_id), ("node-name", &node_name)])?;
        self.cluster.verify_required()
    }

    /// Convert the flags into a provision request
    pub fn to_request(&self) -> Result<ProvisionRequest> {
        Ok(ProvisionRequest {
            node_name: self.resolved_node_name(),
            cluster_id: self.cluster_id.clone(),
            data_devices: self.data_devices.clone(),
            data_device_filter: self.data_device_filter.clone(),
            data_directories: self.data_directories.clone(),
            metadata_device: self.metadata_device.clone(),
            location: self.location.clone(),
            store_config: StoreConfig {
                journal_size_mb: self.journal_size_mb,
                wal_size_mb: self.wal_size_mb,
                database_size_mb: self.database_size_mb,
                store_type: StoreType::parse(&self.store_type)?,
            },
            force_format: self.force_format,
            prepare_only: self.prepare_only,
        })
    }
}

// =============================================================================
// Filestore Device Flags
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct FilestoreDeviceArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// The source path of the device to mount
    #[arg(long, env = "ROOK_SOURCE_PATH", default_value = "")]
    pub source_path: String,

    /// The path where the device should be mounted
    #[arg(long, env = "ROOK_MOUNT_PATH", default_value = "")]
    pub mount_path: String,

    /// Extra arguments passed to the daemon
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl FilestoreDeviceArgs {
    /// Verify the flags the filestore command needs; cluster flags are optional here
    pub fn verify_required(&self) -> Result<()> {
        self.to_device().validate()
    }

    pub fn to_device(&self) -> FilestoreDevice {
        FilestoreDevice {
            source_path: self.source_path.clone(),
            mount_path: self.mount_path.clone(),
            args: self.args.clone(),
        }
    }
}

fn verify_required(flags: &[(&str, &String)]) -> Result<()> {
    match flags.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((flag, _)) => Err(Error::MissingFlag {
            flag: flag.to_string(),
        }),
        None => Ok(()),
    }
}
