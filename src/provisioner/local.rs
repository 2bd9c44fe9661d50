//! Local Daemon Provisioner
//!
//! Resolves the agent's resource selection against the node's block devices,
//! prepares data directories and the per-node OSD configuration, and starts
//! the OSD daemon unless the agent is prepare-only.

use crate::domain::ports::DaemonProvisioner;
use crate::error::{Error, Result};
use crate::hardware::{BlockDevice, HardwareScanner};
use crate::osd::{Agent, DeviceSelection, ProvisionContext, StoreType};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Per-directory OSD configuration file
pub const OSD_CONFIG_FILE: &str = "osd-config.json";

/// Per-node device inventory file
pub const DEVICES_FILE: &str = "devices.json";

// =============================================================================
// Prepared Resources
// =============================================================================

/// Configuration written for each prepared resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsdResourceConfig {
    pub cluster: String,
    pub node_name: String,
    /// Device name or directory path
    pub resource: String,
    pub store_type: StoreType,
    pub journal_size_mb: u32,
    pub wal_size_mb: u32,
    pub database_size_mb: u32,
    pub metadata_device: Option<String>,
    pub crush_location: String,
}

/// Resources prepared for a node
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedResources {
    pub devices: Vec<OsdResourceConfig>,
    pub directories: Vec<OsdResourceConfig>,
}

// =============================================================================
// Local Provisioner
// =============================================================================

/// Default provisioner operating on the local node
#[derive(Debug, Default)]
pub struct LocalProvisioner;

impl LocalProvisioner {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the agent's device selection to concrete devices
    fn select_devices(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<Vec<BlockDevice>> {
        let scanner = HardwareScanner::with_sysfs(&ctx.sysfs_path);

        match agent.resources().devices() {
            DeviceSelection::None => Ok(Vec::new()),
            DeviceSelection::Explicit(names) => {
                let mut devices = Vec::with_capacity(names.len());
                for name in names {
                    let name = name.strip_prefix("/dev/").unwrap_or(name.as_str());
                    if !ctx.dev_path.join(name).exists() {
                        return Err(Error::DeviceNotFound {
                            device: name.to_string(),
                        });
                    }
                    let device = scanner.device(name)?;
                    if let Some(reason) = device.in_use_reason() {
                        if !agent.force_format() {
                            return Err(Error::DeviceInUse {
                                device: device.name,
                                reason,
                            });
                        }
                        warn!(device = %device.name, %reason, "Reformatting device in use");
                    }
                    devices.push(device);
                }
                Ok(devices)
            }
            DeviceSelection::Filter(filter) => {
                let mut devices = Vec::new();
                for device in scanner.discover()? {
                    if !filter.matches(&device.name) {
                        continue;
                    }
                    match device.in_use_reason() {
                        Some(reason) if !agent.force_format() => {
                            info!(device = %device.name, %reason, "Skipping device in use");
                        }
                        _ => devices.push(device),
                    }
                }
                debug!(filter = %filter, count = devices.len(), "Applied device filter");
                Ok(devices)
            }
        }
    }

    fn resource_config(
        &self,
        ctx: &ProvisionContext,
        agent: &Agent,
        resource: &str,
        is_directory: bool,
    ) -> OsdResourceConfig {
        let store = agent.store_config();
        OsdResourceConfig {
            cluster: ctx.cluster.name.clone(),
            node_name: agent.node_name().to_string(),
            resource: resource.to_string(),
            store_type: store.effective_store_type(is_directory),
            journal_size_mb: store.journal_size_mb,
            wal_size_mb: store.wal_size_mb,
            database_size_mb: store.database_size_mb,
            metadata_device: agent.metadata_device().map(String::from),
            crush_location: agent.location().to_string(),
        }
    }

    /// Prepare devices and directories, writing their configuration
    async fn prepare(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<PreparedResources> {
        let devices = self.select_devices(ctx, agent)?;
        let directories = agent.resources().directories();

        if devices.is_empty() && directories.is_empty() {
            return Err(Error::NoResourcesSelected {
                node_name: agent.node_name().to_string(),
            });
        }

        let mut prepared = PreparedResources::default();

        for dir in directories {
            let path = Path::new(dir);
            fs::create_dir_all(path).await?;
            let config = self.resource_config(ctx, agent, dir, true);
            write_json(&path.join(OSD_CONFIG_FILE), &config).await?;
            info!(directory = %dir, store = %config.store_type, "Prepared OSD directory");
            prepared.directories.push(config);
        }

        for device in &devices {
            let config = self.resource_config(ctx, agent, &device.name, false);
            info!(device = %device.name, store = %config.store_type, "Prepared OSD device");
            prepared.devices.push(config);
        }

        let node_dir = node_config_dir(ctx, agent);
        fs::create_dir_all(&node_dir).await?;
        write_json(&node_dir.join(DEVICES_FILE), &prepared).await?;

        Ok(prepared)
    }

    async fn start_daemon(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<()> {
        let args = daemon_args(ctx, agent);
        info!(binary = %ctx.daemon_binary, ?args, "Starting OSD daemon");

        let status = Command::new(&ctx.daemon_binary)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                Error::ProvisioningFailure(format!(
                    "failed to start {}: {}",
                    ctx.daemon_binary, e
                ))
            })?;

        if !status.success() {
            return Err(Error::ProvisioningFailure(format!(
                "{} exited with {}",
                ctx.daemon_binary, status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl DaemonProvisioner for LocalProvisioner {
    async fn provision(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<()> {
        let prepared = self.prepare(ctx, agent).await?;
        info!(
            devices = prepared.devices.len(),
            directories = prepared.directories.len(),
            "OSD resources prepared"
        );

        if agent.prepare_only() {
            info!("Prepare only; not starting the OSD daemon");
            return Ok(());
        }

        self.start_daemon(ctx, agent).await
    }
}

/// Directory holding the generated configuration for the agent's node
pub fn node_config_dir(ctx: &ProvisionContext, agent: &Agent) -> PathBuf {
    ctx.config_dir.join(agent.node_name())
}

/// Arguments passed to the OSD daemon
pub fn daemon_args(ctx: &ProvisionContext, agent: &Agent) -> Vec<String> {
    let mut args = vec![
        "--foreground".to_string(),
        format!("--cluster={}", ctx.cluster.name),
        format!("--crush-location={}", agent.location()),
        format!("--osd-data={}", node_config_dir(ctx, agent).display()),
    ];
    args.extend(ctx.network.daemon_args());
    args
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::scanner::tests::fake_sysfs;
    use crate::osd::{AgentSpec, CrushLocation, ResourceSelection, StoreConfig};
    use crate::status::MemoryStatusStore;
    use assert_matches::assert_matches;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        sysfs: TempDir,
        dev: TempDir,
        work: TempDir,
    }

    impl Fixture {
        fn new(devices: &[(&str, u64, &[&str])]) -> Self {
            let sysfs = fake_sysfs(devices);
            let dev = TempDir::new().unwrap();
            for (name, _, _) in devices {
                fs::write(dev.path().join(name), "").unwrap();
            }
            Self {
                sysfs,
                dev,
                work: TempDir::new().unwrap(),
            }
        }

        fn context(&self, daemon_binary: &str) -> ProvisionContext {
            let mut ctx = ProvisionContext::default();
            ctx.cluster.name = "rook-ceph".into();
            ctx.sysfs_path = self.sysfs.path().to_path_buf();
            ctx.dev_path = self.dev.path().to_path_buf();
            ctx.config_dir = self.work.path().join("config");
            ctx.daemon_binary = daemon_binary.into();
            ctx
        }

        fn data_dir(&self, name: &str) -> String {
            self.work.path().join(name).display().to_string()
        }
    }

    fn agent(devices: &str, filter: &str, dirs: &str, force: bool, prepare_only: bool) -> Agent {
        let spec = AgentSpec {
            node_name: "node-a".into(),
            cluster_id: "c1".into(),
            resources: ResourceSelection::resolve(devices, filter, dirs).unwrap(),
            metadata_device: None,
            store_config: StoreConfig::default(),
            location: CrushLocation::format("rack=r1", "node-a").unwrap(),
            force_format: force,
            prepare_only,
        };
        Agent::new(spec, Arc::new(MemoryStatusStore::new()))
    }

    #[tokio::test]
    async fn test_prepare_only_writes_config_without_daemon() {
        let fx = Fixture::new(&[("sdb", 1000, &[])]);
        let dir = fx.data_dir("osd0");
        let agent = agent("sdb", "", &dir, false, true);
        // A missing binary proves the daemon is never started
        let ctx = fx.context("/nonexistent/ceph-osd");

        LocalProvisioner::new().provision(&ctx, &agent).await.unwrap();

        let config: serde_json::Value =
            serde_json::from_slice(&fs::read(Path::new(&dir).join(OSD_CONFIG_FILE)).unwrap())
                .unwrap();
        assert_eq!(config["storeType"], "filestore");
        assert_eq!(config["crushLocation"], "rack=r1 host=node-a");
        assert_eq!(config["journalSizeMb"], 5120);

        let inventory: serde_json::Value = serde_json::from_slice(
            &fs::read(ctx.config_dir.join("node-a").join(DEVICES_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(inventory["devices"][0]["resource"], "sdb");
        assert_eq!(inventory["devices"][0]["storeType"], "bluestore");
    }

    #[tokio::test]
    async fn test_daemon_failure_is_provisioning_failure() {
        let fx = Fixture::new(&[]);
        let agent = agent("", "", &fx.data_dir("osd0"), false, false);

        let result = LocalProvisioner::new()
            .provision(&fx.context("/nonexistent/ceph-osd"), &agent)
            .await;

        assert_matches!(result, Err(Error::ProvisioningFailure(msg)) if msg.contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_daemon_exit_status_checked() {
        let fx = Fixture::new(&[]);
        let agent = agent("", "", &fx.data_dir("osd0"), false, false);

        let ok = LocalProvisioner::new().provision(&fx.context("true"), &agent).await;
        assert!(ok.is_ok());

        let failed = LocalProvisioner::new().provision(&fx.context("false"), &agent).await;
        assert_matches!(failed, Err(Error::ProvisioningFailure(msg)) if msg.contains("exited"));
    }

    #[tokio::test]
    async fn test_missing_explicit_device() {
        let fx = Fixture::new(&[("sdb", 1000, &[])]);
        let agent = agent("sdc", "", "", false, true);

        let result = LocalProvisioner::new().provision(&fx.context("true"), &agent).await;
        assert_matches!(result, Err(Error::DeviceNotFound { device }) if device == "sdc");
    }

    #[tokio::test]
    async fn test_explicit_device_in_use_requires_force() {
        let fx = Fixture::new(&[("sdb", 1000, &["sdb1"])]);

        let result = LocalProvisioner::new()
            .provision(&fx.context("true"), &agent("sdb", "", "", false, true))
            .await;
        assert_matches!(result, Err(Error::DeviceInUse { device, .. }) if device == "sdb");

        let result = LocalProvisioner::new()
            .provision(&fx.context("true"), &agent("sdb", "", "", true, true))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_filter_skips_devices_in_use() {
        let fx = Fixture::new(&[("sda", 1000, &["sda1"]), ("sdb", 1000, &[]), ("sdc", 1000, &[])]);
        let ctx = fx.context("true");
        let agent = agent("", "^sd[ab]$", "", false, true);

        let prepared = LocalProvisioner::new().prepare(&ctx, &agent).await.unwrap();
        let names: Vec<&str> = prepared.devices.iter().map(|d| d.resource.as_str()).collect();
        assert_eq!(names, vec!["sdb"]);
    }

    #[tokio::test]
    async fn test_nothing_selected() {
        let fx = Fixture::new(&[("sda", 1000, &["sda1"])]);
        let agent = agent("", "all", "", false, true);

        let result = LocalProvisioner::new().provision(&fx.context("true"), &agent).await;
        assert_matches!(result, Err(Error::NoResourcesSelected { node_name }) if node_name == "node-a");
    }

    #[test]
    fn test_daemon_args() {
        let fx = Fixture::new(&[]);
        let mut ctx = fx.context("ceph-osd");
        ctx.network.public_addr_ipv4 = "10.0.0.5".into();
        ctx.network.cluster_addr_ipv4 = "192.168.0.5".into();
        let agent = agent("", "", "/tmp/x", false, false);

        let args = daemon_args(&ctx, &agent);
        assert_eq!(args[0], "--foreground");
        assert!(args.contains(&"--cluster=rook-ceph".to_string()));
        assert!(args.contains(&"--crush-location=rack=r1 host=node-a".to_string()));
        assert!(args.contains(&"--public-addr=10.0.0.5".to_string()));
        assert!(args.contains(&"--cluster-addr=192.168.0.5".to_string()));
    }
}
