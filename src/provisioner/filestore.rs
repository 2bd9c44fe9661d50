//! Filestore on Device
//!
//! Mounts a prepared filestore device and runs the OSD daemon on it in the
//! foreground.

use crate::error::{Error, Result};
use crate::osd::ProvisionContext;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Binary used to mount the filestore device
pub const MOUNT_BINARY: &str = "mount";

/// Request to run a filestore OSD on a device
#[derive(Debug, Clone, Default)]
pub struct FilestoreDevice {
    /// Device to mount
    pub source_path: String,
    /// Where the device is mounted
    pub mount_path: String,
    /// Extra daemon arguments
    pub args: Vec<String>,
}

impl FilestoreDevice {
    /// Verify the required fields are set
    pub fn validate(&self) -> Result<()> {
        for (flag, value) in [("source-path", &self.source_path), ("mount-path", &self.mount_path)] {
            if value.trim().is_empty() {
                return Err(Error::MissingFlag { flag: flag.into() });
            }
        }
        Ok(())
    }

    /// Daemon arguments: the extra args, then network and data options
    pub fn daemon_args(&self, ctx: &ProvisionContext) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(ctx.network.daemon_args());
        args.push("--foreground".to_string());
        args.push(format!("--cluster={}", ctx.cluster.name));
        args.push(format!("--osd-data={}", self.mount_path));
        args
    }
}

/// Mount the device and run the OSD daemon until it exits
pub async fn run_filestore_on_device(ctx: &ProvisionContext, device: &FilestoreDevice) -> Result<()> {
    device.validate()?;

    tokio::fs::create_dir_all(Path::new(&device.mount_path)).await?;

    info!(source = %device.source_path, target = %device.mount_path, "Mounting filestore device");
    run_checked(MOUNT_BINARY, &[device.source_path.clone(), device.mount_path.clone()]).await?;

    let args = device.daemon_args(ctx);
    info!(binary = %ctx.daemon_binary, ?args, "Running filestore OSD");
    run_checked(&ctx.daemon_binary, &args).await
}

async fn run_checked(binary: &str, args: &[String]) -> Result<()> {
    let status = Command::new(binary)
        .args(args)
        .status()
        .await
        .map_err(|e| Error::ProvisioningFailure(format!("failed to run {}: {}", binary, e)))?;

    if !status.success() {
        return Err(Error::ProvisioningFailure(format!(
            "{} exited with {}",
            binary, status
        )));
    }
    Ok(())
}
