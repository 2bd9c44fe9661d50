//! OSD Provisioner
//!
//! Entry point for the `osd provision` and `osd filestore-device` commands.
//! Only this file decides the process exit status.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use osd_provisioner::config::{Cli, Command, FilestoreDeviceArgs, LogArgs, OsdCommand, ProvisionArgs};
use osd_provisioner::{
    connect_client, provision_node, run_filestore_on_device, ConfigMapStatusStore,
    ConfigMapStoreConfig, LocalProvisioner, MemoryStatusStore, Result, StatusStoreRef,
};

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli.log);

    let result = match cli.command {
        Command::Osd(OsdCommand::Provision(args)) => run_provision(args).await,
        Command::Osd(OsdCommand::FilestoreDevice(args)) => run_filestore_device(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_pre_agent() {
                error!(error = %e, "Invalid osd configuration; no orchestration status recorded");
            } else {
                error!(error = %e, "osd command failed");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn run_provision(args: ProvisionArgs) -> Result<()> {
    args.verify_required()?;
    let request = args.to_request()?;

    info!("Starting OSD provisioning");
    info!("  Version: {}", osd_provisioner::VERSION);
    info!("  Cluster: {} ({})", args.cluster.cluster_name, request.cluster_id);
    info!("  Node: {}", request.node_name);
    info!("  Data devices: {:?}", request.data_devices);
    info!("  Data device filter: {:?}", request.data_device_filter);
    info!("  Data directories: {:?}", request.data_directories);
    info!("  Metadata device: {:?}", request.metadata_device);
    info!("  Location: {:?}", request.location);
    info!("  Store: {:?}", request.store_config);
    info!("  Prepare only: {}", request.prepare_only);
    info!("  Standalone mode: {}", args.cluster.standalone);

    let mut ctx = args.cluster.context();

    let status_store: StatusStoreRef = if args.cluster.standalone {
        Arc::new(MemoryStatusStore::new())
    } else {
        let client = connect_client().await?;
        ctx.kube_client = Some(client.clone());
        Arc::new(ConfigMapStatusStore::new(
            ConfigMapStoreConfig {
                namespace: args.cluster.cluster_name.clone(),
                cluster_name: args.cluster.cluster_name.clone(),
            },
            client,
        ))
    };

    provision_node(request, &ctx, Arc::new(LocalProvisioner::new()), status_store).await
}

async fn run_filestore_device(args: FilestoreDeviceArgs) -> Result<()> {
    args.verify_required()?;
    let device = args.to_device();

    info!("Starting filestore OSD");
    info!("  Cluster: {}", args.cluster.cluster_name);
    info!("  Source: {}", device.source_path);
    info!("  Mount: {}", device.mount_path);

    run_filestore_on_device(&args.cluster.context(), &device).await
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &LogArgs) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
