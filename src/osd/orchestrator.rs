//! Provisioning Orchestrator
//!
//! Runs the single-pass provisioning workflow for a node:
//!
//! ```text
//! Validating ─▶ Resolving ─▶ Provisioning ─┬─▶ Succeeded
//!                                          └─▶ Failed (status recorded)
//! ```
//!
//! Errors before provisioning leave no status behind. A provisioning failure
//! is recorded in the status store on a best-effort basis and then returned
//! unchanged. Nothing here retries; the cluster orchestrator decides whether
//! to run provisioning again.

use crate::domain::ports::{DaemonProvisionerRef, OrchestrationStatus, StatusStoreRef};
use crate::error::{Error, Result};
use crate::osd::agent::{Agent, AgentSpec};
use crate::osd::context::ProvisionContext;
use crate::osd::location::CrushLocation;
use crate::osd::selection::ResourceSelection;
use crate::osd::store_config::StoreConfig;
use tracing::{debug, error, info, warn};

// =============================================================================
// Provision Phase
// =============================================================================

/// Workflow phases, logged as the workflow advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPhase {
    Validating,
    Resolving,
    Provisioning,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionPhase::Validating => write!(f, "validating"),
            ProvisionPhase::Resolving => write!(f, "resolving"),
            ProvisionPhase::Provisioning => write!(f, "provisioning"),
            ProvisionPhase::Succeeded => write!(f, "succeeded"),
            ProvisionPhase::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Provision Request
// =============================================================================

/// Raw inputs for provisioning a node, as received from the command line
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub node_name: String,
    pub cluster_id: String,
    /// Comma separated device names
    pub data_devices: String,
    /// Device name regex, or `all`
    pub data_device_filter: String,
    /// Comma separated directory paths
    pub data_directories: String,
    pub metadata_device: String,
    /// Raw CRUSH placement, e.g. `rack=r1,zone=z1`
    pub location: String,
    pub store_config: StoreConfig,
    pub force_format: bool,
    pub prepare_only: bool,
}

impl ProvisionRequest {
    fn validate(&self) -> Result<()> {
        if self.node_name.trim().is_empty() {
            return Err(Error::MissingFlag {
                flag: "node-name".into(),
            });
        }
        if self.cluster_id.trim().is_empty() {
            return Err(Error::MissingFlag {
                flag: "cluster-id".into(),
            });
        }
        Ok(())
    }

    /// Resolve resources and location into an agent
    fn into_agent(self, status_store: StatusStoreRef) -> Result<Agent> {
        let resources = ResourceSelection::resolve(
            &self.data_devices,
            &self.data_device_filter,
            &self.data_directories,
        )?;
        let location = CrushLocation::format(&self.location, &self.node_name)?;

        let metadata_device = Some(self.metadata_device.trim())
            .filter(|d| !d.is_empty())
            .map(String::from);

        let spec = AgentSpec {
            node_name: self.node_name,
            cluster_id: self.cluster_id,
            resources,
            metadata_device,
            store_config: self.store_config,
            location,
            force_format: self.force_format,
            prepare_only: self.prepare_only,
        };

        Ok(Agent::new(spec, status_store))
    }
}

// =============================================================================
// Provisioning Orchestrator
// =============================================================================

/// Drives the daemon provisioner and reports its failures
pub struct ProvisioningOrchestrator {
    provisioner: DaemonProvisionerRef,
}

impl ProvisioningOrchestrator {
    /// Create a new orchestrator
    pub fn new(provisioner: DaemonProvisionerRef) -> Self {
        Self { provisioner }
    }

    /// Provision the agent's node.
    ///
    /// On failure a `Failed` status is written for `(cluster_id, node_name)`
    /// and the provisioner's error is returned as-is, even if that write
    /// fails too.
    pub async fn provision(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<()> {
        info!(
            node = %agent.node_name(),
            cluster_id = %agent.cluster_id(),
            phase = %ProvisionPhase::Provisioning,
            prepare_only = agent.prepare_only(),
            "Provisioning OSD"
        );

        let err = match self.provisioner.provision(ctx, agent).await {
            Ok(()) => {
                info!(node = %agent.node_name(), phase = %ProvisionPhase::Succeeded, "OSD provisioning completed");
                return Ok(());
            }
            Err(e) => e,
        };

        error!(
            node = %agent.node_name(),
            phase = %ProvisionPhase::Failed,
            error = %err,
            "OSD provisioning failed"
        );

        let status = OrchestrationStatus::failed(err.to_string());
        match agent
            .status_store()
            .put(agent.cluster_id(), agent.node_name(), &status)
            .await
        {
            Ok(()) => debug!(
                store = agent.status_store().store_name(),
                "Recorded failed orchestration status"
            ),
            Err(write_err) => warn!(
                store = agent.status_store().store_name(),
                error = %write_err,
                "Failed to record orchestration status"
            ),
        }

        Err(err)
    }
}

/// Provision this node now.
///
/// Validates the request, resolves its resources and location, builds the
/// agent, and runs it through a [`ProvisioningOrchestrator`].
pub async fn provision_node(
    request: ProvisionRequest,
    ctx: &ProvisionContext,
    provisioner: DaemonProvisionerRef,
    status_store: StatusStoreRef,
) -> Result<()> {
    debug!(phase = %ProvisionPhase::Validating, "Validating provision request");
    request.validate()?;

    if request.force_format {
        warn!("Force format enabled; devices holding a filesystem may be reformatted");
    }

    debug!(phase = %ProvisionPhase::Resolving, "Resolving resources and location");
    let agent = request.into_agent(status_store)?;

    info!(
        devices = ?agent.resources().devices(),
        directories = ?agent.resources().directories(),
        location = %agent.location(),
        "Resolved OSD resources"
    );

    ProvisioningOrchestrator::new(provisioner)
        .provision(ctx, &agent)
        .await
}
