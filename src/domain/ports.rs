//! Domain Ports - Core trait definitions for the OSD provisioner
//!
//! These traits define the boundaries between the provisioning workflow and
//! external systems. Adapters implement these traits to provide concrete
//! functionality.

use crate::error::Result;
use crate::osd::{Agent, ProvisionContext};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Orchestration Status
// =============================================================================

/// Per-node orchestration state, as seen by the cluster orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationState {
    Starting,
    Orchestrating,
    Completed,
    Failed,
}

impl std::fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationState::Starting => write!(f, "starting"),
            OrchestrationState::Orchestrating => write!(f, "orchestrating"),
            OrchestrationState::Completed => write!(f, "completed"),
            OrchestrationState::Failed => write!(f, "failed"),
        }
    }
}

/// Orchestration status record for a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationStatus {
    /// Current state
    pub status: OrchestrationState,
    /// Human readable detail
    #[serde(default)]
    pub message: String,
    /// When the record was produced
    pub last_updated: DateTime<Utc>,
}

impl OrchestrationStatus {
    /// Build a failed record carrying the error message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: OrchestrationState::Failed,
            message: message.into(),
            last_updated: Utc::now(),
        }
    }
}

// =============================================================================
// Status Store Port
// =============================================================================

/// Port for the cluster-visible orchestration status store
///
/// Records are keyed by `(cluster_id, node_name)`. This crate only writes;
/// the cluster orchestrator owns reading and cleanup.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Write the status record for a node, replacing any previous record
    async fn put(
        &self,
        cluster_id: &str,
        node_name: &str,
        status: &OrchestrationStatus,
    ) -> Result<()>;

    /// Get store name (for logging)
    fn store_name(&self) -> &str;
}

// =============================================================================
// Daemon Provisioner Port
// =============================================================================

/// Port for the operation that prepares resources and starts the daemon
#[async_trait]
pub trait DaemonProvisioner: Send + Sync {
    /// Prepare the agent's resources and, unless the agent is prepare-only,
    /// start the daemon. Must not mutate the agent.
    async fn provision(&self, ctx: &ProvisionContext, agent: &Agent) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type StatusStoreRef = Arc<dyn StatusStore>;
pub type DaemonProvisionerRef = Arc<dyn DaemonProvisioner>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestration_state_display() {
        assert_eq!(format!("{}", OrchestrationState::Starting), "starting");
        assert_eq!(format!("{}", OrchestrationState::Orchestrating), "orchestrating");
        assert_eq!(format!("{}", OrchestrationState::Completed), "completed");
        assert_eq!(format!("{}", OrchestrationState::Failed), "failed");
    }

    #[test]
    fn test_failed_record_serializes_lowercase() {
        let record = OrchestrationStatus::failed("disk full");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "disk full");
        assert!(json.get("lastUpdated").is_some());

        let back: OrchestrationStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
