//! Provisioning Agent
//!
//! Immutable bundle of everything needed to provision one node's OSD.

use crate::domain::ports::StatusStoreRef;
use crate::osd::location::CrushLocation;
use crate::osd::selection::ResourceSelection;
use crate::osd::store_config::StoreConfig;

/// Inputs for an [`Agent`], already validated by the caller
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub node_name: String,
    pub cluster_id: String,
    pub resources: ResourceSelection,
    pub metadata_device: Option<String>,
    pub store_config: StoreConfig,
    pub location: CrushLocation,
    pub force_format: bool,
    pub prepare_only: bool,
}

/// A fully constructed provisioning request for a single node
pub struct Agent {
    spec: AgentSpec,
    status_store: StatusStoreRef,
}

impl Agent {
    /// Build an agent. Construction cannot fail.
    pub fn new(spec: AgentSpec, status_store: StatusStoreRef) -> Self {
        Self { spec, status_store }
    }

    pub fn node_name(&self) -> &str {
        &self.spec.node_name
    }

    pub fn cluster_id(&self) -> &str {
        &self.spec.cluster_id
    }

    pub fn resources(&self) -> &ResourceSelection {
        &self.spec.resources
    }

    pub fn metadata_device(&self) -> Option<&str> {
        self.spec.metadata_device.as_deref()
    }

    pub fn store_config(&self) -> &StoreConfig {
        &self.spec.store_config
    }

    pub fn location(&self) -> &CrushLocation {
        &self.spec.location
    }

    /// Whether devices that already hold a filesystem may be reformatted
    pub fn force_format(&self) -> bool {
        self.spec.force_format
    }

    /// Whether to stop after preparing resources without starting the daemon
    pub fn prepare_only(&self) -> bool {
        self.spec.prepare_only
    }

    /// Store used to report failures
    pub fn status_store(&self) -> &StatusStoreRef {
        &self.status_store
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("spec", &self.spec)
            .field("status_store", &self.status_store.store_name())
            .finish()
    }
}
