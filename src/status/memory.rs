//! In-Memory Status Store
//!
//! Process-local status store used in standalone mode and in tests.

use crate::domain::ports::{OrchestrationStatus, StatusStore};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Status store backed by a map keyed by `(cluster_id, node_name)`
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: RwLock<BTreeMap<(String, String), OrchestrationStatus>>,
}

impl MemoryStatusStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for a node
    pub fn get(&self, cluster_id: &str, node_name: &str) -> Option<OrchestrationStatus> {
        self.records
            .read()
            .get(&(cluster_id.to_string(), node_name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn put(
        &self,
        cluster_id: &str,
        node_name: &str,
        status: &OrchestrationStatus,
    ) -> Result<()> {
        self.records.write().insert(
            (cluster_id.to_string(), node_name.to_string()),
            status.clone(),
        );
        Ok(())
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
