//! Orchestration Status Stores
//!
//! Implementations of the [`StatusStore`](crate::domain::ports::StatusStore)
//! port.

mod configmap;
mod memory;

pub use configmap::{
    connect_client, status_map_name, ConfigMapStatusStore, ConfigMapStoreConfig,
    CLUSTER_API_VERSION, CLUSTER_KIND, STATUS_MAP_PREFIX,
};
pub use memory::MemoryStatusStore;
