//! ConfigMap Status Store
//!
//! Stores orchestration status records in a Kubernetes ConfigMap, one map
//! per cluster, one data key per node. The map is owned by the cluster
//! resource so it is garbage collected with it.

use crate::domain::ports::{OrchestrationStatus, StatusStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Prefix of the per-cluster status ConfigMap name
pub const STATUS_MAP_PREFIX: &str = "osd-orchestration-status";

/// API version of the owning cluster resource
pub const CLUSTER_API_VERSION: &str = "ceph.rook.io/v1";

/// Kind of the owning cluster resource
pub const CLUSTER_KIND: &str = "CephCluster";

const APP_LABEL: &str = "rook-ceph-osd";
const FIELD_MANAGER: &str = "osd-provisioner";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the ConfigMap status store
#[derive(Debug, Clone)]
pub struct ConfigMapStoreConfig {
    /// Namespace the cluster (and the status map) lives in
    pub namespace: String,
    /// Name of the owning cluster resource
    pub cluster_name: String,
}

// =============================================================================
// Client
// =============================================================================

/// Build a client from the in-cluster or kubeconfig environment.
///
/// Failure happens before any agent exists, so it is reported as a
/// configuration error.
pub async fn connect_client() -> Result<Client> {
    Client::try_default().await.map_err(client_unavailable)
}

fn client_unavailable(e: kube::Error) -> Error {
    Error::Configuration(format!("Kubernetes client unavailable: {}", e))
}

// =============================================================================
// ConfigMap Status Store
// =============================================================================

/// Status store backed by a Kubernetes ConfigMap
pub struct ConfigMapStatusStore {
    config: ConfigMapStoreConfig,
    client: Client,
}

impl ConfigMapStatusStore {
    /// Create a new store using the given client
    pub fn new(config: ConfigMapStoreConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn api(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.config.namespace)
    }

    async fn write(
        &self,
        cluster_id: &str,
        node_name: &str,
        status: &OrchestrationStatus,
    ) -> Result<()> {
        let value = serde_json::to_string(status)?;
        let api = self.api();
        let map = build_status_map(&self.config, cluster_id, node_name, &value);
        let name = status_map_name(cluster_id);

        match api.create(&PostParams::default(), &map).await {
            Ok(_) => {
                info!(configmap = %name, namespace = %self.config.namespace, "Created status map");
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 409 => {
                debug!(configmap = %name, "Status map exists, patching node entry");
                api.patch(
                    &name,
                    &PatchParams::apply(FIELD_MANAGER),
                    &Patch::Merge(data_patch(node_name, &value)),
                )
                .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StatusStore for ConfigMapStatusStore {
    async fn put(
        &self,
        cluster_id: &str,
        node_name: &str,
        status: &OrchestrationStatus,
    ) -> Result<()> {
        self.write(cluster_id, node_name, status)
            .await
            .map_err(|e| Error::StatusWriteFailure {
                cluster_id: cluster_id.to_string(),
                node_name: node_name.to_string(),
                reason: e.to_string(),
            })
    }

    fn store_name(&self) -> &str {
        "configmap"
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Name of the status map for a cluster
pub fn status_map_name(cluster_id: &str) -> String {
    format!("{}-{}", STATUS_MAP_PREFIX, cluster_id)
}

/// Owner reference pointing at the cluster resource
fn cluster_owner_ref(cluster_name: &str, cluster_id: &str) -> OwnerReference {
    OwnerReference {
        api_version: CLUSTER_API_VERSION.to_string(),
        kind: CLUSTER_KIND.to_string(),
        name: cluster_name.to_string(),
        uid: cluster_id.to_string(),
        block_owner_deletion: Some(true),
        controller: None,
    }
}

fn build_status_map(
    config: &ConfigMapStoreConfig,
    cluster_id: &str,
    node_name: &str,
    value: &str,
) -> ConfigMap {
    let labels = BTreeMap::from([
        ("app".to_string(), APP_LABEL.to_string()),
        ("rook_cluster".to_string(), config.namespace.clone()),
    ]);

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(status_map_name(cluster_id)),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            owner_references: Some(vec![cluster_owner_ref(&config.cluster_name, cluster_id)]),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(node_name.to_string(), value.to_string())])),
        ..Default::default()
    }
}

fn data_patch(node_name: &str, value: &str) -> serde_json::Value {
    let mut data = serde_json::Map::new();
    data.insert(node_name.to_string(), json!(value));
    json!({ "data": data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::OrchestrationState;
    use assert_matches::assert_matches;
    use http::{Method, Request, Response, StatusCode};
    use hyper::Body;
    use kube::error::ErrorResponse;
    use tower_test::mock;

    const MAPS_PATH: &str = "/api/v1/namespaces/rook-ceph/configmaps";

    fn config() -> ConfigMapStoreConfig {
        ConfigMapStoreConfig {
            namespace: "rook-ceph".into(),
            cluster_name: "rook-ceph".into(),
        }
    }

    /// Store wired to a mock API server handle
    fn mock_store() -> (ConfigMapStatusStore, mock::Handle<Request<Body>, Response<Body>>) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "rook-ceph");
        (ConfigMapStatusStore::new(config(), client), handle)
    }

    fn status_response(code: u16, reason: &str) -> Response<Body> {
        let body = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": reason,
            "reason": reason,
            "code": code,
        });
        Response::builder()
            .status(StatusCode::from_u16(code).unwrap())
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn map_response(map: &ConfigMap) -> Response<Body> {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::from(serde_json::to_vec(map).unwrap()))
            .unwrap()
    }

    async fn body_json(request: Request<Body>) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(request.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_first_write_creates_map() {
        let (store, mut handle) = mock_store();

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("create sent");
            assert_eq!(request.method(), Method::POST);
            assert_eq!(request.uri().path(), MAPS_PATH);

            let map: ConfigMap = serde_json::from_value(body_json(request).await).unwrap();
            assert_eq!(map.metadata.name.as_deref(), Some("osd-orchestration-status-c1"));
            let stored: OrchestrationStatus =
                serde_json::from_str(&map.data.as_ref().unwrap()["n1"]).unwrap();
            assert_eq!(stored.status, OrchestrationState::Failed);
            assert_eq!(stored.message, "disk full");

            send.send_response(map_response(&map));
        });

        store
            .put("c1", "n1", &OrchestrationStatus::failed("disk full"))
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_existing_map_is_merge_patched() {
        let (store, mut handle) = mock_store();

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("create sent");
            assert_eq!(request.method(), Method::POST);
            send.send_response(status_response(409, "AlreadyExists"));

            let (request, send) = handle.next_request().await.expect("patch sent");
            assert_eq!(request.method(), Method::PATCH);
            assert_eq!(
                request.uri().path(),
                format!("{}/osd-orchestration-status-c1", MAPS_PATH)
            );
            assert_eq!(
                request.headers()[http::header::CONTENT_TYPE],
                "application/merge-patch+json"
            );

            let patch = body_json(request).await;
            let data = patch["data"].as_object().unwrap();
            assert_eq!(data.len(), 1);
            let stored: OrchestrationStatus =
                serde_json::from_str(data["n2"].as_str().unwrap()).unwrap();
            assert_eq!(stored.message, "no space left");

            send.send_response(map_response(&build_status_map(&config(), "c1", "n2", "{}")));
        });

        store
            .put("c1", "n2", &OrchestrationStatus::failed("no space left"))
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_status_write_failure() {
        let (store, mut handle) = mock_store();

        let server = tokio::spawn(async move {
            let (_request, send) = handle.next_request().await.expect("create sent");
            send.send_response(status_response(500, "InternalError"));
        });

        let result = store
            .put("c1", "n1", &OrchestrationStatus::failed("disk full"))
            .await;
        server.await.unwrap();

        assert_matches!(
            result,
            Err(Error::StatusWriteFailure { cluster_id, node_name, .. })
                if cluster_id == "c1" && node_name == "n1"
        );
    }

    #[test]
    fn test_client_failure_is_configuration_error() {
        let err = client_unavailable(kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: "no kubeconfig".into(),
            reason: "Unauthorized".into(),
            code: 401,
        }));
        assert_matches!(err, Error::Configuration(_));
        assert!(err.is_pre_agent());
    }

    #[test]
    fn test_status_map_name() {
        assert_eq!(
            status_map_name("5f0c-11e8"),
            "osd-orchestration-status-5f0c-11e8"
        );
    }

    #[test]
    fn test_build_status_map() {
        let record = OrchestrationStatus::failed("disk full");
        let value = serde_json::to_string(&record).unwrap();
        let map = build_status_map(&config(), "c1", "n1", &value);

        assert_eq!(map.metadata.name.as_deref(), Some("osd-orchestration-status-c1"));
        assert_eq!(map.metadata.namespace.as_deref(), Some("rook-ceph"));

        let owners = map.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].uid, "c1");
        assert_eq!(owners[0].kind, CLUSTER_KIND);
        assert_eq!(owners[0].name, "rook-ceph");

        let data = map.data.unwrap();
        let stored: OrchestrationStatus = serde_json::from_str(&data["n1"]).unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn test_data_patch_targets_node_key() {
        let patch = data_patch("n1", "{\"status\":\"failed\"}");
        assert_eq!(patch["data"]["n1"], "{\"status\":\"failed\"}");
        assert_eq!(patch["data"].as_object().unwrap().len(), 1);
    }
}
