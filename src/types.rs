use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Envelope;

/// Whether a mutating call waits for its deferred action.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Poll the action until it terminates.
    #[default]
    Sync,
    /// Return the action ID without waiting.
    Async,
}

/// Result of a mutating call.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatched {
    /// The backend deferred the work; check it with
    /// [`EdgeClient::get_action_result`](crate::EdgeClient::get_action_result).
    Accepted { action_id: String },
    /// The work is done. `action_id` is set when it ran as a deferred action.
    Completed {
        action_id: Option<String>,
        envelope: Envelope,
    },
}

impl Dispatched {
    pub fn action_id(&self) -> Option<&str> {
        match self {
            Self::Accepted { action_id } => Some(action_id.as_str()),
            Self::Completed { action_id, .. } => action_id.as_deref(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// One-shot status of a deferred action.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionStatus {
    Running,
    /// Finished; carries the `content` of the result.
    Done(serde_json::Value),
}

/// One page of a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records matching the query across all pages.
    pub total: u64,
}

/// Cluster status after a failed creation; such clusters can be recreated.
pub const CLUSTER_STATUS_CREATE_FAILED: &str = "Status_Cluster_Create_Failed";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterView {
    pub id: i64,
    pub name: String,
    pub create_time: Option<DateTime<Utc>>,
    #[serde(rename = "prometheusURL")]
    pub prometheus_url: String,
    /// `Inner` or `Outer`.
    pub create_type: String,
    pub status: String,
    pub version: String,
    pub platform_component_version: String,
    pub node_count: i64,
    pub cpu: String,
    pub memory: String,
    pub storage: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterDetailsView {
    #[serde(flatten)]
    pub cluster: ClusterView,
    pub description: String,
    pub config: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfigView {
    pub kubeconfig: String,
    pub config: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterOperationView {
    pub id: i64,
    pub cluster_id: i64,
    pub operation: String,
    pub status: String,
    pub message: String,
    pub create_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub operate_user: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeView {
    pub id: i64,
    pub name: String,
    pub cluster_id: i64,
    pub ip: String,
    pub role: String,
    pub status: String,
    pub cpu: String,
    pub memory: String,
    pub storage: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

/// Non-system disk of a prospective node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskInfoView {
    pub name: String,
    pub size: i64,
    pub size_str: String,
    /// Already in use.
    pub used: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalNetworkView {
    pub ip_total_num: i64,
    pub ip_used_num: i64,
    pub exist_network: bool,
    pub id: i64,
    #[serde(rename = "cluster_id")]
    pub cluster_id: i64,
    pub name: String,
    pub description: String,
    pub iface: String,
    /// `manager` or `business`.
    #[serde(rename = "type")]
    pub network_type: String,
    pub spider_pool_ready: bool,
    pub metallb_ready: bool,
    pub netmask: String,
    pub gateway: String,
    pub cidr: String,
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalNetworkIpPoolView {
    pub name: String,
    pub l2_name: String,
    #[serde(rename = "type")]
    pub pool_type: String,
    /// `assign` or `global`.
    pub share_type: String,
    #[serde(rename = "projectIDs")]
    pub project_ids: Vec<i64>,
    pub ip_ranges: Vec<String>,
    pub ip6_ranges: Vec<String>,
    pub ip_total_num: i64,
    pub ip_used_num: i64,
    pub create_time: Option<DateTime<Utc>>,
    pub exist_ip_used: bool,
    pub disabled: bool,
}

/// Interfaces usable for an external network, per node and in common.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeIfaceAllResult {
    pub same_ifaces: Vec<String>,
    pub master_same_ifaces: Vec<String>,
    pub node_ifaces: Vec<NodeIfaceWithRouteIface>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeIfaceWithRouteIface {
    pub host: String,
    pub name: String,
    pub is_master: bool,
    pub ifaces: Vec<String>,
    pub iface_with_vlan: Vec<String>,
    pub node_iface_map: NodeIfaceMap,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeIfaceMap {
    pub vlan_map: HashMap<String, String>,
    pub br_map: HashMap<String, String>,
    pub route_map: HashMap<String, NodeInterfaceInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeInterfaceInfo {
    pub interface: String,
    pub ip_range: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProjectSimpleView {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub readonly: bool,
    pub create_time: Option<DateTime<Utc>>,
    /// `DELETE_FAILED` when a deletion did not go through.
    pub operation_fail_flag: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSimpleItem {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub node_count: i64,
    /// Preformatted by the backend.
    pub create_time: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectView {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserView {
    pub name: String,
    /// Initial password, only present right after creation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub is_admin: bool,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudResourceQuotaView {
    pub resource_type: String,
    pub quota: f64,
    pub used: f64,
    pub available: f64,
    pub unit: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInfoView {
    pub version: String,
}

/// Cluster entry of a project's cluster picker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSpinnerView {
    pub id: i64,
    pub name: String,
    pub unhealthy: bool,
    /// `Inner` or `Outer`.
    pub create_type: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamespaceView {
    pub name: String,
    pub cluster_id: i64,
    pub project_id: i64,
    pub status: String,
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryView {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub repository_type: String,
    pub url: String,
    pub status: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageView {
    pub name: String,
    pub repository_id: i64,
    pub size: i64,
    pub tag_count: i64,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTagView {
    pub tag: String,
    pub image_name: String,
    pub size: i64,
    pub digest: String,
    pub create_time: Option<DateTime<Utc>>,
    pub push_time: Option<DateTime<Utc>>,
}

/// Where and how to upload an image archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageImportApplyView {
    pub upload_url: String,
    pub upload_token: String,
    /// Unix timestamp.
    pub expire_time: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ClusterDetailsView, ClusterView, Dispatched, ExternalNetworkView, NodeIfaceAllResult};
    use crate::Envelope;

    #[test]
    fn cluster_view_reads_backend_field_names() {
        let view: ClusterView = serde_json::from_value(json!({
            "id": 3,
            "name": "edge-1",
            "createTime": "2024-03-05T07:08:09Z",
            "prometheusURL": "http://prom",
            "status": "Status_Cluster_Running",
            "nodeCount": 3,
            "platformComponentVersion": "4.2"
        }))
        .unwrap();
        assert_eq!(view.id, 3);
        assert_eq!(view.prometheus_url, "http://prom");
        assert_eq!(view.node_count, 3);
        assert!(view.create_time.is_some());
        assert!(view.cpu.is_empty());
    }

    #[test]
    fn details_flatten_cluster_fields() {
        let view: ClusterDetailsView = serde_json::from_value(json!({
            "id": 4,
            "name": "edge-2",
            "description": "lab",
            "config": {"podCidr": "10.233.64.0/18"}
        }))
        .unwrap();
        assert_eq!(view.cluster.id, 4);
        assert_eq!(view.description, "lab");
        assert!(view.config.contains_key("podCidr"));
    }

    #[test]
    fn network_views_use_mixed_case_keys() {
        let view: ExternalNetworkView =
            serde_json::from_value(json!({"cluster_id": 8, "type": "business", "ipTotalNum": 10}))
                .unwrap();
        assert_eq!(view.cluster_id, 8);
        assert_eq!(view.network_type, "business");

        let ifaces: NodeIfaceAllResult = serde_json::from_value(json!({
            "sameIfaces": ["eth0"],
            "nodeIfaces": [{"host": "n1", "isMaster": true, "nodeIfaceMap": {"VlanMap": {"eth0.10": "eth0"}}}]
        }))
        .unwrap();
        assert_eq!(ifaces.node_ifaces[0].node_iface_map.vlan_map["eth0.10"], "eth0");
    }

    #[test]
    fn dispatched_accessors() {
        let pending = Dispatched::Accepted {
            action_id: "a".to_owned(),
        };
        assert!(pending.is_pending());
        assert_eq!(pending.action_id(), Some("a"));

        let done = Dispatched::Completed {
            action_id: None,
            envelope: Envelope::default(),
        };
        assert!(!done.is_pending());
        assert_eq!(done.action_id(), None);
    }
}
