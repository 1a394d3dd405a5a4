use std::collections::HashMap;
use std::net::Ipv4Addr;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{EdgeError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ClusterNodeRole {
    Master,
    Worker,
    #[serde(rename = "GPU")]
    Gpu,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum GpuProduct {
    #[default]
    #[serde(rename = "")]
    None,
    Ascend,
    Nvidia,
    Iluvatar,
    Hygon,
    Enflame,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    #[default]
    Containerd,
}

/// Cluster creation request.
///
/// `password` is the SSH password of the nodes in plain text; it is encrypted
/// with the access key secret before it is sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateParam {
    #[serde(rename = "enableHA")]
    pub enable_ha: bool,
    pub name: String,
    pub nodes: Vec<ClusterCreateNodeParam>,
    /// Management and business traffic share one network.
    pub net_combined: bool,
    /// SSH port.
    pub port: u16,
    pub password: String,
    pub management_vip_v4: String,
    pub business_vip_v4: String,
    pub max_pod_per_node: u32,
    /// Node name to data disk devices.
    pub data_disk: HashMap<String, Vec<String>>,
    pub image_data_disk: HashMap<String, Vec<String>>,
    pub pod_cidr_v4: String,
    pub service_cidr_v4: String,
    pub dns_server: String,
    #[serde(rename = "enableIstio")]
    pub istio_enabled: bool,
    pub k8s_version: String,
    pub iluvatar_gpu_model: String,
    pub iluvatar_license: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateNodeParam {
    pub name: String,
    pub roles: Vec<ClusterNodeRole>,
    pub gpu_product: GpuProduct,
    #[serde(rename = "managementIPv4Addr")]
    pub management_ipv4_addr: String,
    #[serde(rename = "businessIPv4Addr")]
    pub business_ipv4_addr: String,
}

impl ClusterCreateParam {
    /// Checks every field rule and reports all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        if self.port == 0 {
            errors.push(invalid("port", "is required"));
        }
        require(&mut errors, "password", &self.password);
        ipv4(&mut errors, "managementVipV4", &self.management_vip_v4);
        ipv4(&mut errors, "businessVipV4", &self.business_vip_v4);
        ipv4(&mut errors, "dnsServer", &self.dns_server);
        cidr(&mut errors, "podCidrV4", &self.pod_cidr_v4);
        cidr(&mut errors, "serviceCidrV4", &self.service_cidr_v4);
        if self.data_disk.is_empty() {
            errors.push(invalid("dataDisk", "is required"));
        }
        if self.nodes.is_empty() {
            errors.push(invalid("nodes", "at least one node is required"));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let field = |name: &str| format!("nodes[{index}].{name}");
            require(&mut errors, &field("name"), &node.name);
            if node.roles.is_empty() {
                errors.push(invalid(&field("roles"), "is required"));
            }
            ipv4(&mut errors, &field("managementIPv4Addr"), &node.management_ipv4_addr);
            ipv4(&mut errors, &field("businessIPv4Addr"), &node.business_ipv4_addr);
        }
        EdgeError::collect(errors)
    }
}

/// Node addition request. The SSH password is passed separately to
/// [`EdgeClient::add_nodes`](crate::EdgeClient::add_nodes).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAddParam {
    #[serde(rename = "clusterID")]
    pub cluster_id: i64,
    pub nodes: Vec<NodeAddObjParam>,
    pub container_runtime: ContainerRuntime,
    pub dns_server: String,
    pub image_data_disk: HashMap<String, Vec<String>>,
    pub iluvatar_license: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAddObjParam {
    pub name: String,
    /// Management address.
    pub ip: String,
    pub business_ip: String,
    pub ip6: String,
    /// SSH port.
    pub port: u16,
    pub roles: Vec<ClusterNodeRole>,
    pub gpu_product: GpuProduct,
}

/// Wire form of a node addition: the parameters plus the encrypted password.
#[derive(Serialize)]
pub(crate) struct NodeAddRequest<'a> {
    #[serde(flatten)]
    pub(crate) param: &'a NodeAddParam,
    pub(crate) password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNetworkCreateParam {
    #[serde(rename = "clusterID")]
    pub cluster_id: i64,
    pub description: String,
    pub gateway: String,
    pub iface: String,
    pub name: String,
    pub netmask: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum IpPoolType {
    /// External network for services.
    #[default]
    Svc,
    /// Additional pod network.
    Pod,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNetworkIpPoolCreateParam {
    pub name: String,
    pub ip_pool_type: IpPoolType,
    pub start_ip: String,
    pub end_ip: String,
}

impl ExternalNetworkIpPoolCreateParam {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if !is_dns_label(&self.name) {
            errors.push(invalid(
                "name",
                "must be 2-50 characters of lowercase letters, digits and '-', starting with a letter and ending with a letter or digit",
            ));
        }
        require(&mut errors, "startIp", &self.start_ip);
        require(&mut errors, "endIp", &self.end_ip);
        EdgeError::collect(errors)
    }
}

/// Cloud project creation. The caller chooses the project UUID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProjectCreateParam {
    pub uuid: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
}

/// Cloud project update; empty fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProjectUpdateParam {
    pub uuid: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
}

/// Grants every listed user access to every listed project.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProjectUserAddParam {
    pub project_uuids: Vec<String>,
    /// Login names.
    pub usernames: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuotaParam {
    pub quotas: Vec<ResourceQuota>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuota {
    pub resource_type: String,
    pub quota: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudUserCreateParam {
    pub name: String,
    /// Account managed by an external identity provider.
    pub third_party: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
}

/// Target of a container snapshot pushed to a project repository.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPackageParam {
    pub repository: String,
    /// Image name.
    pub name: String,
    pub tag: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RepositoryType {
    #[default]
    #[serde(rename = "Type_Harbor_Project_Public")]
    Public,
    #[serde(rename = "Type_Harbor_Project_Private")]
    Private,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCreateParam {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    #[serde(rename = "type")]
    pub repository_type: RepositoryType,
}

/// Pull of a remote image into a project repository.
///
/// The registry credentials travel base64 encoded; see
/// [`ImageUrlImportParam::with_credentials`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlImportParam {
    /// e.g. `docker.io/nginx:v1.0`.
    pub source_repo: String,
    pub username: String,
    pub password: String,
    /// Comma separated, e.g. `linux/amd64,linux/arm64/v8`.
    pub platforms: String,
}

impl ImageUrlImportParam {
    /// Sets the registry credentials from their plain text.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = BASE64_STANDARD.encode(username);
        self.password = BASE64_STANDARD.encode(password);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageImportApplyParam {
    pub image_name: String,
    pub tag: String,
    /// Archive size in bytes.
    pub size: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageImportConfirmParam {
    pub image_name: String,
    pub tag: String,
    /// Hex MD5 of the uploaded archive.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub md5: String,
}

fn invalid(field: &str, reason: &str) -> EdgeError {
    EdgeError::Parameter(format!("{field} {reason}"))
}

fn require(errors: &mut Vec<EdgeError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(invalid(field, "is required"));
    }
}

fn ipv4(errors: &mut Vec<EdgeError>, field: &str, value: &str) {
    if value.parse::<Ipv4Addr>().is_err() {
        errors.push(invalid(field, &format!("must be an IPv4 address, got '{value}'")));
    }
}

fn cidr(errors: &mut Vec<EdgeError>, field: &str, value: &str) {
    let valid = value.split_once('/').is_some_and(|(addr, prefix)| {
        addr.parse::<Ipv4Addr>().is_ok() && prefix.parse::<u8>().is_ok_and(|bits| bits <= 32)
    });
    if !valid {
        errors.push(invalid(field, &format!("must be an IPv4 CIDR, got '{value}'")));
    }
}

/// `^[a-z][-a-z0-9]*[a-z0-9]$`, 2 to 50 characters.
fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    if !(2..=50).contains(&bytes.len()) {
        return false;
    }
    let first_ok = bytes[0].is_ascii_lowercase();
    let last = bytes[bytes.len() - 1];
    let last_ok = last.is_ascii_lowercase() || last.is_ascii_digit();
    let body_ok = bytes
        .iter()
        .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || *byte == b'-');
    first_ok && last_ok && body_ok
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn valid_cluster() -> ClusterCreateParam {
        ClusterCreateParam {
            name: "edge-1".to_owned(),
            nodes: vec![ClusterCreateNodeParam {
                name: "k8s-node1".to_owned(),
                roles: vec![ClusterNodeRole::Master, ClusterNodeRole::Worker],
                gpu_product: GpuProduct::None,
                management_ipv4_addr: "172.31.13.10".to_owned(),
                business_ipv4_addr: "172.32.4.10".to_owned(),
            }],
            port: 22,
            password: "secret".to_owned(),
            management_vip_v4: "172.31.13.100".to_owned(),
            business_vip_v4: "172.32.4.100".to_owned(),
            data_disk: HashMap::from([("k8s-node1".to_owned(), vec!["/dev/vdb".to_owned()])]),
            pod_cidr_v4: "10.233.64.0/18".to_owned(),
            service_cidr_v4: "10.233.0.0/18".to_owned(),
            dns_server: "223.5.5.5".to_owned(),
            ..ClusterCreateParam::default()
        }
    }

    #[test]
    fn valid_cluster_passes() {
        valid_cluster().validate().expect("must be valid");
    }

    #[test]
    fn single_violation_is_parameter_error() {
        let mut param = valid_cluster();
        param.pod_cidr_v4 = "10.233.64.0/40".to_owned();
        let err = param.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert!(err.to_string().contains("podCidrV4"));
    }

    #[test]
    fn violations_are_aggregated() {
        let mut param = valid_cluster();
        param.name.clear();
        param.dns_server = "dns.local".to_owned();
        param.nodes[0].roles.clear();
        match param.validate().unwrap_err() {
            EdgeError::Aggregate(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[2].to_string().contains("nodes[0].roles"));
            }
            other => panic!("expected aggregate, got {other}"),
        }
    }

    #[test]
    fn cluster_param_wire_names() {
        let mut param = valid_cluster();
        param.enable_ha = true;
        param.istio_enabled = true;
        param.nodes[0].gpu_product = GpuProduct::Ascend;
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(value["enableHA"], json!(true));
        assert_eq!(value["enableIstio"], json!(true));
        assert_eq!(value["managementVipV4"], json!("172.31.13.100"));
        assert_eq!(value["nodes"][0]["managementIPv4Addr"], json!("172.31.13.10"));
        assert_eq!(value["nodes"][0]["roles"], json!(["Master", "Worker"]));
        assert_eq!(value["nodes"][0]["gpuProduct"], json!("Ascend"));
    }

    #[test]
    fn node_add_request_flattens_password() {
        let param = NodeAddParam {
            cluster_id: 5,
            nodes: vec![NodeAddObjParam {
                name: "n2".to_owned(),
                ip: "192.168.30.100".to_owned(),
                port: 22,
                roles: vec![ClusterNodeRole::Gpu],
                ..NodeAddObjParam::default()
            }],
            ..NodeAddParam::default()
        };
        let value = serde_json::to_value(NodeAddRequest {
            param: &param,
            password: "enc".to_owned(),
        })
        .unwrap();
        assert_eq!(value["clusterID"], json!(5));
        assert_eq!(value["password"], json!("enc"));
        assert_eq!(value["containerRuntime"], json!("containerd"));
        assert_eq!(value["nodes"][0]["roles"], json!(["GPU"]));
        assert_eq!(value["nodes"][0]["gpuProduct"], json!(""));
    }

    #[test]
    fn ip_pool_name_rules() {
        assert!(is_dns_label("pool-1"));
        assert!(is_dns_label("ab"));
        assert!(!is_dns_label("a"));
        assert!(!is_dns_label("1pool"));
        assert!(!is_dns_label("pool-"));
        assert!(!is_dns_label("Pool"));
        assert!(!is_dns_label(&"a".repeat(51)));

        let param = ExternalNetworkIpPoolCreateParam {
            name: "Bad_Name".to_owned(),
            ip_pool_type: IpPoolType::Svc,
            start_ip: "10.0.0.10".to_owned(),
            end_ip: String::new(),
        };
        match param.validate().unwrap_err() {
            EdgeError::Aggregate(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected aggregate, got {other}"),
        }
    }

    #[test]
    fn optional_descriptions_are_omitted() {
        let value = serde_json::to_value(CloudProjectUpdateParam {
            uuid: "p-1".to_owned(),
            name: "renamed".to_owned(),
            ..CloudProjectUpdateParam::default()
        })
        .unwrap();
        assert_eq!(value, json!({"uuid": "p-1", "name": "renamed"}));

        let value = serde_json::to_value(ImageImportConfirmParam {
            image_name: "nginx".to_owned(),
            tag: "v1".to_owned(),
            md5: String::new(),
        })
        .unwrap();
        assert_eq!(value, json!({"imageName": "nginx", "tag": "v1"}));
    }

    #[test]
    fn repository_type_uses_harbor_names() {
        let value = serde_json::to_value(RepositoryCreateParam {
            name: "dev".to_owned(),
            description: String::new(),
            repository_type: RepositoryType::Private,
        })
        .unwrap();
        assert_eq!(value, json!({"name": "dev", "type": "Type_Harbor_Project_Private"}));
    }

    #[test]
    fn url_import_credentials_are_base64() {
        let param = ImageUrlImportParam {
            source_repo: "docker.io/nginx:v1.0".to_owned(),
            platforms: "linux/amd64".to_owned(),
            ..ImageUrlImportParam::default()
        }
        .with_credentials("admin", "password");
        assert_eq!(param.username, "YWRtaW4=");
        assert_eq!(param.password, "cGFzc3dvcmQ=");
    }
}
