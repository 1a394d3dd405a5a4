use crate::{
    cluster::CLUSTER_RESOURCE, crypto::encrypt_by_access_key, envelope::KEY_CONTENT,
    params::NodeAddRequest, DiskInfoView, Dispatched, EdgeClient, EdgeError, Mode, NodeAddParam,
    NodeView, Page, QueryParams, Request, Result,
};

const NODE_DISK_RESOURCE: &str = "/open-api/v1/cluster/node-disk";

impl EdgeClient {
    pub async fn page_nodes(&self, cluster_id: i64, query: QueryParams) -> Result<Page<NodeView>> {
        let request = Request::get(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("node")
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    /// Joins nodes to a cluster. `password` is the SSH password of the new
    /// nodes and is sent encrypted.
    pub async fn add_nodes(
        &self,
        cluster_id: i64,
        param: &NodeAddParam,
        password: &str,
        mode: Mode,
    ) -> Result<Dispatched> {
        let body = NodeAddRequest {
            param,
            password: encrypt_by_access_key(&self.options().access_key_secret, password)?,
        };
        let request = Request::post(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("node")
            .json(&body)?;
        self.dispatch(request, mode, self.options().retry.node).await
    }

    pub async fn delete_nodes<S: AsRef<str>>(
        &self,
        cluster_id: i64,
        names: &[S],
        mode: Mode,
    ) -> Result<Dispatched> {
        if names.is_empty() {
            return Err(EdgeError::Parameter("node names must not be empty".to_owned()));
        }
        let names = names
            .iter()
            .map(|name| name.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        let request = Request::delete(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("node")
            .query_pair("nodenames", names);
        self.dispatch(request, mode, self.options().retry.node).await
    }

    /// Lists the non-system disks of a host reachable over SSH.
    pub async fn node_disks(
        &self,
        ssh_ip: &str,
        ssh_port: u16,
        ssh_password: &str,
    ) -> Result<Vec<DiskInfoView>> {
        let password = encrypt_by_access_key(&self.options().access_key_secret, ssh_password)?;
        let request = Request::get(NODE_DISK_RESOURCE)
            .query_pair("sshIP", ssh_ip)
            .query_pair("sshPort", ssh_port.to_string())
            .query_pair("sshPassword", password);
        let disks: Option<Vec<DiskInfoView>> = self.get(request, &[KEY_CONTENT]).await?;
        Ok(disks.unwrap_or_default())
    }
}
