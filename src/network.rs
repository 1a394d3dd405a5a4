use crate::{
    envelope::KEY_CONTENT, Dispatched, EdgeClient, ExternalNetworkCreateParam,
    ExternalNetworkIpPoolCreateParam, ExternalNetworkIpPoolView, ExternalNetworkView, Mode,
    NodeIfaceAllResult, Page, QueryParams, Request, Result,
};

const EXTERNAL_NETWORK_RESOURCE: &str = "/open-api/v1/external-network";

impl EdgeClient {
    pub async fn create_external_network(
        &self,
        param: &ExternalNetworkCreateParam,
        mode: Mode,
    ) -> Result<Dispatched> {
        let request = Request::post(EXTERNAL_NETWORK_RESOURCE)
            .with_id(param.cluster_id)
            .json(param)?;
        self.dispatch(request, mode, self.options().retry.default).await
    }

    pub async fn page_external_networks(
        &self,
        cluster_id: i64,
        query: QueryParams,
    ) -> Result<Page<ExternalNetworkView>> {
        let request = Request::get(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    /// Interfaces that can carry an external network. `refresh` asks the
    /// backend to rescan the nodes.
    pub async fn external_network_candidate_interfaces(
        &self,
        cluster_id: i64,
        refresh: bool,
    ) -> Result<NodeIfaceAllResult> {
        let request = Request::get(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_spec("candidate-interface")
            .query_pair("refresh", refresh.to_string());
        self.get(request, &[KEY_CONTENT]).await
    }

    pub async fn page_external_network_ip_pools(
        &self,
        cluster_id: i64,
        network_id: i64,
        query: QueryParams,
    ) -> Result<Page<ExternalNetworkIpPoolView>> {
        let request = Request::get(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_spec(network_id.to_string())
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    pub async fn create_external_network_ip_pool(
        &self,
        cluster_id: i64,
        network_id: i64,
        param: &ExternalNetworkIpPoolCreateParam,
    ) -> Result<()> {
        param.validate()?;
        let request = Request::post(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_spec(network_id.to_string())
            .json(param)?;
        self.submit(request).await?;
        Ok(())
    }

    pub async fn external_network_available_ips(
        &self,
        cluster_id: i64,
        network_name: &str,
    ) -> Result<Vec<String>> {
        let request = Request::get(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_spec(format!("{network_name}/availableIps"));
        let ips: Option<Vec<String>> = self.get(request, &[KEY_CONTENT]).await?;
        Ok(ips.unwrap_or_default())
    }

    /// External networks a project may use for services.
    pub async fn page_service_external_networks(
        &self,
        cluster_id: i64,
        project_id: i64,
        query: QueryParams,
    ) -> Result<Page<ExternalNetworkView>> {
        let request = Request::get(EXTERNAL_NETWORK_RESOURCE)
            .with_id(cluster_id)
            .with_spec(format!("{project_id}/forSvc"))
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }
}
