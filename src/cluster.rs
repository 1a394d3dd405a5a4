use crate::{
    crypto::encrypt_by_access_key,
    envelope::KEY_CONTENT,
    types::CLUSTER_STATUS_CREATE_FAILED,
    ClusterConfigView, ClusterCreateParam, ClusterDetailsView, ClusterOperationView, ClusterView,
    Dispatched, EdgeClient, EdgeError, Mode, Page, QueryParams, Request, Result,
};

pub(crate) const CLUSTER_RESOURCE: &str = "/open-api/v1/cluster";

impl EdgeClient {
    pub async fn page_clusters(&self, query: QueryParams) -> Result<Page<ClusterView>> {
        self.page(Request::get(CLUSTER_RESOURCE).with_query(query), KEY_CONTENT)
            .await
    }

    pub async fn get_cluster(&self, cluster_id: i64) -> Result<ClusterView> {
        self.get(Request::get(CLUSTER_RESOURCE).with_id(cluster_id), &[KEY_CONTENT])
            .await
    }

    pub async fn cluster_details(&self, cluster_id: i64) -> Result<ClusterDetailsView> {
        self.get(Request::get(CLUSTER_RESOURCE).with_id(cluster_id), &[KEY_CONTENT])
            .await
    }

    /// Creates a cluster after validating `param`.
    ///
    /// The SSH password is encrypted with the access key secret before it
    /// leaves the client. Waits under the cluster retry budget.
    pub async fn create_cluster(&self, param: &ClusterCreateParam, mode: Mode) -> Result<Dispatched> {
        param.validate()?;
        let mut wire = param.clone();
        wire.password = encrypt_by_access_key(&self.options().access_key_secret, &param.password)?;
        let request = Request::post(CLUSTER_RESOURCE).json(&wire)?;
        self.dispatch(request, mode, self.options().retry.cluster).await
    }

    pub async fn delete_cluster(&self, cluster_id: i64, mode: Mode) -> Result<Dispatched> {
        let request = Request::delete(CLUSTER_RESOURCE).with_id(cluster_id);
        self.dispatch(request, mode, self.options().retry.cluster).await
    }

    /// Reinstalls a cluster, typically one whose creation failed.
    pub async fn recreate_cluster(&self, cluster_id: i64, mode: Mode) -> Result<Dispatched> {
        let request = Request::post(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("recreate");
        self.dispatch(request, mode, self.options().retry.cluster).await
    }

    pub async fn cluster_kubeconfig(&self, cluster_id: i64) -> Result<ClusterConfigView> {
        let request = Request::get(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("kubeconfig");
        self.get(request, &[KEY_CONTENT]).await
    }

    /// Full text of one operation log entry.
    pub async fn cluster_operation_log(&self, cluster_id: i64, log_id: i64) -> Result<String> {
        let request = Request::get(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec(format!("log/{log_id}"));
        self.get(request, &[KEY_CONTENT]).await
    }

    pub async fn page_cluster_operations(
        &self,
        cluster_id: i64,
        query: QueryParams,
    ) -> Result<Page<ClusterOperationView>> {
        let request = Request::get(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("operation/list")
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    pub async fn has_iluvatar_license(&self, cluster_id: i64) -> Result<bool> {
        let request = Request::get(CLUSTER_RESOURCE)
            .with_id(cluster_id)
            .with_spec("has-iluvatar-license");
        self.get(request, &[KEY_CONTENT]).await
    }

    /// Looks a cluster up by its exact name.
    pub async fn find_cluster_by_name(&self, name: &str) -> Result<Option<ClusterView>> {
        let page = self
            .page_clusters(QueryParams::new().add_q(format!("name={name}")))
            .await?;
        Ok(page.items.into_iter().find(|cluster| cluster.name == name))
    }

    /// Makes sure a cluster named `param.name` exists and returns it.
    ///
    /// A cluster left in [`CLUSTER_STATUS_CREATE_FAILED`] is recreated, a
    /// missing one is created. Both wait for the action to finish.
    pub async fn ensure_cluster(&self, param: &ClusterCreateParam) -> Result<ClusterView> {
        match self.find_cluster_by_name(&param.name).await? {
            Some(existing) if existing.status == CLUSTER_STATUS_CREATE_FAILED => {
                #[cfg(feature = "tracing")]
                tracing::info!(cluster_id = existing.id, name = %existing.name, "recreating failed cluster");
                self.recreate_cluster(existing.id, Mode::Sync).await?;
            }
            Some(existing) => return Ok(existing),
            None => {
                self.create_cluster(param, Mode::Sync).await?;
            }
        }

        self.find_cluster_by_name(&param.name)
            .await?
            .ok_or_else(|| EdgeError::NotFound(format!("cluster '{}' after create", param.name)))
    }
}
