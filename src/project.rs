use crate::{
    envelope::KEY_CONTENT, request::require_segment, ClusterSpinnerView, ContainerPackageParam,
    EdgeClient, ImageImportApplyParam, ImageImportApplyView, ImageImportConfirmParam,
    ImageTagView, ImageUrlImportParam, ImageView, NamespaceView, Page, ProductInfoView,
    QueryParams, RepositoryCreateParam, RepositoryView, Request, Result,
};

const PRODUCT_INFO_RESOURCE: &str = "/open-api/v1/product-info";
const PROJECT_RESOURCE: &str = "/open-api/v1/project";

impl EdgeClient {
    pub async fn product_info(&self) -> Result<ProductInfoView> {
        self.get(Request::get(PRODUCT_INFO_RESOURCE), &[KEY_CONTENT])
            .await
    }

    /// Clusters a project is deployed on.
    pub async fn list_project_clusters(&self, project_id: i64) -> Result<Vec<ClusterSpinnerView>> {
        let request = Request::get(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec("cluster");
        self.list(request, KEY_CONTENT).await
    }

    pub async fn list_project_namespaces(
        &self,
        project_id: i64,
        cluster_id: i64,
    ) -> Result<Vec<NamespaceView>> {
        let request = Request::get(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec(format!("cluster/{cluster_id}/namespace"));
        self.list(request, KEY_CONTENT).await
    }

    /// Commits a running container and pushes it to a project repository.
    pub async fn save_container_as_image(
        &self,
        project_id: i64,
        cluster_id: i64,
        namespace: &str,
        pod: &str,
        container: &str,
        param: &ContainerPackageParam,
    ) -> Result<()> {
        require_segment("namespace", namespace)?;
        require_segment("pod", pod)?;
        require_segment("container", container)?;
        let request = Request::post(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec(format!(
                "cluster/{cluster_id}/namespace/{namespace}/pod/{pod}/container/{container}/package"
            ))
            .json(param)?;
        self.submit(request).await?;
        Ok(())
    }

    pub async fn page_project_repositories(
        &self,
        project_id: i64,
        query: QueryParams,
    ) -> Result<Page<RepositoryView>> {
        let request = Request::get(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec("repository")
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    pub async fn create_project_repository(
        &self,
        project_id: i64,
        param: &RepositoryCreateParam,
    ) -> Result<RepositoryView> {
        require_segment("repository name", &param.name)?;
        let request = Request::post(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec("repository")
            .json(param)?;
        self.submit(request).await?.bind(&[KEY_CONTENT])
    }

    pub async fn page_repository_images(
        &self,
        project_id: i64,
        repository_id: i64,
        query: QueryParams,
    ) -> Result<Page<ImageView>> {
        let request = Request::get(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec(format!("repository/{repository_id}/image"))
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    pub async fn page_repository_image_tags(
        &self,
        project_id: i64,
        repository_id: i64,
        image_name: &str,
        query: QueryParams,
    ) -> Result<Page<ImageTagView>> {
        require_segment("image name", image_name)?;
        let request = Request::get(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec(format!("repository/{repository_id}/image/{image_name}/tag"))
            .with_query(query);
        self.page(request, KEY_CONTENT).await
    }

    /// Pulls a remote image into the named repository.
    pub async fn import_image_by_url(
        &self,
        project_id: i64,
        repository: &str,
        param: &ImageUrlImportParam,
    ) -> Result<()> {
        require_segment("repository name", repository)?;
        let request = Request::post(PROJECT_RESOURCE)
            .with_id(project_id)
            .with_spec(format!("repository/{repository}/image/url-import"))
            .json(param)?;
        self.submit(request).await?;
        Ok(())
    }

    /// Reserves an upload slot for an image archive. Upload the archive to
    /// the returned URL, then call [`EdgeClient::confirm_image_import`].
    pub async fn apply_image_import(
        &self,
        project_id: i64,
        repository: &str,
        file_name: &str,
        param: &ImageImportApplyParam,
    ) -> Result<ImageImportApplyView> {
        let request = image_import_request(project_id, repository, file_name, "apply-before-import")?
            .json(param)?;
        self.submit(request).await?.bind(&[KEY_CONTENT])
    }

    pub async fn confirm_image_import(
        &self,
        project_id: i64,
        repository: &str,
        file_name: &str,
        param: &ImageImportConfirmParam,
    ) -> Result<()> {
        let request = image_import_request(project_id, repository, file_name, "confirm-after-import")?
            .json(param)?;
        self.submit(request).await?;
        Ok(())
    }
}

fn image_import_request(
    project_id: i64,
    repository: &str,
    file_name: &str,
    step: &str,
) -> Result<Request> {
    require_segment("repository name", repository)?;
    require_segment("image file name", file_name)?;
    Ok(Request::post(PROJECT_RESOURCE)
        .with_id(project_id)
        .with_spec(format!("repository/{repository}/image/{file_name}/{step}")))
}
