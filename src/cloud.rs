use crate::{
    envelope::KEY_CONTENT, request::require_segment, CloudProjectCreateParam,
    CloudProjectUpdateParam, CloudProjectUserAddParam, CloudResourceQuotaView,
    CloudUserCreateParam, ClusterSimpleItem, EdgeClient, EdgeError, ProjectQuotaParam,
    ProjectView, Request, Result, UserView,
};

const CLOUD_CLUSTERS_RESOURCE: &str = "/open-api/v1/cloud/clusters";
const CLOUD_PROJECTS_RESOURCE: &str = "/open-api/v1/cloud/projects";
const CLOUD_PROJECT_USERS_RESOURCE: &str = "/open-api/v1/cloud/projects/users";
const CLOUD_USERS_RESOURCE: &str = "/open-api/v1/cloud/users";

/// Administration of projects, users and quotas across the platform.
impl EdgeClient {
    pub async fn list_simple_clusters(&self) -> Result<Vec<ClusterSimpleItem>> {
        self.list(Request::get(CLOUD_CLUSTERS_RESOURCE), KEY_CONTENT)
            .await
    }

    pub async fn create_project(&self, param: &CloudProjectCreateParam) -> Result<ProjectView> {
        let request = Request::post(CLOUD_PROJECTS_RESOURCE).json(param)?;
        self.submit(request).await?.bind(&[KEY_CONTENT])
    }

    /// Renames or re-describes the project named by `param.uuid`.
    pub async fn update_project(&self, param: &CloudProjectUpdateParam) -> Result<ProjectView> {
        require_segment("project uuid", &param.uuid)?;
        let request = Request::put(CLOUD_PROJECTS_RESOURCE).json(param)?;
        self.submit(request).await?.bind(&[KEY_CONTENT])
    }

    pub async fn delete_project(&self, uuid: &str) -> Result<()> {
        require_segment("project uuid", uuid)?;
        self.submit(Request::delete(CLOUD_PROJECTS_RESOURCE).with_id(uuid))
            .await?;
        Ok(())
    }

    pub async fn add_project_users(&self, param: &CloudProjectUserAddParam) -> Result<()> {
        let request = Request::post(CLOUD_PROJECT_USERS_RESOURCE).json(param)?;
        self.submit(request).await?;
        Ok(())
    }

    /// Revokes every listed user's access to every listed project.
    pub async fn remove_project_users<P, U>(&self, project_uuids: &[P], usernames: &[U]) -> Result<()>
    where
        P: AsRef<str>,
        U: AsRef<str>,
    {
        if project_uuids.is_empty() || usernames.is_empty() {
            return Err(EdgeError::Parameter(
                "project uuids and usernames must not be empty".to_owned(),
            ));
        }
        let request = Request::delete(CLOUD_PROJECT_USERS_RESOURCE)
            .query_pair("projectUuids", join(project_uuids))
            .query_pair("usernames", join(usernames));
        self.submit(request).await?;
        Ok(())
    }

    /// Quota and usage of a project on one cluster, per resource type.
    pub async fn project_quota(
        &self,
        project_uuid: &str,
        cluster_id: i64,
    ) -> Result<Vec<CloudResourceQuotaView>> {
        require_segment("project uuid", project_uuid)?;
        let request = quota_request(Request::get(CLOUD_PROJECTS_RESOURCE), project_uuid, cluster_id);
        self.list(request, KEY_CONTENT).await
    }

    pub async fn update_project_quota(
        &self,
        project_uuid: &str,
        cluster_id: i64,
        param: &ProjectQuotaParam,
    ) -> Result<Vec<CloudResourceQuotaView>> {
        require_segment("project uuid", project_uuid)?;
        let request = quota_request(Request::put(CLOUD_PROJECTS_RESOURCE), project_uuid, cluster_id)
            .json(param)?;
        let quotas: Option<Vec<CloudResourceQuotaView>> =
            self.submit(request).await?.bind(&[KEY_CONTENT])?;
        Ok(quotas.unwrap_or_default())
    }

    /// Creates a platform user. The returned view carries the initial
    /// password.
    pub async fn create_user(&self, param: &CloudUserCreateParam) -> Result<UserView> {
        let request = Request::post(CLOUD_USERS_RESOURCE).json(param)?;
        self.submit(request).await?.bind(&[KEY_CONTENT])
    }

    pub async fn delete_user(&self, name: &str) -> Result<()> {
        require_segment("user name", name)?;
        self.submit(Request::delete(CLOUD_USERS_RESOURCE).with_id(name))
            .await?;
        Ok(())
    }

    pub async fn set_administrator(&self, name: &str) -> Result<()> {
        self.change_admin(name, "setadmin").await
    }

    pub async fn unset_administrator(&self, name: &str) -> Result<()> {
        self.change_admin(name, "unsetadmin").await
    }

    async fn change_admin(&self, name: &str, action: &str) -> Result<()> {
        require_segment("user name", name)?;
        let request = Request::put(CLOUD_USERS_RESOURCE)
            .with_id(name)
            .with_spec(action);
        self.submit(request).await?;
        Ok(())
    }
}

fn quota_request(request: Request, project_uuid: &str, cluster_id: i64) -> Request {
    request
        .with_id(project_uuid)
        .with_spec(format!("clusters/{cluster_id}/quota"))
}

fn join<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|value| value.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}
