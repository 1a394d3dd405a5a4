use crate::{envelope::KEY_CONTENT, EdgeClient, Request, Result, UserProjectSimpleView};

impl EdgeClient {
    /// Issues a session token for the configured access key.
    pub async fn token(&self) -> Result<String> {
        self.get(Request::get("/open-api/token"), &[KEY_CONTENT])
            .await
    }

    /// Projects the access key's user is authorized for.
    pub async fn list_authorized_projects(&self) -> Result<Vec<UserProjectSimpleView>> {
        self.list(Request::get("/open-api/v1/authorized-project"), KEY_CONTENT)
            .await
    }
}
