use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use percent_encoding::percent_decode_str;

use reqwest::{header, Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    envelope::{KEY_CONTENT, KEY_RESULT},
    poll::{poll_until_done, PollState, RESULT_RESOURCE},
    ActionStatus, ClientOptions, Dispatched, EdgeError, Envelope, Mode, Page, Request, Result,
    RetryBudget, Signer,
};

#[derive(Clone)]
/// HTTP client for the ZStack Edge open API.
///
/// Cloning is cheap and shares the connection pool. The client holds no
/// mutable state; retry budgets are chosen per call.
pub struct EdgeClient {
    http: reqwest::Client,
    signer: Signer,
    base_url: String,
    options: ClientOptions,
}

impl fmt::Debug for EdgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

impl EdgeClient {
    /// Creates a client from explicit options.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure_skip_verify)
            .build()
            .map_err(|err| EdgeError::transport("build http client", err))?;
        let signer = Signer::new(
            options.access_key_id.clone(),
            options.access_key_secret.clone(),
            options.context_path.clone(),
        );
        Ok(Self {
            http,
            signer,
            base_url: options.base_url(),
            options,
        })
    }

    /// Creates a client from `ZSTACK_*` environment variables.
    ///
    /// See [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Fetches a resource and binds the value at `path`.
    pub async fn get<T: DeserializeOwned>(&self, request: Request, path: &[&str]) -> Result<T> {
        let (_, envelope) = self.execute(&request).await?;
        envelope.bind(path)
    }

    /// Fetches a collection nested under `key`.
    ///
    /// When the request asks for `replyWithCount`, the items are read from
    /// `{key}.result`.
    pub async fn list<T: DeserializeOwned>(&self, request: Request, key: &str) -> Result<Vec<T>> {
        let (_, envelope) = self.execute(&request).await?;
        let items: Option<Vec<T>> = if request.has_query("replyWithCount", "true") {
            envelope.bind(&[key, KEY_RESULT])?
        } else {
            envelope.bind(&[key])?
        };
        Ok(items.unwrap_or_default())
    }

    /// Fetches one page of a collection together with the total match count.
    pub async fn page<T: DeserializeOwned>(&self, mut request: Request, key: &str) -> Result<Page<T>> {
        request.set_query("replyWithCount", "true");
        let (_, envelope) = self.execute(&request).await?;
        let total = envelope.total_count(key)?;
        let items: Option<Vec<T>> = envelope.bind(&[key, KEY_RESULT])?;
        Ok(Page {
            items: items.unwrap_or_default(),
            total,
        })
    }

    /// Sends a mutating request.
    ///
    /// If the backend defers the work it answers with an action ID. In
    /// [`Mode::Async`] that ID is returned right away as
    /// [`Dispatched::Accepted`]; in [`Mode::Sync`] the action is polled under
    /// `budget` and its final result is returned. Responses without an action
    /// ID completed synchronously and are returned as they are, in both modes.
    pub async fn dispatch(
        &self,
        request: Request,
        mode: Mode,
        budget: RetryBudget,
    ) -> Result<Dispatched> {
        let (url, envelope) = self.execute(&request).await?;
        if mode == Mode::Async {
            if let Some(action_id) = envelope.action_id() {
                return Ok(Dispatched::Accepted {
                    action_id: action_id.to_owned(),
                });
            }
        }
        let (action_id, envelope) = self.settle(&request, &url, envelope, budget).await?;
        Ok(Dispatched::Completed {
            action_id,
            envelope,
        })
    }

    /// Sends a mutating request and waits for its outcome under the default
    /// retry budget.
    pub async fn submit(&self, request: Request) -> Result<Envelope> {
        let (url, envelope) = self.execute(&request).await?;
        let (_, envelope) = self
            .settle(&request, &url, envelope, self.options.retry.default)
            .await?;
        Ok(envelope)
    }

    /// Looks up a deferred action once, e.g. one returned by [`Mode::Async`].
    pub async fn get_action_result(&self, action_id: &str) -> Result<ActionStatus> {
        if action_id.trim().is_empty() {
            return Err(EdgeError::Parameter("action id must not be empty".to_owned()));
        }
        let request = Request::get(RESULT_RESOURCE).with_id(action_id);
        let url = request.url(&self.base_url)?;
        let context = format!("{} {url}", request.method);
        match self.poll_once(&request, &url, &context).await {
            PollState::Running(_) => Ok(ActionStatus::Running),
            PollState::Succeeded(envelope) => {
                let content: Option<serde_json::Value> = envelope.bind(&[KEY_CONTENT])?;
                Ok(ActionStatus::Done(content.unwrap_or_default()))
            }
            PollState::Failed(err) => Err(err),
        }
    }

    /// Waits for the action named in `envelope`, if any.
    async fn settle(
        &self,
        request: &Request,
        url: &Url,
        envelope: Envelope,
        budget: RetryBudget,
    ) -> Result<(Option<String>, Envelope)> {
        let Some(action_id) = envelope.action_id().map(str::to_owned) else {
            return Ok((None, envelope));
        };
        let result = self
            .wait_for_action(&action_id, budget)
            .await
            .map_err(|source| EdgeError::Wait {
                operation: request.describe(url),
                action_id: action_id.clone(),
                source: Box::new(source),
            })?;
        Ok((Some(action_id), result))
    }

    async fn wait_for_action(&self, action_id: &str, budget: RetryBudget) -> Result<Envelope> {
        let request = Request::get(RESULT_RESOURCE).with_id(action_id);
        let url = request.url(&self.base_url)?;
        let context = format!("wait location {url}");

        let (request, url, context) = (&request, &url, context.as_str());
        poll_until_done(action_id, budget, move || async move {
            self.poll_once(request, url, context).await
        })
        .await
    }

    async fn poll_once(&self, request: &Request, url: &Url, context: &str) -> PollState {
        match self.send_once(request, url).await {
            Ok((status, body)) => PollState::from_response(status.as_u16(), &body, context),
            Err(EdgeError::Transport { source, .. }) => {
                PollState::Failed(EdgeError::transport(context, source))
            }
            Err(err) => PollState::Failed(err),
        }
    }

    /// Sends a request and parses the envelope of a successful answer.
    async fn execute(&self, request: &Request) -> Result<(Url, Envelope)> {
        let url = request.url(&self.base_url)?;
        let (status, body) = self.send(request, &url).await?;
        if !status.is_success() {
            return Err(EdgeError::http(
                request.describe(&url),
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }
        let envelope = Envelope::parse(&body)?;
        Ok((url, envelope))
    }

    /// Sends a request, re-issuing GETs that stall waiting for response
    /// headers until the header retry window closes.
    async fn send(&self, request: &Request, url: &Url) -> Result<(StatusCode, Vec<u8>)> {
        let started = Instant::now();
        loop {
            match self.send_once(request, url).await {
                Err(err)
                    if request.method == Method::GET
                        && is_header_stall(&err)
                        && started.elapsed() < self.options.header_retry_window =>
                {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        url = %url,
                        pause_ms = self.options.header_retry_pause.as_millis() as u64,
                        "request stalled awaiting headers, retrying"
                    );
                    tokio::time::sleep(self.options.header_retry_pause).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(&self, request: &Request, url: &Url) -> Result<(StatusCode, Vec<u8>)> {
        let context = format!("{} {url}", request.method);

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let builder = self
            .signer
            .apply(builder, &request.method, &signing_path(url))?;

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(method = %request.method, url = %url, "sending request");
            if self.options.debug {
                if let Some(body) = &request.body {
                    tracing::debug!(body = %body, "request body");
                }
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|err| EdgeError::transport(&context, err))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| EdgeError::transport(&context, err))?;

        #[cfg(feature = "tracing")]
        if self.options.debug {
            tracing::debug!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "response body"
            );
        }

        Ok((status, body.to_vec()))
    }
}

/// The decoded URL path; the backend verifies signatures over unescaped paths.
fn signing_path(url: &Url) -> Cow<'_, str> {
    percent_decode_str(url.path()).decode_utf8_lossy()
}

fn is_header_stall(err: &EdgeError) -> bool {
    matches!(err, EdgeError::Transport { source, .. } if source.is_timeout())
}

#[cfg(test)]
mod tests {
    use super::signing_path;
    use crate::{ClientOptions, EdgeClient, EdgeError, Request};

    #[test]
    fn debug_redacts_secret() {
        let client = EdgeClient::new(
            ClientOptions::for_host("edge.local").with_access_key("ak", "secret-key"),
        )
        .expect("must build client");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("http://edge.local:80/ze"));
    }

    #[tokio::test]
    async fn empty_action_id_is_rejected() {
        let client = EdgeClient::new(ClientOptions::for_host("edge.local")).unwrap();
        let err = client.get_action_result(" ").await.unwrap_err();
        assert!(matches!(err, EdgeError::Parameter(_)));
    }

    #[test]
    fn signing_path_is_unescaped() {
        let url = Request::get("/open-api/v1/external-network")
            .with_id(5)
            .with_spec("net 1/availableIps")
            .url("http://edge.local:80/ze")
            .unwrap();
        assert_eq!(url.path(), "/ze/open-api/v1/external-network/5/net%201/availableIps");
        assert_eq!(
            signing_path(&url),
            "/ze/open-api/v1/external-network/5/net 1/availableIps"
        );
    }

    #[test]
    fn plain_path_is_signed_as_is() {
        let url = Request::get("/open-api/v1/cluster")
            .url("http://edge.local:80/ze")
            .unwrap();
        assert!(matches!(signing_path(&url), std::borrow::Cow::Borrowed(_)));
    }
}
