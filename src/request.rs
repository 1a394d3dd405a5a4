use reqwest::{Method, Url};
use serde::Serialize;

use crate::{EdgeError, QueryParams, Result};

/// One call against the edge API.
///
/// The URL is `{base}{resource}[/{resource_id}[/{spec}]]?{query}`; `spec` is
/// only appended when a resource ID is present.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) resource: String,
    pub(crate) resource_id: Option<String>,
    pub(crate) spec: Option<String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into(),
            resource_id: None,
            spec: None,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(Method::GET, resource)
    }

    pub fn post(resource: impl Into<String>) -> Self {
        Self::new(Method::POST, resource)
    }

    pub fn put(resource: impl Into<String>) -> Self {
        Self::new(Method::PUT, resource)
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(Method::DELETE, resource)
    }

    pub fn with_id(mut self, resource_id: impl ToString) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    /// Sub-action segment(s) after the resource ID, e.g. `recreate` or `log/3`.
    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    pub fn with_query(mut self, params: QueryParams) -> Self {
        self.query.extend(params.into_pairs());
        self
    }

    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| EdgeError::Decode(format!("cannot serialize request body: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn has_query(&self, key: &str, value: &str) -> bool {
        self.query.iter().any(|(k, v)| k == key && v == value)
    }

    pub(crate) fn set_query(&mut self, key: &str, value: &str) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_owned(), value.to_owned()));
    }

    /// Resolves the full URL against `base_url` (`{protocol}://{host}:{port}{context}`).
    pub fn url(&self, base_url: &str) -> Result<Url> {
        let raw = format!("{base_url}{}", self.resource);
        let mut url = Url::parse(&raw)
            .map_err(|err| EdgeError::Parameter(format!("invalid request url '{raw}': {err}")))?;

        if let Some(resource_id) = self.resource_id.as_deref().filter(|id| !id.is_empty()) {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| EdgeError::Parameter(format!("url '{raw}' cannot carry a path")))?;
            segments.pop_if_empty().push(resource_id);
            if let Some(spec) = self.spec.as_deref() {
                segments.extend(spec.split('/').filter(|segment| !segment.is_empty()));
            }
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// `METHOD URL [BODY]`, used as error context.
    pub(crate) fn describe(&self, url: &Url) -> String {
        match &self.body {
            Some(body) => format!("{} {url} {body}", self.method),
            None => format!("{} {url}", self.method),
        }
    }
}

/// Rejects an empty path segment, which would otherwise address the whole
/// collection.
pub(crate) fn require_segment(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EdgeError::Parameter(format!("{field} must not be empty")));
    }
    Ok(())
}
