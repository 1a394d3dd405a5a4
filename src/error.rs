use std::fmt;
use std::str::FromStr;

/// Error classes reported by the edge API and this client.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Server,
    Client,
    Unclassified,
    Dns,
    Eof,
    Network,
    ConnectRefused,
    ConnectReset,
    Timeout,
    NotFound,
    DuplicateId,
    NotSupported,
    AccountReadOnly,
    InvalidAccessKeyId,
    InvalidAccessKeySecret,
    InvalidAdminPermission,
    InvalidAdminPassword,
    Aggregate,
    Parameter,
    /// The polled action has not finished yet. Only used as a retry signal
    /// inside the poller.
    JobRunning,
}

impl ErrorKind {
    /// Wire name of the kind, as used in the `code` field of error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "ServerError",
            Self::Client => "ClientError",
            Self::Unclassified => "UnclassifiedError",
            Self::Dns => "DNSError",
            Self::Eof => "EOFError",
            Self::Network => "NetworkError",
            Self::ConnectRefused => "ConnectRefusedError",
            Self::ConnectReset => "ConnectResetError",
            Self::Timeout => "TimeoutError",
            Self::NotFound => "NotFoundError",
            Self::DuplicateId => "DuplicateIdError",
            Self::NotSupported => "NotSupportedError",
            Self::AccountReadOnly => "AccountReadOnlyError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyID",
            Self::InvalidAccessKeySecret => "InvalidAccessKeySecret",
            Self::InvalidAdminPermission => "InvalidAdminPermission",
            Self::InvalidAdminPassword => "InvalidAdminPassword",
            Self::Aggregate => "AggregateError",
            Self::Parameter => "ParameterError",
            Self::JobRunning => "JobRunningError",
        }
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            409 => Self::DuplicateId,
            501 => Self::NotSupported,
            400..=499 => Self::Client,
            500..=599 => Self::Server,
            _ => Self::Unclassified,
        }
    }

    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_connect() {
            let text = error_chain_text(err);
            return if text.contains("dns error") || text.contains("failed to lookup address") {
                Self::Dns
            } else if text.contains("connection refused") {
                Self::ConnectRefused
            } else if text.contains("connection reset") {
                Self::ConnectReset
            } else {
                Self::Network
            };
        }
        let text = error_chain_text(err);
        if text.contains("connection reset") {
            Self::ConnectReset
        } else if text.contains("unexpected eof") || text.contains("incomplete message") {
            Self::Eof
        } else if err.is_request() || err.is_body() {
            Self::Network
        } else {
            Self::Unclassified
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [ErrorKind; 20] = [
            ErrorKind::Server,
            ErrorKind::Client,
            ErrorKind::Unclassified,
            ErrorKind::Dns,
            ErrorKind::Eof,
            ErrorKind::Network,
            ErrorKind::ConnectRefused,
            ErrorKind::ConnectReset,
            ErrorKind::Timeout,
            ErrorKind::NotFound,
            ErrorKind::DuplicateId,
            ErrorKind::NotSupported,
            ErrorKind::AccountReadOnly,
            ErrorKind::InvalidAccessKeyId,
            ErrorKind::InvalidAccessKeySecret,
            ErrorKind::InvalidAdminPermission,
            ErrorKind::InvalidAdminPassword,
            ErrorKind::Aggregate,
            ErrorKind::Parameter,
            ErrorKind::JobRunning,
        ];
        ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Network or request execution error from `reqwest`.
    #[error("{context}: transport error: {source}")]
    Transport {
        /// `METHOD URL` of the failed call.
        context: String,
        source: reqwest::Error,
    },
    /// Non-success HTTP status code with raw response body.
    #[error("{context}: http error {status}: {body}")]
    Http {
        context: String,
        status: u16,
        body: String,
        /// Classification derived from the body `code` or the status.
        kind: ErrorKind,
    },
    /// A key path requested from the response envelope is absent.
    #[error("key not found in response: {path}")]
    KeyNotFound { path: String },
    /// Response decoding or shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
    /// The polled action is still running.
    #[error("status code {status}: job still running")]
    JobRunning { status: u16 },
    /// The retry budget ran out while the action was still running.
    #[error("action {action_id} still running after {polls} polls: {last}")]
    PollExhausted {
        action_id: String,
        polls: u32,
        last: Box<EdgeError>,
    },
    /// Failure while waiting for a deferred action of an outer operation.
    #[error("wait for action {action_id} of {operation}: {source}")]
    Wait {
        /// `METHOD URL BODY` of the operation that started the action.
        operation: String,
        action_id: String,
        source: Box<EdgeError>,
    },
    /// A looked-up entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Invalid caller input or configuration.
    #[error("invalid parameter: {0}")]
    Parameter(String),
    /// Several independent errors, e.g. every violated parameter rule.
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<EdgeError>),
    /// Credential encryption failure.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl EdgeError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { source, .. } => ErrorKind::from_transport(source),
            Self::Http { kind, .. } => *kind,
            Self::KeyNotFound { .. } | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Decode(_) | Self::Crypto(_) => ErrorKind::Unclassified,
            Self::JobRunning { .. } => ErrorKind::JobRunning,
            Self::PollExhausted { .. } => ErrorKind::Timeout,
            Self::Wait { source, .. } => source.kind(),
            Self::Parameter(_) => ErrorKind::Parameter,
            Self::Aggregate(_) => ErrorKind::Aggregate,
        }
    }

    /// Returns `true` if the poller should keep waiting on this error.
    pub fn is_job_running(&self) -> bool {
        matches!(self, Self::JobRunning { .. })
    }

    pub(crate) fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn http(context: impl Into<String>, status: u16, body: String) -> Self {
        let kind = classify_body(&body).unwrap_or_else(|| ErrorKind::from_status(status));
        Self::Http {
            context: context.into(),
            status,
            body,
            kind,
        }
    }

    /// Collapses collected errors: none → `Ok`, one → itself, more → `Aggregate`.
    pub(crate) fn collect(mut errors: Vec<EdgeError>) -> crate::Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Aggregate(errors)),
        }
    }
}

fn classify_body(body: &str) -> Option<ErrorKind> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let code = value
        .get("code")
        .or_else(|| value.get("content").and_then(|content| content.get("code")))?
        .as_str()?;
    code.parse().ok()
}

fn error_chain_text(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text.to_ascii_lowercase()
}

fn join_errors(errors: &[EdgeError]) -> String {
    let parts: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} errors: {}", errors.len(), parts.join("; "))
}
