use std::fmt;
use std::time::Duration;

use crate::{EdgeError, Result};

pub const DEFAULT_PROTOCOL: &str = "http";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_CONTEXT_PATH: &str = "/ze";

/// Poll cadence and give-up point for one deferred action.
///
/// `attempts` counts the re-polls allowed after the first poll, so a budget of
/// `n` performs at most `n + 1` polls. Zero means the first "still running"
/// answer is final.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryBudget {
    /// Sleep between two polls.
    pub interval: Duration,
    /// Remaining re-polls.
    pub attempts: u32,
}

impl RetryBudget {
    pub const fn new(interval: Duration, attempts: u32) -> Self {
        Self { interval, attempts }
    }

    pub const fn from_secs(interval_secs: u64, attempts: u32) -> Self {
        Self::new(Duration::from_secs(interval_secs), attempts)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::from_secs(2, 150)
    }
}

/// Retry budgets per class of operation.
///
/// Cluster and node lifecycle jobs run for minutes on the backend and wait
/// longer than generic mutations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Generic mutations.
    pub default: RetryBudget,
    /// Cluster create, recreate and delete.
    pub cluster: RetryBudget,
    /// Node add and delete.
    pub node: RetryBudget,
}

impl RetryPolicy {
    /// Uses one budget for every operation class.
    pub const fn uniform(budget: RetryBudget) -> Self {
        Self {
            default: budget,
            cluster: budget,
            node: budget,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            default: RetryBudget::default(),
            cluster: RetryBudget::from_secs(10, 500),
            node: RetryBudget::from_secs(10, 300),
        }
    }
}

/// Endpoint, credential, timeout and retry configuration of an [`EdgeClient`].
///
/// [`EdgeClient`]: crate::EdgeClient
#[derive(Clone, Eq, PartialEq)]
pub struct ClientOptions {
    /// `http` or `https`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Path prefix of the API, e.g. `/ze`. Excluded from request signatures.
    pub context_path: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Accept invalid TLS certificates.
    pub insecure_skip_verify: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Wall-clock window in which GET requests stalled on response headers
    /// are re-issued.
    pub header_retry_window: Duration,
    /// Pause before re-issuing a stalled GET.
    pub header_retry_pause: Duration,
    /// Log request and response bodies.
    pub debug: bool,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("context_path", &self.context_path)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("header_retry_window", &self.header_retry_window)
            .field("header_retry_pause", &self.header_retry_pause)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientOptions {
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        context_path: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            context_path: context_path.into(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            insecure_skip_verify: false,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            header_retry_window: Duration::from_secs(5 * 60),
            header_retry_pause: Duration::from_secs(5),
            debug: false,
        }
    }

    /// Options for `http://<host>:80/ze`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self::new(DEFAULT_PROTOCOL, host, DEFAULT_PORT, DEFAULT_CONTEXT_PATH)
    }

    /// Builds options from environment variables.
    ///
    /// Reads:
    /// - `ZSTACK_HOST`, `ZSTACK_ACCESS_KEY`, `ZSTACK_SECRET_KEY` (required)
    /// - `ZSTACK_PORT`, `ZSTACK_PROTOCOL`, `ZSTACK_CONTEXT_PATH`,
    ///   `ZSTACK_INSECURE`, `ZSTACK_DEBUG` (optional)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            let value = lookup(name)
                .ok_or_else(|| EdgeError::Parameter(format!("missing {name} environment variable")))?;
            if value.trim().is_empty() {
                return Err(EdgeError::Parameter(format!("{name} is set but empty")));
            }
            Ok(value.trim().to_owned())
        };
        let flag = |name: &str| -> Result<bool> {
            match lookup(name).as_deref().map(str::trim) {
                None | Some("") => Ok(false),
                Some(value) => value
                    .parse::<bool>()
                    .map_err(|_| EdgeError::Parameter(format!("{name} must be true or false, got '{value}'"))),
            }
        };

        let mut options = Self::for_host(required("ZSTACK_HOST")?)
            .with_access_key(required("ZSTACK_ACCESS_KEY")?, required("ZSTACK_SECRET_KEY")?)
            .with_insecure_skip_verify(flag("ZSTACK_INSECURE")?)
            .with_debug(flag("ZSTACK_DEBUG")?);

        if let Some(port) = lookup("ZSTACK_PORT").filter(|value| !value.trim().is_empty()) {
            options.port = port
                .trim()
                .parse()
                .map_err(|_| EdgeError::Parameter(format!("ZSTACK_PORT is not a valid port: '{port}'")))?;
        }
        if let Some(protocol) = lookup("ZSTACK_PROTOCOL").filter(|value| !value.trim().is_empty()) {
            options.protocol = protocol.trim().to_owned();
        }
        if let Some(path) = lookup("ZSTACK_CONTEXT_PATH") {
            options.context_path = path.trim().to_owned();
        }
        Ok(options)
    }

    pub fn with_access_key(
        mut self,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.access_key_secret = access_key_secret.into();
        self
    }

    pub fn with_insecure_skip_verify(mut self, insecure_skip_verify: bool) -> Self {
        self.insecure_skip_verify = insecure_skip_verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_header_retry(mut self, window: Duration, pause: Duration) -> Self {
        self.header_retry_window = window;
        self.header_retry_pause = pause;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `{protocol}://{host}:{port}{context_path}`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.context_path
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{ClientOptions, RetryBudget, RetryPolicy};
    use crate::ErrorKind;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_backend_conventions() {
        let options = ClientOptions::for_host("10.0.0.1");
        assert_eq!(options.base_url(), "http://10.0.0.1:80/ze");
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.retry.default, RetryBudget::from_secs(2, 150));
        assert_eq!(options.retry.cluster, RetryBudget::from_secs(10, 500));
        assert_eq!(options.retry.node, RetryBudget::from_secs(10, 300));
    }

    #[test]
    fn debug_redacts_secret() {
        let options = ClientOptions::for_host("edge").with_access_key("ak", "very-secret");
        let debug = format!("{options:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn uniform_policy() {
        let budget = RetryBudget::new(Duration::from_millis(5), 3);
        let policy = RetryPolicy::uniform(budget);
        assert_eq!(policy.cluster, budget);
        assert_eq!(policy.node, budget);
    }

    #[test]
    fn from_env_reads_required_and_optional() {
        let options = ClientOptions::from_lookup(lookup(&[
            ("ZSTACK_HOST", "edge.local"),
            ("ZSTACK_ACCESS_KEY", "ak"),
            ("ZSTACK_SECRET_KEY", "sk"),
            ("ZSTACK_PORT", "8443"),
            ("ZSTACK_PROTOCOL", "https"),
            ("ZSTACK_INSECURE", "true"),
        ]))
        .expect("must build options");

        assert_eq!(options.base_url(), "https://edge.local:8443/ze");
        assert_eq!(options.access_key_id, "ak");
        assert_eq!(options.access_key_secret, "sk");
        assert!(options.insecure_skip_verify);
        assert!(!options.debug);
    }

    #[test]
    fn from_env_rejects_missing_or_blank() {
        let err = ClientOptions::from_lookup(lookup(&[("ZSTACK_HOST", "edge")]))
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Parameter);
        assert!(err.to_string().contains("ZSTACK_ACCESS_KEY"));

        let err = ClientOptions::from_lookup(lookup(&[
            ("ZSTACK_HOST", "  "),
            ("ZSTACK_ACCESS_KEY", "ak"),
            ("ZSTACK_SECRET_KEY", "sk"),
        ]))
        .expect_err("must fail");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn from_env_rejects_bad_port() {
        let err = ClientOptions::from_lookup(lookup(&[
            ("ZSTACK_HOST", "edge"),
            ("ZSTACK_ACCESS_KEY", "ak"),
            ("ZSTACK_SECRET_KEY", "sk"),
            ("ZSTACK_PORT", "http"),
        ]))
        .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Parameter);
    }
}
