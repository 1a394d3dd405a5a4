//! Request signing.
//!
//! Every call carries `Authorization: Zstack <accessKeyId>:<signature>` and a
//! `Date` header, where the signature is the base64 encoded HMAC-SHA1 of
//! `METHOD\nDATE\nURI` keyed by the access key secret. The URI is the request
//! path without the API context path.

use std::fmt;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderValue, AUTHORIZATION, DATE};
use reqwest::Method;
use sha1::Sha1;

use crate::{EdgeError, Result};

/// Scheme name used in the `Authorization` header.
pub const AUTH_SCHEME: &str = "Zstack";

/// RFC 1123 with numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 +0000`.
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Formats a timestamp the way the `Date` header expects it.
pub fn format_date(time: DateTime<Utc>) -> String {
    time.format(RFC1123Z).to_string()
}

/// Header values produced for one request.
#[derive(Clone, Debug)]
pub struct SignedHeaders {
    pub authorization: HeaderValue,
    pub date: HeaderValue,
}

/// Computes access-key signatures.
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    access_key_secret: String,
    context_path: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("context_path", &self.context_path)
            .finish()
    }
}

impl Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        context_path: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            context_path: context_path.into(),
        }
    }

    /// Strips the first occurrence of the context path from `path`.
    pub fn canonical_uri(&self, path: &str) -> String {
        if self.context_path.is_empty() {
            return path.to_owned();
        }
        path.replacen(&self.context_path, "", 1)
    }

    /// Base64 HMAC-SHA1 over `METHOD\nDATE\nURI`.
    pub fn signature(&self, method: &Method, uri: &str, date: &str) -> Result<String> {
        let mut mac = Hmac::<Sha1>::new_from_slice(self.access_key_secret.as_bytes())
            .map_err(|err| EdgeError::Crypto(format!("invalid signing key: {err}")))?;
        mac.update(format!("{}\n{}\n{}", method.as_str(), date, uri).as_bytes());
        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Signs a request to `path` issued at `now`.
    pub fn sign(&self, method: &Method, path: &str, now: DateTime<Utc>) -> Result<SignedHeaders> {
        let date = format_date(now);
        let signature = self.signature(method, &self.canonical_uri(path), &date)?;

        let mut authorization = HeaderValue::from_str(&format!(
            "{AUTH_SCHEME} {}:{signature}",
            self.access_key_id
        ))
        .map_err(|err| EdgeError::Parameter(format!("access key id is not a valid header value: {err}")))?;
        authorization.set_sensitive(true);

        let date = HeaderValue::from_str(&date)
            .map_err(|err| EdgeError::Decode(format!("invalid date header '{date}': {err}")))?;

        Ok(SignedHeaders {
            authorization,
            date,
        })
    }

    /// Attaches freshly computed auth headers to a request builder.
    pub(crate) fn apply(
        &self,
        builder: reqwest::RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let signed = self.sign(method, path, Utc::now())?;
        Ok(builder
            .header(AUTHORIZATION, signed.authorization)
            .header(DATE, signed.date))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use reqwest::Method;

    use super::{format_date, Signer};

    fn signer() -> Signer {
        Signer::new("ak-id", "sk-secret", "/ze")
    }

    #[test]
    fn date_is_rfc1123_with_numeric_zone() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(format_date(time), "Tue, 05 Mar 2024 07:08:09 +0000");
    }

    #[test]
    fn canonical_uri_strips_context_path_once() {
        let signer = signer();
        assert_eq!(
            signer.canonical_uri("/ze/open-api/v1/cluster"),
            "/open-api/v1/cluster"
        );
        assert_eq!(signer.canonical_uri("/ze/ze/x"), "/ze/x");
        assert_eq!(Signer::new("a", "b", "").canonical_uri("/x"), "/x");
    }

    #[test]
    fn signature_matches_known_vector() {
        let signature = signer()
            .signature(
                &Method::POST,
                "/open-api/v1/cluster",
                "Tue, 05 Mar 2024 07:08:09 +0000",
            )
            .unwrap();
        assert_eq!(signature, "yAO1/73KI7oMIvbJr4sJ6lS6dE4=");
    }

    #[test]
    fn signature_is_deterministic() {
        let signer = signer();
        let date = "Tue, 05 Mar 2024 07:08:09 +0000";
        let first = signer
            .signature(&Method::POST, "/open-api/v1/cluster", date)
            .unwrap();
        for _ in 0..16 {
            let again = signer
                .signature(&Method::POST, "/open-api/v1/cluster", date)
                .unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn single_character_changes_alter_signature() {
        let signer = signer();
        let method = Method::GET;
        let uri = "/open-api/v1/result/abc";
        let date = "Tue, 05 Mar 2024 07:08:09 +0000";
        let base = signer.signature(&method, uri, date).unwrap();

        let mut seen = std::collections::HashSet::new();
        seen.insert(base.clone());

        for (index, _) in uri.char_indices() {
            let mut changed = uri.to_owned();
            changed.replace_range(index..index + 1, "~");
            if changed == uri {
                continue;
            }
            let signature = signer.signature(&method, &changed, date).unwrap();
            assert!(seen.insert(signature), "collision for uri {changed}");
        }

        for (index, _) in date.char_indices() {
            let mut changed = date.to_owned();
            changed.replace_range(index..index + 1, "#");
            let signature = signer.signature(&method, uri, &changed).unwrap();
            assert!(seen.insert(signature), "collision for date {changed}");
        }

        for other in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let signature = signer.signature(&other, uri, date).unwrap();
            assert!(seen.insert(signature), "collision for method {other}");
        }
    }

    #[test]
    fn sign_builds_headers() {
        let signer = signer();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let headers = signer
            .sign(&Method::DELETE, "/ze/open-api/v1/cluster/7", now)
            .unwrap();

        let expected = signer
            .signature(
                &Method::DELETE,
                "/open-api/v1/cluster/7",
                "Tue, 05 Mar 2024 07:08:09 +0000",
            )
            .unwrap();
        assert!(headers.authorization.is_sensitive());
        assert_eq!(
            headers.authorization.to_str().unwrap(),
            format!("Zstack ak-id:{expected}")
        );
        assert_eq!(headers.date.to_str().unwrap(), "Tue, 05 Mar 2024 07:08:09 +0000");
    }
}
