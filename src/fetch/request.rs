//! Request descriptions, canonical request signatures and buffered responses.

use bytes::Bytes;
use reqwest::Method;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

use super::FetchError;

const DEFAULT_MODE: &str = "cors";
const DEFAULT_CREDENTIALS: &str = "same-origin";
const DEFAULT_CACHE: &str = "default";
const DEFAULT_REDIRECT: &str = "follow";
const DEFAULT_REFERRER: &str = "about:client";

/// Everything that identifies an outgoing request.
///
/// Options left unset take the same effective value as their explicit
/// default, so `RequestSpec::get(url)` and `RequestSpec::get(url).mode("cors")`
/// describe the same request and produce the same [`RequestSignature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub mode: Option<String>,
    pub credentials: Option<String>,
    pub cache: Option<String>,
    pub redirect: Option<String>,
    pub referrer: Option<String>,
    pub integrity: Option<String>,
    /// Header names are stored lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl RequestSpec {
    /// A request with the given method and no options.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            mode: None,
            credentials: None,
            cache: None,
            redirect: None,
            referrer: None,
            integrity: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// A `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    #[must_use]
    pub fn cache_directive(mut self, cache: impl Into<String>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    #[must_use]
    pub fn redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    #[must_use]
    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    #[must_use]
    pub fn integrity(mut self, integrity: impl Into<String>) -> Self {
        self.integrity = Some(integrity.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Canonical signature of this request, `None` when it must not be cached.
    #[must_use]
    pub fn signature(&self) -> Option<RequestSignature> {
        RequestSignature::of(self)
    }
}

/// Canonical string identifying a cacheable request.
///
/// Built from the effective URL, method, mode, credentials, cache directive,
/// redirect policy, referrer, integrity and headers. Object keys and header
/// names are sorted, so two requests built in a different order still match.
/// The body never takes part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSignature(String);

impl RequestSignature {
    /// Signature of `request`; only `GET` requests have one.
    #[must_use]
    pub fn of(request: &RequestSpec) -> Option<Self> {
        if request.method != Method::GET {
            return None;
        }

        let mut init = json!({
            "method": request.method.as_str(),
            "mode": request.mode.as_deref().unwrap_or(DEFAULT_MODE),
            "credentials": request.credentials.as_deref().unwrap_or(DEFAULT_CREDENTIALS),
            "cache": request.cache.as_deref().unwrap_or(DEFAULT_CACHE),
            "redirect": request.redirect.as_deref().unwrap_or(DEFAULT_REDIRECT),
            "referrer": request.referrer.as_deref().unwrap_or(DEFAULT_REFERRER),
            "headers": request.headers,
        });
        if let Some(integrity) = request.integrity.as_deref().filter(|i| !i.is_empty()) {
            init["integrity"] = json!(integrity);
        }

        Some(Self(json!([format!("{} ", effective_url(&request.url)), init]).to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `url` as a server would see it: scheme and host lower-cased, dot segments
/// removed, empty path turned into `/`. Strings that don't parse are kept as is.
fn effective_url(url: &str) -> String {
    url::Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully buffered response.
///
/// Cloning is cheap (the body is reference counted) and every clone can be
/// consumed independently, which is what lets the request cache hand the same
/// network response to several callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// A `200 OK` response with a JSON body.
    pub fn json_ok(url: impl Into<String>, body: &serde_json::Value) -> Self {
        Self {
            url: url.into(),
            status: 200,
            headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            body: Bytes::from(body.to_string()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Turn a non-2xx response into [`FetchError::Status`].
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Decode {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_ignores_header_order_and_case() {
        let a = RequestSpec::get("http://x/users/1").header("X-Something", "10").header("accept", "a");
        let b = RequestSpec::get("http://x/users/1").header("Accept", "a").header("x-something", "10");
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_uses_effective_defaults() {
        let implicit = RequestSpec::get("http://x/users/1");
        let explicit = RequestSpec::get("http://x/users/1")
            .mode("cors")
            .credentials("same-origin")
            .cache_directive("default")
            .redirect("follow");
        assert_eq!(implicit.signature(), explicit.signature());
    }

    #[test]
    fn test_signature_differs_on_options() {
        let base = RequestSpec::get("http://x/users/1");
        assert_ne!(base.signature(), base.clone().cache_directive("reload").signature());
        assert_ne!(base.signature(), base.clone().header("x-a", "1").signature());
        assert_ne!(base.signature(), RequestSpec::get("http://x/users/2").signature());
    }

    #[test]
    fn test_signature_uses_normalized_url() {
        let canonical = RequestSpec::get("http://localhost:3000/stores/users/10");
        for spelling in [
            "HTTP://LOCALHOST:3000/stores/./users/10",
            "http://localhost:3000/stores/groups/../users/10",
        ] {
            assert_eq!(RequestSpec::get(spelling).signature(), canonical.signature(), "{spelling}");
        }
        assert_eq!(
            RequestSpec::get("http://localhost:3000").signature(),
            RequestSpec::get("http://localhost:3000/").signature()
        );
        // path case is significant
        assert_ne!(RequestSpec::get("http://x/Users/10").signature(), RequestSpec::get("http://x/users/10").signature());
    }

    #[test]
    fn test_signature_keeps_unparsable_url() {
        let signature = RequestSpec::get("users/10").signature().unwrap();
        assert!(signature.as_str().starts_with("[\"users/10 \""));
    }

    #[test]
    fn test_signature_excludes_body() {
        let a = RequestSpec::get("http://x/users/1").body("one");
        let b = RequestSpec::get("http://x/users/1").body("two");
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_non_get_has_no_signature() {
        assert!(RequestSpec::new(Method::POST, "http://x/users").signature().is_none());
        assert!(RequestSpec::new(Method::DELETE, "http://x/users/1").signature().is_none());
    }

    #[test]
    fn test_signature_starts_with_url() {
        let signature = RequestSpec::get("http://x/users/1").signature().unwrap();
        assert!(signature.as_str().starts_with("[\"http://x/users/1 \""));
    }

    #[test]
    fn test_response_status_and_json() {
        let ok = HttpResponse::json_ok("u", &json!({"id": 1}));
        assert_eq!(ok.json().unwrap(), json!({"id": 1}));

        let missing = HttpResponse {
            status: 404,
            ..ok.clone()
        };
        assert_eq!(
            missing.error_for_status(),
            Err(FetchError::Status {
                url: "u".to_string(),
                status: 404
            })
        );

        let garbage = HttpResponse {
            body: Bytes::from_static(b"not json"),
            ..ok
        };
        assert!(matches!(garbage.json(), Err(FetchError::Decode { .. })));
    }
}
